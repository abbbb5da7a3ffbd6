//! Cache configuration

use serde::{Deserialize, Serialize};

/// Embed cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Live entry count at which the capacity advisory fires
    pub advisory_threshold: usize,
    /// Maximum records kept per recency list
    pub recency_cap: usize,
    /// Storage key for the session recency list
    pub sessions_storage_key: String,
    /// Storage key for the web-app recency list
    pub web_apps_storage_key: String,
}

impl CacheConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With advisory threshold
    #[inline]
    #[must_use]
    pub fn with_advisory_threshold(mut self, threshold: usize) -> Self {
        self.advisory_threshold = threshold;
        self
    }

    /// With recency cap
    #[inline]
    #[must_use]
    pub fn with_recency_cap(mut self, cap: usize) -> Self {
        self.recency_cap = cap;
        self
    }

    /// With a storage key prefix, replacing both default keys
    #[inline]
    #[must_use]
    pub fn with_storage_prefix(mut self, prefix: &str) -> Self {
        self.sessions_storage_key = format!("{prefix}.recent.sessions");
        self.web_apps_storage_key = format!("{prefix}.recent.web-apps");
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// A description of the first invalid field. Zero caps would make every
    /// open a silent drop, so they are rejected up front.
    pub fn validate(&self) -> Result<(), String> {
        if self.advisory_threshold == 0 {
            return Err("advisory_threshold must be at least 1".to_string());
        }
        if self.recency_cap == 0 {
            return Err("recency_cap must be at least 1".to_string());
        }
        if self.sessions_storage_key == self.web_apps_storage_key {
            return Err("storage keys must differ between kinds".to_string());
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            advisory_threshold: 10,
            recency_cap: 10,
            sessions_storage_key: "wec.recent.sessions".to_string(),
            web_apps_storage_key: "wec.recent.web-apps".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CacheConfig::new().validate().is_ok());
    }

    #[test]
    fn builders_chain() {
        let config = CacheConfig::new()
            .with_advisory_threshold(3)
            .with_recency_cap(5)
            .with_storage_prefix("tre");
        assert_eq!(config.advisory_threshold, 3);
        assert_eq!(config.recency_cap, 5);
        assert_eq!(config.sessions_storage_key, "tre.recent.sessions");
        assert_eq!(config.web_apps_storage_key, "tre.recent.web-apps");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_caps_are_rejected() {
        assert!(CacheConfig::new().with_advisory_threshold(0).validate().is_err());
        assert!(CacheConfig::new().with_recency_cap(0).validate().is_err());
    }

    #[test]
    fn colliding_storage_keys_are_rejected() {
        let mut config = CacheConfig::new();
        config.web_apps_storage_key = config.sessions_storage_key.clone();
        assert!(config.validate().is_err());
    }
}
