//! Core types for the embed cache
//!
//! Defines the fundamental types of the subsystem:
//! - Resource identity and kind
//! - Live cache entries
//! - Recency history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque resource identifier issued by the platform
///
/// Session ids and web-app ids share one id space from the cache's point of
/// view; the [`ResourceKind`] discriminant keeps them apart where it matters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Wrap a platform id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The two kinds of embeddable resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Interactive session stream, resolved to a URL per open
    Session,
    /// Third-party web app from the catalog
    WebApp,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::WebApp => write!(f, "web-app"),
        }
    }
}

/// One currently-live embedded resource
///
/// The kind is fixed at creation and never mutated; `workspace` is present
/// only for sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    /// Unique key within the live store
    pub id: ResourceId,
    /// Resource kind discriminant
    pub kind: ResourceKind,
    /// Resolved embed target
    pub url: String,
    /// Human-readable name
    pub display_name: String,
    /// Owning workspace, sessions only
    pub workspace: Option<String>,
    /// Last open or refresh time
    pub last_accessed: DateTime<Utc>,
}

impl CachedEntry {
    /// Entry for a live session stream
    #[must_use]
    pub fn session(
        id: impl Into<ResourceId>,
        workspace: impl Into<String>,
        display_name: impl Into<String>,
        url: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ResourceKind::Session,
            url: url.into(),
            display_name: display_name.into(),
            workspace: Some(workspace.into()),
            last_accessed: now,
        }
    }

    /// Entry for a catalog web app
    #[must_use]
    pub fn web_app(
        id: impl Into<ResourceId>,
        display_name: impl Into<String>,
        url: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ResourceKind::WebApp,
            url: url.into(),
            display_name: display_name.into(),
            workspace: None,
            last_accessed: now,
        }
    }
}

/// One historical open event in the recency ledger
///
/// Persisted across restarts; deduplicated by id within each kind's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyRecord {
    /// Resource id
    pub id: ResourceId,
    /// Name as of the most recent open
    pub display_name: String,
    /// Owning workspace, session records only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Most recent open time
    pub last_accessed: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_display_and_from() {
        let id = ResourceId::from("s-42");
        assert_eq!(id.to_string(), "s-42");
        assert_eq!(id.as_str(), "s-42");
        assert_eq!(ResourceId::new(String::from("s-42")), id);
    }

    #[test]
    fn session_entry_carries_workspace() {
        let now = Utc::now();
        let entry = CachedEntry::session("s1", "w1", "Alpha", "https://embed/s1", now);
        assert_eq!(entry.kind, ResourceKind::Session);
        assert_eq!(entry.workspace.as_deref(), Some("w1"));
    }

    #[test]
    fn web_app_entry_has_no_workspace() {
        let entry = CachedEntry::web_app("a1", "Notes", "https://apps/notes", Utc::now());
        assert_eq!(entry.kind, ResourceKind::WebApp);
        assert!(entry.workspace.is_none());
    }

    #[test]
    fn recency_record_serde_round_trip() {
        let record = RecencyRecord {
            id: "s1".into(),
            display_name: "Alpha".to_string(),
            workspace: Some("w1".to_string()),
            last_accessed: Utc::now(),
        };
        let raw = serde_json::to_string(&record).unwrap();
        let back: RecencyRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn recency_record_workspace_absent_in_json_for_web_apps() {
        let record = RecencyRecord {
            id: "a1".into(),
            display_name: "Notes".to_string(),
            workspace: None,
            last_accessed: Utc::now(),
        };
        let raw = serde_json::to_string(&record).unwrap();
        assert!(!raw.contains("workspace"));
    }
}
