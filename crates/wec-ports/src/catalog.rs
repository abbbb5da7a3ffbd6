//! Web-app catalog seam
//!
//! The catalog of embeddable web apps is loaded asynchronously by the platform
//! from its durable configuration store. The cache never owns catalog
//! contents; it consults them through this trait and treats readiness as
//! monotonic (once ready, never not-ready again).

use serde::{Deserialize, Serialize};

/// One catalog row describing an embeddable web app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppDescriptor {
    /// Stable catalog id
    pub id: String,
    /// Embed target URL
    pub url: String,
    /// Human-readable name
    pub display_name: String,
}

impl WebAppDescriptor {
    /// Create a descriptor
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            display_name: display_name.into(),
        }
    }
}

/// Read access to the web-app catalog
pub trait CatalogSource: Send + Sync {
    /// Whether the catalog has finished loading
    fn is_ready(&self) -> bool;

    /// All catalog rows, in catalog order
    fn list(&self) -> Vec<WebAppDescriptor>;

    /// Look up a single row by id
    fn get(&self, id: &str) -> Option<WebAppDescriptor> {
        self.list().into_iter().find(|app| app.id == id)
    }
}
