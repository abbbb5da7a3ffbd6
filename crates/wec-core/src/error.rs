//! Error types for the embed cache
//!
//! Nothing here is fatal to the hosting process: every failure degrades to
//! "the requested resource did not open" plus a user-visible notification.

use crate::types::ResourceId;
use wec_ports::ResolveError;

/// Main cache error type
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Session URL could not be resolved
    #[error("session {id} could not be resolved: {source}")]
    ResolutionFailed {
        /// The session that failed to open
        id: ResourceId,
        /// Resolver failure
        #[source]
        source: ResolveError,
    },

    /// Requested web-app id is absent from the catalog
    #[error("web app not in catalog: {0}")]
    WebAppNotFound(ResourceId),
}

impl CacheError {
    /// Message suitable for the user-facing notification surface
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ResolutionFailed { id, .. } => {
                format!("Could not connect to session {id}")
            }
            Self::WebAppNotFound(id) => format!("Web app {id} is not available"),
        }
    }
}
