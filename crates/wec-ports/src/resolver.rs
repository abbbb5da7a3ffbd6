//! Session URL resolution seam
//!
//! Resolving a session id to a live stream URL is a network round-trip owned
//! by the platform's REST layer. The cache only sees this trait.

use async_trait::async_trait;

/// Errors from session URL resolution
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// Network-level failure
    #[error("network failure: {0}")]
    Network(String),

    /// The principal is not allowed to connect to this session
    #[error("access denied: {0}")]
    Denied(String),

    /// The session id is unknown to the platform
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// Resolves a session id to a live, embeddable stream URL
///
/// The only suspension point in the subsystem: callers await the resolution
/// before any shared state is mutated.
#[async_trait]
pub trait SessionUrlResolver: Send + Sync {
    /// Resolve `session_id` to an embed URL
    ///
    /// # Errors
    /// Any [`ResolveError`]; the caller surfaces it and inserts nothing.
    async fn resolve(&self, session_id: &str) -> Result<String, ResolveError>;
}
