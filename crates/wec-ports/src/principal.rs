//! Principal login/logout signal
//!
//! The authentication provider owns the principal lifecycle; the cache only
//! observes transitions. Carried over a `tokio::sync::watch` channel by the
//! host, so the type itself stays runtime-agnostic.

/// Whether a principal is currently logged in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrincipalState {
    /// No authenticated principal
    #[default]
    LoggedOut,
    /// An authenticated principal is present
    LoggedIn,
}

impl PrincipalState {
    /// True when a principal is present
    #[inline]
    #[must_use]
    pub fn is_logged_in(self) -> bool {
        matches!(self, Self::LoggedIn)
    }
}
