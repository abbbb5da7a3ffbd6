//! User-facing notification seam
//!
//! Fire-and-forget: the cache reports, the host renders (toast, status line,
//! whatever). The cache never blocks on, or observes, delivery.

/// How prominently the host should surface a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational, e.g. capacity advisory
    Info,
    /// Something was skipped or degraded
    Warning,
    /// A requested resource did not open
    Error,
}

/// Fire-and-forget notification sink
pub trait NotificationSink: Send + Sync {
    /// Surface `message` to the user at the given severity
    fn notify(&self, message: &str, severity: Severity);
}

/// Sink that writes notifications to the tracing log
///
/// Useful for headless hosts and as a default when no UI surface is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(target: "wec::notify", "{message}"),
            Severity::Warning => tracing::warn!(target: "wec::notify", "{message}"),
            Severity::Error => tracing::error!(target: "wec::notify", "{message}"),
        }
    }
}
