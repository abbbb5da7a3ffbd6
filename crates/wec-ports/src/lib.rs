//! WEC Ports - External collaborator interfaces
//!
//! The cache subsystem never talks to the platform directly; it goes through
//! the seams defined here:
//! - Session URL resolution (async network call)
//! - Web-app catalog source (loaded elsewhere, consulted here)
//! - Durable local key-value storage
//! - Fire-and-forget notification sink
//! - Principal login/logout signal
//!
//! In-process implementations live next to each trait where they are generally
//! useful (`MemoryStore`, `JsonFileStore`, `TracingSink`); richer test doubles
//! live in `wec-test-utils`.

#![warn(unreachable_pub)]

pub mod catalog;
pub mod kv;
pub mod notify;
pub mod principal;
pub mod resolver;

// Re-exports for convenience
pub use catalog::{CatalogSource, WebAppDescriptor};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
pub use notify::{NotificationSink, Severity, TracingSink};
pub use principal::PrincipalState;
pub use resolver::{ResolveError, SessionUrlResolver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
