//! WEC Core - Embed cache manager
//!
//! Keeps a bounded set of live, embeddable remote views (session streams and
//! catalog web apps) alive across navigation:
//! - Live store with a single active pointer
//! - Persisted, capped recency history that survives restarts and logout
//! - Deferred activation for opens that beat the catalog load
//! - Advisory capacity signal, never evicting
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wec_core::{CacheConfig, CacheManager};
//! use wec_ports::{JsonFileStore, TracingSink};
//!
//! # async fn example(resolver: Arc<dyn wec_ports::SessionUrlResolver>,
//! #                  catalog: Arc<dyn wec_ports::CatalogSource>) {
//! let kv = Arc::new(JsonFileStore::open("~/.local/state/wec.json").unwrap());
//! let manager = Arc::new(CacheManager::new(
//!     CacheConfig::new(),
//!     resolver,
//!     catalog,
//!     kv,
//!     Arc::new(TracingSink),
//! ));
//!
//! manager.open_session("s1", "w1", Some("Analysis VM")).await.unwrap();
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod capacity;
pub mod config;
pub mod deferred;
pub mod error;
pub mod events;
pub mod ledger;
pub mod manager;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use capacity::{CapacityAdvisory, CapacityGuard};
pub use config::CacheConfig;
pub use deferred::{CatalogState, DeferredActivationQueue};
pub use error::CacheError;
pub use events::CacheEvent;
pub use ledger::RecencyLedger;
pub use manager::{CacheManager, CacheStats};
pub use store::LiveCacheStore;
pub use types::{CachedEntry, RecencyRecord, ResourceId, ResourceKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the embed cache
    pub use crate::{
        CacheConfig, CacheError, CacheEvent, CacheManager, CacheStats, CachedEntry, RecencyRecord,
        ResourceId, ResourceKind,
    };
    pub use wec_ports::{
        CatalogSource, KeyValueStore, NotificationSink, PrincipalState, SessionUrlResolver,
        Severity, WebAppDescriptor,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
