//! Mutation events emitted by the cache manager
//!
//! Every mutating façade operation emits exactly one event describing what
//! changed, over a `tokio::sync::broadcast` channel. Observers subscribe and
//! detach freely; a lagged or absent observer never blocks a mutation.

use crate::types::{ResourceId, ResourceKind};

/// What a mutating cache operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A new entry was inserted and made active
    Opened {
        /// The opened resource
        id: ResourceId,
        /// Its kind
        kind: ResourceKind,
    },
    /// An existing entry was touched and (for web apps) made active
    Refreshed {
        /// The refreshed resource
        id: ResourceId,
    },
    /// An entry was removed from the live store
    Closed {
        /// The closed resource
        id: ResourceId,
    },
    /// The active pointer moved
    ActiveChanged {
        /// New active id, `None` when cleared
        id: Option<ResourceId>,
    },
    /// The live store was emptied (logout)
    Cleared,
    /// A web-app open was queued until the catalog is ready
    Deferred {
        /// The queued resource
        id: ResourceId,
    },
    /// The deferred queue was drained after the catalog became ready
    CatalogDrained {
        /// Ids opened from the queue
        opened: Vec<ResourceId>,
        /// Ids no longer present in the catalog
        missing: Vec<ResourceId>,
    },
    /// A record was removed from a recency list
    RecentRemoved {
        /// List the record was removed from
        kind: ResourceKind,
        /// The removed id
        id: ResourceId,
    },
    /// The live store reached the advisory threshold
    CapacityAdvisory {
        /// Live entry count at the time of the advisory
        count: usize,
    },
}
