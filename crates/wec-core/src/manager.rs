//! Cache manager façade
//!
//! Composes the live store, recency ledger, deferred queue, and capacity
//! guard behind one explicitly constructed, dependency-injected instance.
//! Created once per running process; logout clears the live store through it.
//!
//! All interior state sits behind one mutex. The only suspension point is the
//! session-URL resolution, which is awaited with the lock released; an
//! in-flight set serializes same-id opens and a generation counter discards
//! resolutions that finish after a logout.

use crate::capacity::CapacityGuard;
use crate::config::CacheConfig;
use crate::deferred::{CatalogState, DeferredActivationQueue};
use crate::error::CacheError;
use crate::events::CacheEvent;
use crate::ledger::RecencyLedger;
use crate::store::LiveCacheStore;
use crate::types::{CachedEntry, RecencyRecord, ResourceId, ResourceKind};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use wec_ports::{
    CatalogSource, KeyValueStore, NotificationSink, PrincipalState, SessionUrlResolver, Severity,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Snapshot of cache occupancy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Currently-live entries
    pub live_count: usize,
    /// Currently active id
    pub active: Option<ResourceId>,
    /// Records in the session recency list
    pub recent_sessions: usize,
    /// Records in the web-app recency list
    pub recent_web_apps: usize,
    /// Web-app opens waiting for the catalog
    pub deferred: usize,
}

struct Inner {
    store: LiveCacheStore,
    ledger: RecencyLedger,
    deferred: DeferredActivationQueue,
    in_flight: HashSet<ResourceId>,
    generation: u64,
}

/// The embed cache façade
///
/// Methods take `&self`; share the manager with `Arc` and call from any task.
pub struct CacheManager {
    inner: Mutex<Inner>,
    guard: CapacityGuard,
    resolver: Arc<dyn SessionUrlResolver>,
    catalog: Arc<dyn CatalogSource>,
    notifier: Arc<dyn NotificationSink>,
    events: broadcast::Sender<CacheEvent>,
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager").finish_non_exhaustive()
    }
}

impl CacheManager {
    /// Create a manager with injected collaborators
    ///
    /// Loads the recency ledger from `kv` immediately; a corrupted store
    /// loads as empty history, never an error.
    #[must_use]
    pub fn new(
        config: CacheConfig,
        resolver: Arc<dyn SessionUrlResolver>,
        catalog: Arc<dyn CatalogSource>,
        kv: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let ledger = RecencyLedger::load(
            kv,
            config.recency_cap,
            config.sessions_storage_key.clone(),
            config.web_apps_storage_key.clone(),
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                store: LiveCacheStore::new(),
                ledger,
                deferred: DeferredActivationQueue::new(),
                in_flight: HashSet::new(),
                generation: 0,
            }),
            guard: CapacityGuard::new(config.advisory_threshold),
            resolver,
            catalog,
            notifier,
            events,
        }
    }

    /// Subscribe to mutation events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Open a session stream, resolving its URL on first open
    ///
    /// Cache hit: refreshes the live entry's timestamp and the recency
    /// record, no network call. Miss: resolves the URL, then inserts the
    /// entry, makes it active, records recency, and runs the capacity check.
    /// A second open for the same id while its resolution is in flight is an
    /// idempotent no-op.
    ///
    /// # Errors
    /// [`CacheError::ResolutionFailed`] when the URL cannot be resolved; the
    /// failure is surfaced to the notification sink and no state changes.
    pub async fn open_session(
        &self,
        id: impl Into<ResourceId>,
        workspace: &str,
        display_name: Option<&str>,
    ) -> Result<(), CacheError> {
        let id = id.into();
        let now = Utc::now();
        tracing::debug!(id = %id, workspace, "open session");

        let generation = {
            let mut inner = self.inner.lock();
            if inner.store.touch(&id, now) {
                // Callers may omit the name on a re-open; keep the live one
                let name = display_name
                    .map(ToString::to_string)
                    .or_else(|| inner.store.get(&id).map(|e| e.display_name.clone()))
                    .unwrap_or_else(|| id.as_str().to_string());
                inner
                    .ledger
                    .record_open(ResourceKind::Session, &id, &name, Some(workspace), now);
                drop(inner);
                self.emit(CacheEvent::Refreshed { id });
                return Ok(());
            }
            if !inner.in_flight.insert(id.clone()) {
                tracing::debug!(id = %id, "open already in flight, ignoring duplicate");
                return Ok(());
            }
            inner.generation
        };

        // The one suspension point: no locks held across it
        let resolved = self.resolver.resolve(id.as_str()).await;

        let mut inner = self.inner.lock();
        let stale = inner.generation != generation;
        if !stale {
            inner.in_flight.remove(&id);
        }
        if stale {
            tracing::debug!(id = %id, "discarding resolution from before logout");
            return Ok(());
        }

        let url = match resolved {
            Ok(url) => url,
            Err(source) => {
                drop(inner);
                let err = CacheError::ResolutionFailed { id, source };
                tracing::warn!(error = %err, "session open failed");
                self.notifier.notify(&err.user_message(), Severity::Error);
                return Err(err);
            }
        };

        let name = display_name.unwrap_or_else(|| id.as_str()).to_string();
        inner
            .store
            .insert_active(CachedEntry::session(id.clone(), workspace, name.clone(), url, now));
        inner
            .ledger
            .record_open(ResourceKind::Session, &id, &name, Some(workspace), now);
        let advisory = self.guard.check(inner.store.len());
        drop(inner);

        self.emit(CacheEvent::Opened {
            id,
            kind: ResourceKind::Session,
        });
        self.advise(advisory);
        Ok(())
    }

    /// Open a web app from the catalog
    ///
    /// While the catalog is loading the request is queued (idempotently) and
    /// replayed by [`catalog_ready`](Self::catalog_ready). With a ready
    /// catalog: a cache hit refreshes and activates the live entry; a miss
    /// looks the id up and inserts it.
    ///
    /// # Errors
    /// [`CacheError::WebAppNotFound`] when the catalog is ready but does not
    /// contain the id; surfaced to the notification sink, no state changes.
    pub fn open_web_app(&self, id: impl Into<ResourceId>) -> Result<(), CacheError> {
        let id = id.into();
        let now = Utc::now();
        tracing::debug!(id = %id, "open web app");

        let mut inner = self.inner.lock();
        if !self.catalog.is_ready() && inner.deferred.state() == CatalogState::CatalogNotReady {
            let newly_queued = inner.deferred.enqueue(id.clone());
            drop(inner);
            if newly_queued {
                tracing::info!(id = %id, "catalog not ready, deferring web app open");
                self.emit(CacheEvent::Deferred { id });
            }
            return Ok(());
        }

        if inner.store.touch(&id, now) {
            inner.store.set_active(Some(id.clone()));
            let name = inner
                .store
                .get(&id)
                .map(|entry| entry.display_name.clone())
                .unwrap_or_default();
            inner
                .ledger
                .record_open(ResourceKind::WebApp, &id, &name, None, now);
            drop(inner);
            self.emit(CacheEvent::Refreshed { id });
            return Ok(());
        }

        let Some(app) = self.catalog.get(id.as_str()) else {
            drop(inner);
            let err = CacheError::WebAppNotFound(id);
            tracing::warn!(error = %err, "web app open failed");
            self.notifier.notify(&err.user_message(), Severity::Error);
            return Err(err);
        };

        inner
            .store
            .insert_active(CachedEntry::web_app(id.clone(), app.display_name.clone(), app.url, now));
        inner
            .ledger
            .record_open(ResourceKind::WebApp, &id, &app.display_name, None, now);
        let advisory = self.guard.check(inner.store.len());
        drop(inner);

        self.emit(CacheEvent::Opened {
            id,
            kind: ResourceKind::WebApp,
        });
        self.advise(advisory);
        Ok(())
    }

    /// Replay deferred web-app opens now that the catalog has loaded
    ///
    /// Drains the queue exactly once, in enqueue order: ids found in the
    /// catalog open as if requested normally (recency and capacity checks
    /// included); ids that are not found surface a notification each. Calling
    /// this again later is a no-op.
    pub fn catalog_ready(&self) {
        let mut inner = self.inner.lock();
        let pending = inner.deferred.take_for_drain();
        if pending.is_empty() {
            return;
        }
        tracing::info!(count = pending.len(), "catalog ready, draining deferred opens");

        let now = Utc::now();
        let mut opened = Vec::new();
        let mut missing = Vec::new();
        let mut advisories = Vec::new();
        for id in pending {
            let Some(app) = self.catalog.get(id.as_str()) else {
                missing.push(id);
                continue;
            };
            if inner.store.touch(&id, now) {
                inner.store.set_active(Some(id.clone()));
            } else {
                inner.store.insert_active(CachedEntry::web_app(
                    id.clone(),
                    app.display_name.clone(),
                    app.url,
                    now,
                ));
                advisories.extend(self.guard.check(inner.store.len()));
            }
            inner
                .ledger
                .record_open(ResourceKind::WebApp, &id, &app.display_name, None, now);
            opened.push(id);
        }
        drop(inner);

        for id in &missing {
            let err = CacheError::WebAppNotFound(id.clone());
            self.notifier.notify(&err.user_message(), Severity::Error);
        }
        for advisory in advisories {
            self.advise(Some(advisory));
        }
        self.emit(CacheEvent::CatalogDrained { opened, missing });
    }

    /// Close a live entry; unknown ids are a no-op
    ///
    /// When the closed entry was active, the active pointer clears in the
    /// same operation. Recency history is untouched.
    pub fn close(&self, id: impl Into<ResourceId>) {
        let id = id.into();
        let mut inner = self.inner.lock();
        inner.deferred.dequeue(&id);
        let removed = inner.store.remove(&id);
        drop(inner);
        if removed.is_some() {
            tracing::debug!(id = %id, "closed embed");
            self.emit(CacheEvent::Closed { id });
        }
    }

    /// Set or clear the active pointer
    ///
    /// Pointer-only write; no timestamps move. Callers pass ids they know to
    /// be live; `None` clears the pointer.
    pub fn set_active(&self, id: Option<ResourceId>) {
        self.inner.lock().store.set_active(id.clone());
        self.emit(CacheEvent::ActiveChanged { id });
    }

    /// Empty the live store (logout)
    ///
    /// Recency history is deliberately untouched. Session resolutions still
    /// in flight when this runs are discarded when they complete.
    pub fn clear_all(&self) {
        let mut inner = self.inner.lock();
        inner.store.clear();
        inner.in_flight.clear();
        inner.generation += 1;
        drop(inner);
        tracing::info!("live cache cleared");
        self.emit(CacheEvent::Cleared);
    }

    /// Remove a record from a recency list; unknown ids are a no-op
    pub fn remove_from_recent(&self, kind: ResourceKind, id: impl Into<ResourceId>) {
        let id = id.into();
        self.inner.lock().ledger.remove(kind, &id);
        self.emit(CacheEvent::RecentRemoved { kind, id });
    }

    /// Recency records for `kind`, in insertion order
    #[must_use]
    pub fn recent(&self, kind: ResourceKind) -> Vec<RecencyRecord> {
        self.inner.lock().ledger.list(kind).to_vec()
    }

    /// Live entries in insertion order
    #[must_use]
    pub fn live_entries(&self) -> Vec<CachedEntry> {
        self.inner.lock().store.entries().cloned().collect()
    }

    /// Number of live entries
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.lock().store.len()
    }

    /// Currently active id
    #[must_use]
    pub fn active_id(&self) -> Option<ResourceId> {
        self.inner.lock().store.active_id().cloned()
    }

    /// Occupancy snapshot
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            live_count: inner.store.len(),
            active: inner.store.active_id().cloned(),
            recent_sessions: inner.ledger.list(ResourceKind::Session).len(),
            recent_web_apps: inner.ledger.list(ResourceKind::WebApp).len(),
            deferred: inner.deferred.len(),
        }
    }

    /// Clear the live store whenever the principal logs out
    ///
    /// Spawns a watcher task that invokes [`clear_all`](Self::clear_all) on
    /// each `LoggedIn -> LoggedOut` transition. The task ends when the sender
    /// side of `signal` drops.
    pub fn bind_principal(
        self: &Arc<Self>,
        mut signal: watch::Receiver<PrincipalState>,
    ) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut previous = *signal.borrow();
            while signal.changed().await.is_ok() {
                let current = *signal.borrow_and_update();
                if previous.is_logged_in() && !current.is_logged_in() {
                    tracing::info!("principal logged out");
                    manager.clear_all();
                }
                previous = current;
            }
            tracing::debug!("principal signal closed, watcher ending");
        })
    }

    // Mutation events are fire-and-forget; no receivers is fine
    fn emit(&self, event: CacheEvent) {
        let _ = self.events.send(event);
    }

    fn advise(&self, advisory: Option<crate::capacity::CapacityAdvisory>) {
        if let Some(advisory) = advisory {
            tracing::info!(count = advisory.count, "capacity advisory");
            self.notifier
                .notify(&advisory.user_message(), Severity::Info);
            self.emit(CacheEvent::CapacityAdvisory {
                count: advisory.count,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use wec_ports::{MemoryStore, ResolveError, WebAppDescriptor};
    use wec_test_utils::{RecordingSink, ScriptedResolver, TestCatalog};

    mock! {
        Resolver {}

        #[async_trait::async_trait]
        impl SessionUrlResolver for Resolver {
            async fn resolve(&self, session_id: &str) -> Result<String, ResolveError>;
        }
    }

    fn manager_with(
        resolver: Arc<dyn SessionUrlResolver>,
        catalog: Arc<TestCatalog>,
    ) -> (Arc<CacheManager>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let manager = Arc::new(CacheManager::new(
            CacheConfig::new(),
            resolver,
            catalog,
            Arc::new(MemoryStore::new()),
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
        ));
        (manager, sink)
    }

    fn ready_catalog() -> Arc<TestCatalog> {
        let catalog = TestCatalog::new(vec![WebAppDescriptor::new(
            "notes",
            "https://apps/notes",
            "Notes",
        )]);
        catalog.set_ready(true);
        Arc::new(catalog)
    }

    #[tokio::test]
    async fn session_miss_resolves_exactly_once() {
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .times(1)
            .returning(|id| Ok(format!("https://embed/{id}")));
        let (manager, _) = manager_with(Arc::new(resolver), ready_catalog());

        manager.open_session("s1", "w1", Some("Alpha")).await.unwrap();
        // Hit path must not resolve again
        manager.open_session("s1", "w1", Some("Alpha")).await.unwrap();

        assert_eq!(manager.live_count(), 1);
        assert_eq!(manager.active_id(), Some("s1".into()));
    }

    #[tokio::test]
    async fn failed_resolution_notifies_and_leaves_state_unchanged() {
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Err(ResolveError::Network("timeout".to_string())));
        let (manager, sink) = manager_with(Arc::new(resolver), ready_catalog());

        let result = manager.open_session("s1", "w1", None).await;

        assert!(matches!(result, Err(CacheError::ResolutionFailed { .. })));
        assert_eq!(manager.live_count(), 0);
        assert!(manager.recent(ResourceKind::Session).is_empty());
        assert_eq!(sink.messages_at(Severity::Error).len(), 1);
    }

    #[tokio::test]
    async fn session_hit_does_not_steal_active_pointer() {
        let resolver = Arc::new(ScriptedResolver::ok());
        let (manager, _) = manager_with(resolver, ready_catalog());

        manager.open_session("s1", "w1", None).await.unwrap();
        manager.open_session("s2", "w1", None).await.unwrap();
        manager.open_session("s1", "w1", None).await.unwrap();

        // Refresh-only on hit: s2 stays active
        assert_eq!(manager.active_id(), Some("s2".into()));
    }

    #[tokio::test]
    async fn web_app_hit_reactivates() {
        let resolver = Arc::new(ScriptedResolver::ok());
        let catalog = ready_catalog();
        let (manager, _) = manager_with(resolver, catalog);

        manager.open_web_app("notes").unwrap();
        manager.open_session("s1", "w1", None).await.unwrap();
        assert_eq!(manager.active_id(), Some("s1".into()));

        manager.open_web_app("notes").unwrap();
        assert_eq!(manager.active_id(), Some("notes".into()));
        assert_eq!(manager.live_count(), 2);
    }

    #[tokio::test]
    async fn unknown_web_app_surfaces_not_found() {
        let resolver = Arc::new(ScriptedResolver::ok());
        let (manager, sink) = manager_with(resolver, ready_catalog());

        let result = manager.open_web_app("ghost");

        assert!(matches!(result, Err(CacheError::WebAppNotFound(_))));
        assert_eq!(manager.live_count(), 0);
        assert_eq!(sink.messages_at(Severity::Error).len(), 1);
    }

    #[tokio::test]
    async fn logout_discards_in_flight_resolution() {
        let resolver = Arc::new(ScriptedResolver::ok().with_gate());
        let catalog = ready_catalog();
        let (manager, _) = manager_with(Arc::clone(&resolver) as _, catalog);

        let opening = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.open_session("s1", "w1", None).await })
        };
        resolver.wait_for_call().await;

        manager.clear_all();
        resolver.release();
        opening.await.unwrap().unwrap();

        // Resolution completed after logout: result discarded
        assert_eq!(manager.live_count(), 0);
        assert_eq!(manager.active_id(), None);
    }

    #[tokio::test]
    async fn concurrent_same_id_opens_insert_once() {
        let resolver = Arc::new(ScriptedResolver::ok().with_gate());
        let (manager, _) = manager_with(Arc::clone(&resolver) as _, ready_catalog());

        let first = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.open_session("s1", "w1", None).await })
        };
        resolver.wait_for_call().await;

        // Second open while the first is awaiting resolution
        manager.open_session("s1", "w1", None).await.unwrap();
        assert_eq!(resolver.calls(), 1);

        resolver.release();
        first.await.unwrap().unwrap();
        assert_eq!(manager.live_count(), 1);
    }

    #[tokio::test]
    async fn capacity_advisory_fires_on_insert_not_refresh() {
        let resolver = Arc::new(ScriptedResolver::ok());
        let sink = Arc::new(RecordingSink::new());
        let manager = CacheManager::new(
            CacheConfig::new().with_advisory_threshold(2),
            resolver,
            ready_catalog(),
            Arc::new(MemoryStore::new()),
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
        );

        manager.open_session("s1", "w1", None).await.unwrap();
        assert_eq!(sink.messages_at(Severity::Info).len(), 0);
        manager.open_session("s2", "w1", None).await.unwrap();
        assert_eq!(sink.messages_at(Severity::Info).len(), 1);
        manager.open_session("s3", "w1", None).await.unwrap();
        assert_eq!(sink.messages_at(Severity::Info).len(), 2);

        // Cache hit at capacity stays silent
        manager.open_session("s1", "w1", None).await.unwrap();
        assert_eq!(sink.messages_at(Severity::Info).len(), 2);
    }

    #[tokio::test]
    async fn events_mirror_mutations() {
        let resolver = Arc::new(ScriptedResolver::ok());
        let (manager, _) = manager_with(resolver, ready_catalog());
        let mut events = manager.subscribe();

        manager.open_session("s1", "w1", None).await.unwrap();
        manager.close("s1");
        manager.clear_all();

        assert_eq!(
            events.recv().await.unwrap(),
            CacheEvent::Opened {
                id: "s1".into(),
                kind: ResourceKind::Session
            }
        );
        assert_eq!(events.recv().await.unwrap(), CacheEvent::Closed { id: "s1".into() });
        assert_eq!(events.recv().await.unwrap(), CacheEvent::Cleared);
    }

    #[tokio::test]
    async fn bind_principal_clears_on_logout_transition() {
        let resolver = Arc::new(ScriptedResolver::ok());
        let (manager, _) = manager_with(resolver, ready_catalog());
        let (tx, rx) = watch::channel(PrincipalState::LoggedIn);
        let watcher = manager.bind_principal(rx);

        manager.open_session("s1", "w1", None).await.unwrap();
        let recent_before = manager.recent(ResourceKind::Session);

        tx.send(PrincipalState::LoggedOut).unwrap();
        drop(tx);
        watcher.await.unwrap();

        assert_eq!(manager.live_count(), 0);
        assert_eq!(manager.active_id(), None);
        // Ledger untouched by logout
        assert_eq!(manager.recent(ResourceKind::Session), recent_before);
    }
}
