//! Live cache store
//!
//! The authoritative, exclusively-owned mutable store of currently-live
//! embedded resources, plus the "active" pointer identifying the single
//! foreground resource. Owned by the manager; nothing else mutates it.

use crate::types::{CachedEntry, ResourceId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Live entries keyed by id, in insertion order
///
/// Invariants:
/// - at most one entry per id (keyed map)
/// - the active pointer, when `Some`, names a present id; `remove` clears it
///   in the same call, so a dangling pointer is never observable
#[derive(Debug, Default)]
pub struct LiveCacheStore {
    entries: IndexMap<ResourceId, CachedEntry>,
    active: Option<ResourceId>,
}

impl LiveCacheStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh `last_accessed` on an existing entry
    ///
    /// Returns whether the entry was present. Never inserts.
    pub fn touch(&mut self, id: &ResourceId, now: DateTime<Utc>) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.last_accessed = now;
                true
            }
            None => false,
        }
    }

    /// Insert a new entry and make it active
    ///
    /// Callers check for an existing entry first (`touch`); if one slips
    /// through anyway it is replaced, keeping the one-entry-per-id invariant.
    pub fn insert_active(&mut self, entry: CachedEntry) {
        let id = entry.id.clone();
        debug_assert!(
            !self.entries.contains_key(&id),
            "insert_active over a live entry"
        );
        self.entries.insert(id.clone(), entry);
        self.active = Some(id);
    }

    /// Remove the entry for `id`; unknown ids are a no-op
    ///
    /// Clears the active pointer in the same call when the removed entry was
    /// the active one.
    pub fn remove(&mut self, id: &ResourceId) -> Option<CachedEntry> {
        let removed = self.entries.shift_remove(id);
        if removed.is_some() && self.active.as_ref() == Some(id) {
            self.active = None;
        }
        removed
    }

    /// Set or clear the active pointer
    ///
    /// Pointer-only write: no timestamp is touched, and the id is not
    /// validated, because the same call clears the pointer with `None`.
    #[inline]
    pub fn set_active(&mut self, id: Option<ResourceId>) {
        self.active = id;
    }

    /// Empty the store and clear the active pointer
    pub fn clear(&mut self) {
        self.entries.clear();
        self.active = None;
    }

    /// Entry for `id`, if live
    #[inline]
    #[must_use]
    pub fn get(&self, id: &ResourceId) -> Option<&CachedEntry> {
        self.entries.get(id)
    }

    /// Currently active id
    #[inline]
    #[must_use]
    pub fn active_id(&self) -> Option<&ResourceId> {
        self.active.as_ref()
    }

    /// Number of live entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &CachedEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CachedEntry;

    fn session(id: &str) -> CachedEntry {
        CachedEntry::session(id, "w1", id.to_uppercase(), format!("https://embed/{id}"), Utc::now())
    }

    #[test]
    fn insert_sets_active() {
        let mut store = LiveCacheStore::new();
        store.insert_active(session("s1"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.active_id(), Some(&"s1".into()));
    }

    #[test]
    fn touch_refreshes_without_moving_active() {
        let mut store = LiveCacheStore::new();
        store.insert_active(session("s1"));
        store.insert_active(session("s2"));
        let before = store.get(&"s1".into()).unwrap().last_accessed;

        let later = before + chrono::Duration::seconds(5);
        assert!(store.touch(&"s1".into(), later));

        assert_eq!(store.get(&"s1".into()).unwrap().last_accessed, later);
        // touch alone does not change the pointer
        assert_eq!(store.active_id(), Some(&"s2".into()));
    }

    #[test]
    fn touch_unknown_id_does_not_insert() {
        let mut store = LiveCacheStore::new();
        assert!(!store.touch(&"ghost".into(), Utc::now()));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_active_entry_clears_pointer() {
        let mut store = LiveCacheStore::new();
        store.insert_active(session("s1"));

        store.remove(&"s1".into());

        assert!(store.is_empty());
        assert_eq!(store.active_id(), None);
    }

    #[test]
    fn remove_inactive_entry_keeps_pointer() {
        let mut store = LiveCacheStore::new();
        store.insert_active(session("s1"));
        store.insert_active(session("s2"));

        store.remove(&"s1".into());

        assert_eq!(store.len(), 1);
        assert_eq!(store.active_id(), Some(&"s2".into()));
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut store = LiveCacheStore::new();
        store.insert_active(session("s1"));

        assert!(store.remove(&"ghost".into()).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_id(), Some(&"s1".into()));
    }

    #[test]
    fn clear_empties_store_and_pointer() {
        let mut store = LiveCacheStore::new();
        store.insert_active(session("s1"));
        store.insert_active(session("s2"));

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.active_id(), None);
    }

    #[test]
    fn entries_iterate_in_insertion_order() {
        let mut store = LiveCacheStore::new();
        store.insert_active(session("s1"));
        store.insert_active(session("s2"));
        store.insert_active(session("s3"));

        let ids: Vec<_> = store.entries().map(|e| e.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }
}
