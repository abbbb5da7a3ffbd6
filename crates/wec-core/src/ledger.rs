//! Recency ledger
//!
//! A persisted, capped, insertion-ordered history of previously opened
//! resources, independent of the live cache: records outlive their live
//! entries and survive logout and process restarts.
//!
//! Ordering is by *first-open time*. Re-opening an id already in a list
//! updates its name and timestamp in place without moving it; overflow drops
//! the oldest-inserted record from the front. Deliberate policy, not LRU.

use crate::types::{RecencyRecord, ResourceId, ResourceKind};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use wec_ports::KeyValueStore;

/// Capped per-kind recency history with write-through persistence
pub struct RecencyLedger {
    kv: Arc<dyn KeyValueStore>,
    cap: usize,
    sessions_key: String,
    web_apps_key: String,
    sessions: Vec<RecencyRecord>,
    web_apps: Vec<RecencyRecord>,
}

impl std::fmt::Debug for RecencyLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecencyLedger")
            .field("cap", &self.cap)
            .field("sessions", &self.sessions.len())
            .field("web_apps", &self.web_apps.len())
            .finish()
    }
}

impl RecencyLedger {
    /// Load the ledger from durable storage
    ///
    /// Missing, unreadable, or malformed stored lists load as empty with a
    /// warning; a corrupted device store never surfaces as an error.
    #[must_use]
    pub fn load(
        kv: Arc<dyn KeyValueStore>,
        cap: usize,
        sessions_key: impl Into<String>,
        web_apps_key: impl Into<String>,
    ) -> Self {
        let sessions_key = sessions_key.into();
        let web_apps_key = web_apps_key.into();
        let sessions = Self::load_list(kv.as_ref(), &sessions_key, cap);
        let web_apps = Self::load_list(kv.as_ref(), &web_apps_key, cap);
        Self {
            kv,
            cap,
            sessions_key,
            web_apps_key,
            sessions,
            web_apps,
        }
    }

    fn load_list(kv: &dyn KeyValueStore, key: &str, cap: usize) -> Vec<RecencyRecord> {
        let raw = match kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(key, error = %err, "recency list unreadable, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<RecencyRecord>>(&raw) {
            Ok(mut records) => {
                // A cap lowered between runs still holds on load
                if records.len() > cap {
                    let excess = records.len() - cap;
                    records.drain(..excess);
                }
                records
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "recency list corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Record an open of `id`
    ///
    /// In-place update if the id is already listed (position unchanged),
    /// otherwise append at the end and truncate from the front to the cap.
    /// The mutation is flushed to storage before returning.
    pub fn record_open(
        &mut self,
        kind: ResourceKind,
        id: &ResourceId,
        display_name: &str,
        workspace: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let cap = self.cap;
        let list = self.list_mut(kind);
        if let Some(record) = list.iter_mut().find(|r| &r.id == id) {
            record.display_name = display_name.to_string();
            record.last_accessed = now;
        } else {
            list.push(RecencyRecord {
                id: id.clone(),
                display_name: display_name.to_string(),
                workspace: workspace.map(str::to_string),
                last_accessed: now,
            });
            if list.len() > cap {
                let excess = list.len() - cap;
                list.drain(..excess);
            }
        }
        self.persist(kind);
    }

    /// Remove `id` from the `kind` list; unknown ids are a no-op
    pub fn remove(&mut self, kind: ResourceKind, id: &ResourceId) {
        let list = self.list_mut(kind);
        let before = list.len();
        list.retain(|r| &r.id != id);
        if list.len() != before {
            self.persist(kind);
        }
    }

    /// Records for `kind` in insertion order
    #[inline]
    #[must_use]
    pub fn list(&self, kind: ResourceKind) -> &[RecencyRecord] {
        match kind {
            ResourceKind::Session => &self.sessions,
            ResourceKind::WebApp => &self.web_apps,
        }
    }

    fn list_mut(&mut self, kind: ResourceKind) -> &mut Vec<RecencyRecord> {
        match kind {
            ResourceKind::Session => &mut self.sessions,
            ResourceKind::WebApp => &mut self.web_apps,
        }
    }

    fn storage_key(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Session => &self.sessions_key,
            ResourceKind::WebApp => &self.web_apps_key,
        }
    }

    // Write-through: best effort, a failed flush costs history, not state
    fn persist(&self, kind: ResourceKind) {
        let key = self.storage_key(kind);
        let list = self.list(kind);
        let raw = match serde_json::to_string(list) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = %err, "recency list not serializable");
                return;
            }
        };
        if let Err(err) = self.kv.set(key, &raw) {
            tracing::warn!(key, error = %err, "recency list flush failed");
        }
    }
}
