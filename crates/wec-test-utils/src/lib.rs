//! Testing utilities for the WEC workspace
//!
//! Shared doubles for the collaborator ports: a scripted URL resolver with an
//! optional gate for interleaving tests, a toggleable catalog, a recording
//! notification sink, and a key-value store that fails on demand.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Semaphore};
use wec_ports::{
    CatalogSource, KeyValueStore, NotificationSink, ResolveError, SessionUrlResolver, Severity,
    StorageError, WebAppDescriptor,
};

/// Route subsystem logs to the test output, honoring `RUST_LOG`
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Scripted session URL resolver
///
/// Resolves every id to `https://embed/<id>` unless a failure is scripted for
/// it. With a gate, `resolve` blocks until [`release`](Self::release), which
/// lets tests interleave operations across the suspension point.
pub struct ScriptedResolver {
    failures: Mutex<HashMap<String, ResolveError>>,
    gated: bool,
    gate: Semaphore,
    calls_tx: watch::Sender<usize>,
    calls_rx: watch::Receiver<usize>,
}

impl ScriptedResolver {
    pub fn ok() -> Self {
        let (calls_tx, calls_rx) = watch::channel(0);
        Self {
            failures: Mutex::new(HashMap::new()),
            gated: false,
            gate: Semaphore::new(0),
            calls_tx,
            calls_rx,
        }
    }

    #[must_use]
    pub fn with_failure(self, id: &str, error: ResolveError) -> Self {
        self.failures.lock().insert(id.to_string(), error);
        self
    }

    #[must_use]
    pub fn with_gate(mut self) -> Self {
        self.gated = true;
        self
    }

    /// Wait until at least one `resolve` call has started
    pub async fn wait_for_call(&self) {
        let mut rx = self.calls_rx.clone();
        rx.wait_for(|calls| *calls > 0)
            .await
            .expect("resolver dropped");
    }

    /// Let one gated resolution proceed
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Number of `resolve` calls started so far
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls_rx.borrow()
    }
}

#[async_trait]
impl SessionUrlResolver for ScriptedResolver {
    async fn resolve(&self, session_id: &str) -> Result<String, ResolveError> {
        self.calls_tx.send_modify(|calls| *calls += 1);
        if self.gated {
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        if let Some(error) = self.failures.lock().get(session_id) {
            return Err(error.clone());
        }
        Ok(format!("https://embed/{session_id}"))
    }
}

/// Catalog double with settable contents and readiness
pub struct TestCatalog {
    ready: AtomicBool,
    apps: Mutex<Vec<WebAppDescriptor>>,
}

impl TestCatalog {
    /// Catalog starting in the not-ready state
    pub fn new(apps: Vec<WebAppDescriptor>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            apps: Mutex::new(apps),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_apps(&self, apps: Vec<WebAppDescriptor>) {
        *self.apps.lock() = apps;
    }
}

impl CatalogSource for TestCatalog {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn list(&self) -> Vec<WebAppDescriptor> {
        self.apps.lock().clone()
    }
}

/// Notification sink that records every message
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().clone()
    }

    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(_, s)| *s == severity)
            .map(|(m, _)| m.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages.lock().push((message.to_string(), severity));
    }
}

/// Key-value store that can be told to fail reads or writes
///
/// Backed by an in-memory map; failures simulate a broken device store.
#[derive(Default)]
pub struct FlakyStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("scripted read failure")));
        }
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("scripted write failure")));
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("scripted write failure")));
        }
        self.values.lock().remove(key);
        Ok(())
    }
}
