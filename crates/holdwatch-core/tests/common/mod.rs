//! Test doubles and common utilities for monitor contract tests
//!
//! The doubles share an optional [`Journal`] so a test can assert the order
//! in which the engine touched the notifier and the store.

#![allow(dead_code)]

use holdwatch_core::error::{Error, Result, SourceErrorKind};
use holdwatch_core::snapshot::{Entry, Snapshot};
use holdwatch_core::state::MemorySnapshotStore;
use holdwatch_core::traits::{Notifier, SnapshotSource, SnapshotStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered record of side effects across doubles
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<&'static str>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: &'static str) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.entries.lock().unwrap().clone()
    }
}

/// What the scripted source does on one fetch
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this snapshot as-is (it is still validated by the engine)
    Return(Snapshot),
    /// Fail with this source error kind
    Fail(SourceErrorKind),
    /// Never complete
    Hang,
    /// Return the snapshot after a delay
    Delay(Duration, Snapshot),
}

/// A SnapshotSource that replays a script of steps
///
/// When the script runs out the last step is repeated.
#[derive(Clone)]
pub struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    last: Arc<Mutex<Option<Step>>>,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            last: Arc::new(Mutex::new(None)),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that always returns the same snapshot
    pub fn always(snapshot: Snapshot) -> Self {
        Self::new(vec![Step::Return(snapshot)])
    }

    /// Get the number of times fetch() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.steps.lock().unwrap().pop_front() {
            *last = Some(step.clone());
            return step;
        }
        last.clone().unwrap_or(Step::Return(Snapshot::empty()))
    }
}

#[async_trait::async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(&self, _limit: usize) -> Result<Snapshot> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Return(snapshot) => Ok(snapshot),
            Step::Fail(SourceErrorKind::Unreachable) => Err(Error::unreachable("connection refused")),
            Step::Fail(SourceErrorKind::MalformedData) => Err(Error::malformed("no table found")),
            Step::Fail(SourceErrorKind::RateLimited) => Err(Error::rate_limited("HTTP 429")),
            Step::Hang => std::future::pending().await,
            Step::Delay(delay, snapshot) => {
                tokio::time::sleep(delay).await;
                Ok(snapshot)
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A Notifier that records every message
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
    hanging: Arc<AtomicBool>,
    journal: Option<Journal>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Make every send fail with a delivery error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every send hang forever
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    /// All attempted messages, including failed ones
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Attempted messages that reported changes
    pub fn change_reports(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.starts_with("Top-"))
            .collect()
    }

    /// Attempted messages that reported a failed cycle
    pub fn failure_reports(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.starts_with("Monitor error"))
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        if let Some(journal) = &self.journal {
            journal.record("notify");
        }
        self.messages.lock().unwrap().push(message.to_string());

        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::delivery("chat not found"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// A SnapshotStore that counts calls and can be made to fail
#[derive(Clone, Default)]
pub struct MockSnapshotStore {
    inner: MemorySnapshotStore,
    load_count: Arc<AtomicUsize>,
    replace_count: Arc<AtomicUsize>,
    fail_load: Arc<AtomicBool>,
    fail_replace: Arc<AtomicBool>,
    hang_replace: Arc<AtomicBool>,
    journal: Option<Journal>,
}

impl MockSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: MemorySnapshotStore::with_snapshot(snapshot),
            ..Self::default()
        }
    }

    pub fn journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_replace(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }

    pub fn set_hang_replace(&self, hang: bool) {
        self.hang_replace.store(hang, Ordering::SeqCst);
    }

    /// Get the number of times load_current() was called
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Get the number of successful or attempted replace_current() calls
    pub fn replace_count(&self) -> usize {
        self.replace_count.load(Ordering::SeqCst)
    }

    /// The currently stored snapshot
    pub async fn stored(&self) -> Snapshot {
        self.inner.load_current().await.unwrap()
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MockSnapshotStore {
    async fn load_current(&self) -> Result<Snapshot> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(Error::storage("database is locked"));
        }
        self.inner.load_current().await
    }

    async fn replace_current(&self, snapshot: &Snapshot) -> Result<()> {
        self.replace_count.fetch_add(1, Ordering::SeqCst);
        if let Some(journal) = &self.journal {
            journal.record("persist");
        }
        if self.hang_replace.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(Error::storage("disk I/O error"));
        }
        self.inner.replace_current(snapshot).await
    }
}

/// Build a snapshot from `(rank, address, balance)` triples
pub fn snapshot(rows: &[(u32, &str, u64)]) -> Snapshot {
    Snapshot::new(
        rows.iter()
            .map(|(rank, address, balance)| Entry::new(*rank, *address, *balance))
            .collect(),
    )
}

/// Helper to create a minimal MonitorConfig for testing
pub fn minimal_config() -> holdwatch_core::config::MonitorConfig {
    holdwatch_core::config::MonitorConfig {
        source: holdwatch_core::config::SourceConfig::Bitinfocharts { url: None },
        notifier: holdwatch_core::config::NotifierConfig::Log,
        store: holdwatch_core::config::StoreConfig::Memory,
        monitor: holdwatch_core::config::MonitorSettings {
            poll_interval_secs: 60,
            limit: 100,
            balance_threshold_sats: 1_000_000,
            io_timeout_secs: 5,
            event_channel_capacity: 100,
            display: holdwatch_core::config::DisplayConfig::default(),
        },
    }
}
