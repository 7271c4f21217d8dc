//! Core monitor engine
//!
//! The MonitorEngine is responsible for:
//! - Fetching the current top-N list via SnapshotSource
//! - Validating it before anything is compared
//! - Reconciling it against the stored snapshot
//! - Sending one change report via Notifier
//! - Replacing the stored snapshot after the report attempt
//!
//! ## Cycle state machine
//!
//! ```text
//!          ┌──────────┐    ┌─────────────┐    ┌──────────┐
//! Idle ───▶│ Fetching │───▶│ Reconciling │───▶│ NoChange │───▶ Idle
//!          └──────────┘    └─────────────┘    └──────────┘
//!               │                 │
//!               │                 ▼
//!               │           ┌───────────┐    ┌────────────┐
//!               │           │ Notifying │───▶│ Persisting │───▶ Idle
//!               │           └───────────┘    └────────────┘
//!               │                                   │
//!               └──────────────▶ CycleFailed ◀──────┘ ───▶ Idle
//! ```
//!
//! A failed cycle is reported (log + best-effort notification) and the next
//! cycle runs after the normal poll interval. The stored snapshot is only
//! ever replaced by a validated snapshot that produced at least one event.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::{DisplayConfig, MonitorConfig};
use crate::error::{Error, Result};
use crate::format::{format_changes, format_failure};
use crate::reconcile::reconcile;
use crate::snapshot::Snapshot;
use crate::traits::{Notifier, SnapshotSource, SnapshotStore};

/// States of one monitor cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleState {
    /// Waiting for the next poll
    Idle,
    /// Fetching and validating the current snapshot
    Fetching,
    /// Loading the stored snapshot and comparing
    Reconciling,
    /// Nothing changed; neither notify nor persist
    NoChange,
    /// Sending the change report
    Notifying,
    /// Replacing the stored snapshot
    Persisting,
    /// The cycle was abandoned
    CycleFailed,
}

/// Result of one monitor cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// Reconciliation found no changes
    NoChange,
    /// Changes were reported and the new snapshot stored
    Committed {
        /// Number of change events
        events: usize,
        /// Whether the change report was delivered
        notified: bool,
    },
    /// The cycle was abandoned; the stored snapshot is untouched
    Failed {
        /// State in which the error happened
        state: CycleState,
        /// The error
        error: Error,
    },
}

/// Events emitted by the MonitorEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        source: &'static str,
        notifier: &'static str,
    },

    /// A cycle entered a new state
    StateEntered(CycleState),

    /// Reconciliation produced events
    ChangesDetected { count: usize },

    /// The change report could not be delivered
    NotificationFailed { error: String },

    /// The new snapshot was stored
    SnapshotPersisted { entries: usize },

    /// The cycle was abandoned
    CycleFailed { state: CycleState, error: String },

    /// Engine stopped
    Stopped { reason: String },
}

type ShutdownSignal<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Core monitor engine
///
/// ## Lifecycle
///
/// 1. Create with [`MonitorEngine::new()`]
/// 2. Start with [`MonitorEngine::run()`]
/// 3. Engine runs until a shutdown signal is received
///
/// ## Concurrency
///
/// Exactly one cycle runs at a time. A shutdown signal that arrives during a
/// cycle is honoured once that cycle has finished, so a snapshot replace is
/// never interrupted.
pub struct MonitorEngine {
    /// Source of the current ranked list
    source: Box<dyn SnapshotSource>,

    /// Change report transport
    notifier: Box<dyn Notifier>,

    /// Holder of the last committed snapshot
    store: Box<dyn SnapshotStore>,

    /// Maximum number of holders tracked
    limit: usize,

    /// Minimum reported balance movement, in smallest units
    balance_threshold_sats: u64,

    /// Delay between cycles
    poll_interval: Duration,

    /// Bound for every source, notifier and store call
    io_timeout: Duration,

    /// Message rendering
    display: DisplayConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl MonitorEngine {
    /// Create a new monitor engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        source: Box<dyn SnapshotSource>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn SnapshotStore>,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let settings = config.monitor;
        let (tx, rx) = mpsc::channel(settings.event_channel_capacity);

        let engine = Self {
            source,
            notifier,
            store,
            limit: settings.limit,
            balance_threshold_sats: settings.balance_threshold_sats,
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            io_timeout: Duration::from_secs(settings.io_timeout_secs),
            display: settings.display,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let shutdown: ShutdownSignal<'_> = Box::pin(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        });
        self.run_until(shutdown).await
    }

    /// Run the engine until the given receiver fires (or its sender is dropped)
    ///
    /// With `None` this behaves like [`MonitorEngine::run()`].
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        match shutdown_rx {
            Some(rx) => {
                let shutdown: ShutdownSignal<'_> = Box::pin(async move {
                    let _ = rx.await;
                });
                self.run_until(shutdown).await
            }
            None => self.run().await,
        }
    }

    async fn run_until(&self, mut shutdown: ShutdownSignal<'_>) -> Result<()> {
        info!(
            "Starting monitor: source={} notifier={} poll_interval={}s limit={}",
            self.source.source_name(),
            self.notifier.notifier_name(),
            self.poll_interval.as_secs(),
            self.limit
        );
        self.emit_event(EngineEvent::Started {
            source: self.source.source_name(),
            notifier: self.notifier.notifier_name(),
        });

        let mut stop_requested = false;

        loop {
            // Keep polling the shutdown signal while the cycle runs, but
            // always drive the cycle to completion.
            let cycle = self.run_cycle();
            tokio::pin!(cycle);
            loop {
                tokio::select! {
                    _ = &mut cycle => break,
                    _ = &mut shutdown, if !stop_requested => {
                        info!("Shutdown signal received, finishing current cycle");
                        stop_requested = true;
                    }
                }
            }

            if stop_requested {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Monitor stopped");
        Ok(())
    }

    /// Run one complete cycle
    ///
    /// Never returns an error: failures are reported and returned as
    /// [`CycleOutcome::Failed`].
    pub async fn run_cycle(&self) -> CycleOutcome {
        let outcome = match self.try_cycle().await {
            Ok(outcome) => outcome,
            Err((state, error)) => {
                self.fail_cycle(state, &error).await;
                CycleOutcome::Failed { state, error }
            }
        };
        self.enter(CycleState::Idle);
        outcome
    }

    async fn try_cycle(&self) -> std::result::Result<CycleOutcome, (CycleState, Error)> {
        self.enter(CycleState::Fetching);
        let current = self
            .fetch_current()
            .await
            .map_err(|e| (CycleState::Fetching, e))?;

        self.enter(CycleState::Reconciling);
        let prior = self
            .with_timeout(self.store.load_current(), Error::storage)
            .await
            .map_err(|e| (CycleState::Reconciling, e))?;

        let events = reconcile(&prior, &current, self.balance_threshold_sats);
        if events.is_empty() {
            self.enter(CycleState::NoChange);
            debug!("No changes detected ({} holders)", current.len());
            return Ok(CycleOutcome::NoChange);
        }

        info!("Detected {} change events", events.len());
        self.emit_event(EngineEvent::ChangesDetected {
            count: events.len(),
        });

        self.enter(CycleState::Notifying);
        let message = format_changes(&events, self.limit, &self.display);
        let notified = match self
            .with_timeout(self.notifier.send(&message), Error::delivery)
            .await
        {
            Ok(()) => {
                debug!("Change report delivered via {}", self.notifier.notifier_name());
                true
            }
            Err(e) => {
                // Delivery is a side channel; persistence proceeds.
                warn!("Failed to deliver change report: {}", e);
                self.emit_event(EngineEvent::NotificationFailed {
                    error: e.to_string(),
                });
                false
            }
        };

        self.enter(CycleState::Persisting);
        self.with_timeout(self.store.replace_current(&current), Error::storage)
            .await
            .map_err(|e| (CycleState::Persisting, e))?;

        info!("Stored new snapshot ({} holders)", current.len());
        self.emit_event(EngineEvent::SnapshotPersisted {
            entries: current.len(),
        });

        Ok(CycleOutcome::Committed {
            events: events.len(),
            notified,
        })
    }

    /// Fetch and validate the current snapshot
    async fn fetch_current(&self) -> Result<Snapshot> {
        let snapshot = self
            .with_timeout(self.source.fetch(self.limit), Error::unreachable)
            .await?;
        snapshot.validate(self.limit)
    }

    /// Report a failed cycle; never fails itself
    async fn fail_cycle(&self, state: CycleState, error: &Error) {
        self.enter(CycleState::CycleFailed);
        error!("Monitor cycle failed in {:?}: {}", state, error);
        self.emit_event(EngineEvent::CycleFailed {
            state,
            error: error.to_string(),
        });

        let report = format_failure(error);
        if let Err(e) = self
            .with_timeout(self.notifier.send(&report), Error::delivery)
            .await
        {
            error!("Failed to report cycle failure: {}", e);
        }
    }

    /// Bound an I/O call; a timeout becomes the given error kind
    async fn with_timeout<T, F>(&self, call: F, on_timeout: fn(String) -> Error) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.io_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(format!(
                "timed out after {}s",
                self.io_timeout.as_secs()
            ))),
        }
    }

    fn enter(&self, state: CycleState) {
        debug!("Cycle state: {:?}", state);
        self.emit_event(EngineEvent::StateEntered(state));
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Never block the cycle on observers
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
