//! Minimal embedding example for holdwatch-core
//!
//! The host application supplies its own snapshot source and drives the
//! engine directly: two manual cycles, then the polling loop until the
//! application asks it to stop.

use holdwatch_core::config::{NotifierConfig, SourceConfig, StoreConfig};
use holdwatch_core::snapshot::Snapshot;
use holdwatch_core::traits::SnapshotSource;
use holdwatch_core::{
    CycleOutcome, LogNotifier, MemorySnapshotStore, MonitorConfig, MonitorEngine,
    MonitorSettings, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

/// In-process source that walks through a fixed list of snapshots
struct ReplaySource {
    snapshots: Vec<Vec<(&'static str, u64)>>,
    calls: AtomicUsize,
}

impl ReplaySource {
    fn new(snapshots: Vec<Vec<(&'static str, u64)>>) -> Self {
        Self {
            snapshots,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for ReplaySource {
    async fn fetch(&self, limit: usize) -> Result<Snapshot> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.snapshots.len().saturating_sub(1));
        let holders = self
            .snapshots
            .get(index)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit);
        Ok(Snapshot::from_ordered(holders))
    }

    fn source_name(&self) -> &'static str {
        "replay"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Embedded holdwatch-core Example ===\n");

    let source = ReplaySource::new(vec![
        vec![("addrA", 500_000_000), ("addrB", 300_000_000), ("addrC", 100_000_000)],
        vec![("addrB", 900_000_000), ("addrA", 500_000_000), ("addrD", 200_000_000)],
    ]);

    // The *Config values only describe the components; the engine uses the
    // instances passed below.
    let config = MonitorConfig {
        source: SourceConfig::Bitinfocharts { url: None },
        notifier: NotifierConfig::Log,
        store: StoreConfig::Memory,
        monitor: MonitorSettings {
            poll_interval_secs: 1,
            limit: 3,
            balance_threshold_sats: 0,
            ..MonitorSettings::default()
        },
    };

    println!("1. Creating engine...");
    let (engine, mut event_rx) = MonitorEngine::new(
        Box::new(source),
        Box::new(LogNotifier::new()),
        Box::new(MemorySnapshotStore::new()),
        config,
    )?;

    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[Event] {:?}", event);
        }
    });

    println!("2. Running cycles by hand...");
    for cycle in 1..=2 {
        match engine.run_cycle().await {
            CycleOutcome::Committed { events, notified } => {
                println!("   cycle {}: {} changes (notified: {})", cycle, events, notified)
            }
            CycleOutcome::NoChange => println!("   cycle {}: no change", cycle),
            CycleOutcome::Failed { state, error } => {
                println!("   cycle {}: failed in {:?}: {}", cycle, state, error)
            }
        }
    }

    println!("3. Running the polling loop for a few seconds...");
    let (stop_tx, stop_rx) = oneshot::channel();
    let stopper = async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        println!("4. Asking the engine to stop...");
        let _ = stop_tx.send(());
    };
    let (result, ()) = tokio::join!(engine.run_with_shutdown(Some(stop_rx)), stopper);
    result?;

    drop(engine);
    let _ = event_listener.await;

    println!("\n5. Engine stopped cleanly.");
    println!("Key Points:");
    println!("- The application owns the engine lifecycle");
    println!("- Every component is replaceable through the core traits");
    println!("- Unchanged snapshots produce no notification");

    Ok(())
}
