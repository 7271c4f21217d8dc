//! Architectural Contract Test: Change Reporting
//!
//! This test verifies the happy path of one monitor cycle.
//!
//! Constraints verified:
//! - Every change of a cycle is reported in exactly one message
//! - The stored snapshot is replaced only after the report attempt
//! - A removal-only cycle stores an empty snapshot
//!
//! If this test fails, someone has:
//! - Started sending one message per event
//! - Persisted before notifying
//! - Changed the event order or message format

mod common;

use common::*;
use holdwatch_core::engine::{CycleOutcome, MonitorEngine};

fn engine_with(
    source: ScriptedSource,
    notifier: RecordingNotifier,
    store: MockSnapshotStore,
) -> MonitorEngine {
    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(source),
        Box::new(notifier),
        Box::new(store),
        minimal_config(),
    )
    .expect("engine construction succeeds");
    engine
}

#[tokio::test]
async fn new_holder_is_reported_and_persisted() {
    let prior = snapshot(&[(1, "addrA", 500_000_000)]);
    let current = snapshot(&[(1, "addrA", 500_000_000), (2, "addrB", 100_000_000)]);

    let notifier = RecordingNotifier::new();
    let store = MockSnapshotStore::with_snapshot(prior);
    let engine = engine_with(ScriptedSource::always(current.clone()), notifier.clone(), store.clone());

    let outcome = engine.run_cycle().await;

    assert!(matches!(
        outcome,
        CycleOutcome::Committed {
            events: 1,
            notified: true
        }
    ));
    assert_eq!(
        notifier.messages(),
        vec!["Top-100 BTC holders changes (1 events):\n- NEW #2: addrB (1.00000000 BTC)".to_string()]
    );
    assert_eq!(store.stored().await.entries(), current.entries());
}

#[tokio::test]
async fn rank_swap_reports_both_addresses() {
    let prior = snapshot(&[(1, "addrA", 500_000_000), (2, "addrB", 300_000_000)]);
    let current = snapshot(&[(1, "addrB", 300_000_000), (2, "addrA", 500_000_000)]);

    let notifier = RecordingNotifier::new();
    let store = MockSnapshotStore::with_snapshot(prior);
    let engine = engine_with(ScriptedSource::always(current), notifier.clone(), store);

    engine.run_cycle().await;

    let reports = notifier.change_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0],
        "Top-100 BTC holders changes (2 events):\n\
         - RANK 2 -> 1: addrB\n\
         - RANK 1 -> 2: addrA"
    );
}

#[tokio::test]
async fn balance_drop_above_threshold_is_reported() {
    let prior = snapshot(&[(1, "addrA", 500_000_000)]);
    let current = snapshot(&[(1, "addrA", 498_000_000)]);

    let notifier = RecordingNotifier::new();
    let store = MockSnapshotStore::with_snapshot(prior);
    let engine = engine_with(ScriptedSource::always(current), notifier.clone(), store);

    engine.run_cycle().await;

    assert_eq!(
        notifier.change_reports(),
        vec![
            "Top-100 BTC holders changes (1 events):\n\
             - BALANCE change for addrA: 5.00000000 -> 4.98000000 BTC (-0.02000000)"
                .to_string()
        ]
    );
}

#[tokio::test]
async fn removal_only_cycle_stores_empty_snapshot() {
    let prior = snapshot(&[(1, "addrA", 500_000_000)]);

    let notifier = RecordingNotifier::new();
    let store = MockSnapshotStore::with_snapshot(prior);
    let engine = engine_with(
        ScriptedSource::always(snapshot(&[])),
        notifier.clone(),
        store.clone(),
    );

    let outcome = engine.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::Committed { events: 1, .. }));
    assert_eq!(
        notifier.change_reports(),
        vec!["Top-100 BTC holders changes (1 events):\n- REMOVED #1: addrA (5.00000000 BTC)".to_string()]
    );
    assert_eq!(store.replace_count(), 1);
    assert!(store.stored().await.is_empty());
}

#[tokio::test]
async fn first_run_reports_every_holder_in_one_message() {
    let current = snapshot(&[
        (1, "addrA", 500_000_000),
        (2, "addrB", 400_000_000),
        (3, "addrC", 300_000_000),
    ]);

    let notifier = RecordingNotifier::new();
    let store = MockSnapshotStore::new();
    let engine = engine_with(ScriptedSource::always(current), notifier.clone(), store.clone());

    let outcome = engine.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::Committed { events: 3, .. }));
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1, "one message per cycle, not per event");

    let lines: Vec<&str> = messages[0].lines().collect();
    assert_eq!(lines[0], "Top-100 BTC holders changes (3 events):");
    assert!(lines[1].starts_with("- NEW #1: addrA"));
    assert!(lines[2].starts_with("- NEW #2: addrB"));
    assert!(lines[3].starts_with("- NEW #3: addrC"));
    assert_eq!(store.stored().await.len(), 3);
}

#[tokio::test]
async fn persistence_happens_after_notification() {
    let journal = Journal::new();
    let notifier = RecordingNotifier::with_journal(journal.clone());
    let store = MockSnapshotStore::new().journal(journal.clone());
    let engine = engine_with(
        ScriptedSource::always(snapshot(&[(1, "addrA", 1)])),
        notifier,
        store,
    );

    engine.run_cycle().await;

    assert_eq!(journal.entries(), vec!["notify", "persist"]);
}

#[tokio::test]
async fn unsorted_source_output_is_reconciled_in_rank_order() {
    // Sources may hand back rows in any order as long as ranks are dense
    let current = snapshot(&[(2, "addrB", 200), (1, "addrA", 300)]);

    let notifier = RecordingNotifier::new();
    let store = MockSnapshotStore::new();
    let engine = engine_with(ScriptedSource::always(current), notifier.clone(), store.clone());

    engine.run_cycle().await;

    let stored = store.stored().await;
    assert_eq!(stored.entries()[0].address, "addrA");
    assert_eq!(stored.entries()[1].address, "addrB");
    assert!(notifier.messages()[0].contains("- NEW #1: addrA"));
}
