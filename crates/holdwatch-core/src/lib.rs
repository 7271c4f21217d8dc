// # holdwatch-core
//
// Core library for the top-holders snapshot monitor.
//
// ## Architecture Overview
//
// This library provides the core functionality for watching a ranked list of
// ledger holders and reporting how it changes between polls:
// - **SnapshotSource**: Trait for fetching the current top-N list
// - **SnapshotStore**: Trait for durable storage of the last committed snapshot
// - **Notifier**: Trait for delivering change reports
// - **reconcile**: Pure diff of two snapshots into ordered change events
// - **MonitorEngine**: Poll loop that drives fetch → reconcile → notify → persist
// - **ComponentRegistry**: Plugin-based registry for sources, notifiers and stores
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Comparison logic is pure; I/O lives behind traits
// 2. **Plugin-Based**: Components are registered by name, no hard-coded if-else
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Atomic Replacement**: The stored snapshot is replaced wholesale or not at all

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod log_notifier;
pub mod reconcile;
pub mod registry;
pub mod snapshot;
pub mod state;
pub mod traits;
pub mod units;

// Re-export core types for convenience
pub use config::{DisplayConfig, MonitorConfig, MonitorSettings, NotifierConfig, SourceConfig, StoreConfig};
pub use engine::{CycleOutcome, CycleState, EngineEvent, MonitorEngine};
pub use error::{Error, Result, SourceErrorKind};
pub use log_notifier::LogNotifier;
pub use reconcile::{ChangeEvent, reconcile};
pub use registry::ComponentRegistry;
pub use snapshot::{Entry, Snapshot};
pub use state::{FileSnapshotStore, MemorySnapshotStore, SqliteSnapshotStore};
pub use traits::{Notifier, SnapshotSource, SnapshotStore};
