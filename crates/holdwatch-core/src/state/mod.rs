// # Snapshot Store Implementations
//
// This module provides implementations of the SnapshotStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::{FileSnapshotStore, FileSnapshotStoreFactory};
pub use memory::{MemorySnapshotStore, MemorySnapshotStoreFactory};
pub use sqlite::{SqliteSnapshotStore, SqliteSnapshotStoreFactory};
