// # Snapshot Store Trait
//
// Defines the interface for durable storage of the current snapshot.
//
// ## Purpose
//
// The store holds exactly one snapshot: the one the last successful cycle
// committed. It is the baseline the next cycle reconciles against.
//
// ## Implementations
//
// - SQLite: single table, replaced inside one transaction
// - File: JSON document, written to a temp file and renamed into place
// - Memory: non-persistent, for tests and embedding

use async_trait::async_trait;

use crate::snapshot::Snapshot;

/// Trait for snapshot store implementations
///
/// # Atomicity
///
/// `replace_current` either swaps the whole stored snapshot for the new one
/// or leaves the previous snapshot fully intact. A reader must never observe
/// a half-written list.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Forbidden Capabilities
/// - ❌ Keep history (only the current snapshot is stored)
/// - ❌ Decide when to persist (owned by `MonitorEngine`)
/// - ❌ Spawn background tasks without a clear lifecycle
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the current snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Snapshot)`: The stored snapshot, or an empty one on first run
    /// - `Err(Error::Storage)`: Storage error
    async fn load_current(&self) -> Result<Snapshot, crate::Error>;

    /// Atomically replace the current snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The new snapshot is durable
    /// - `Err(Error::Storage)`: Nothing changed
    async fn replace_current(&self, snapshot: &Snapshot) -> Result<(), crate::Error>;
}

/// Helper trait for constructing snapshot stores from configuration
pub trait SnapshotStoreFactory: Send + Sync {
    /// Create a SnapshotStore instance from configuration
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn SnapshotStore>, crate::Error>;
}
