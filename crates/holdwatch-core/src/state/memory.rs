// # Memory Snapshot Store
//
// In-memory implementation of SnapshotStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing, embedding and dry runs.
//
// ## Crash Behavior
//
// - The stored snapshot is lost on restart/crash
// - First cycle after a restart reports every holder as `NEW`

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::StoreConfig;
use crate::snapshot::Snapshot;
use crate::traits::snapshot_store::{SnapshotStore, SnapshotStoreFactory};

/// In-memory snapshot store implementation
///
/// Clones share the same underlying snapshot, so a test can keep a handle
/// while the engine owns another.
///
/// # Example
///
/// ```rust,no_run
/// use holdwatch_core::snapshot::Snapshot;
/// use holdwatch_core::state::MemorySnapshotStore;
/// use holdwatch_core::traits::SnapshotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySnapshotStore::new();
///     assert!(store.load_current().await?.is_empty());
///
///     store.replace_current(&Snapshot::from_ordered(vec![("addrA", 5)])).await?;
///     assert_eq!(store.load_current().await?.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<RwLock<Snapshot>>,
}

impl MemorySnapshotStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a snapshot
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Number of entries in the stored snapshot
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the stored snapshot is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load_current(&self) -> Result<Snapshot, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn replace_current(&self, snapshot: &Snapshot) -> Result<(), Error> {
        *self.inner.write().await = snapshot.clone();
        Ok(())
    }
}

/// Factory for the `memory` store type
pub struct MemorySnapshotStoreFactory;

impl SnapshotStoreFactory for MemorySnapshotStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn SnapshotStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemorySnapshotStore::new())),
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
