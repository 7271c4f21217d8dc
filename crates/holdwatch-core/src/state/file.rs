// # File Snapshot Store
//
// File-based implementation of SnapshotStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: new snapshot written to a temp file, then renamed
// - Automatic backup: the previous file is copied to `.backup` before the swap
// - Corruption detection: JSON validated on load
// - Recovery: falls back to the backup; a corrupt file with no usable backup
//   is a storage error, never an empty snapshot
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "snapshot": {
//     "captured_at": "2025-01-09T12:00:00Z",
//     "entries": [
//       { "rank": 1, "address": "34xp4v...", "balance_sats": 24859700000000 }
//     ]
//   }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::StoreConfig;
use crate::snapshot::Snapshot;
use crate::traits::snapshot_store::{SnapshotStore, SnapshotStoreFactory};

/// Snapshot file format version
const SNAPSHOT_FILE_VERSION: &str = "1.0";

/// File-based snapshot store with crash recovery
///
/// Nothing is cached in memory; every `load_current` reads the file, so the
/// file is always the single source of truth.
///
/// # Example
///
/// ```rust,no_run
/// use holdwatch_core::snapshot::Snapshot;
/// use holdwatch_core::state::FileSnapshotStore;
/// use holdwatch_core::traits::SnapshotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSnapshotStore::new("/var/lib/holdwatch/snapshot.json");
///
///     // Atomically written to disk
///     store.replace_current(&Snapshot::from_ordered(vec![("addrA", 5)])).await?;
///
///     let current = store.load_current().await?;
///     assert_eq!(current.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
    // Serializes writers so two swaps never share the temp file.
    write_lock: Mutex<()>,
}

/// Serializable snapshot file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SnapshotFileFormat {
    version: String,
    snapshot: Snapshot,
}

impl FileSnapshotStore {
    /// Create a file snapshot store
    ///
    /// The file is not touched until the first load or replace.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load the main file
    /// 2. If it does not parse, try loading the backup
    /// 3. If the backup is missing or also fails, return a storage error
    ///
    /// Only a missing main file (first run) loads as an empty snapshot.
    async fn load_with_recovery(&self) -> Result<Snapshot, Error> {
        match Self::load_file(&self.path).await {
            Ok(snapshot) => {
                tracing::debug!("Loaded snapshot from file: {} entries", snapshot.len());
                Ok(snapshot)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Snapshot file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(&self.path);
                if !fs::try_exists(&backup_path).await.unwrap_or(false) {
                    return Err(Error::storage(format!(
                        "Snapshot file {} is corrupted and no backup exists: {}",
                        self.path.display(),
                        e
                    )));
                }

                match Self::load_file(&backup_path).await {
                    Ok(snapshot) => {
                        tracing::info!(
                            "Recovered snapshot from backup: {} entries",
                            snapshot.len()
                        );
                        if let Err(restore_err) = fs::copy(&backup_path, &self.path).await {
                            tracing::error!(
                                "Failed to restore snapshot file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(snapshot)
                    }
                    Err(backup_err) => Err(Error::storage(format!(
                        "Snapshot file {} is corrupted and the backup is unusable: {}",
                        self.path.display(),
                        backup_err
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load a snapshot file; a missing file is an empty snapshot
    async fn load_file(path: &Path) -> Result<Snapshot, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Snapshot file does not exist: {}", path.display());
                return Ok(Snapshot::empty());
            }
            Err(e) => {
                return Err(Error::storage(format!(
                    "Failed to read snapshot file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let file: SnapshotFileFormat = serde_json::from_str(&content)?;

        if file.version != SNAPSHOT_FILE_VERSION {
            tracing::warn!(
                "Snapshot file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                SNAPSHOT_FILE_VERSION,
                file.version
            );
        }

        Ok(file.snapshot)
    }

    /// Write the snapshot atomically
    async fn write_file(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create snapshot directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = SnapshotFileFormat {
            version: SNAPSHOT_FILE_VERSION.to_string(),
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::storage(format!("Failed to serialize snapshot: {}", e)))?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            temp.write_all(json.as_bytes()).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            temp.sync_all().await.map_err(|e| {
                Error::storage(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous good file as backup
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Snapshot written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load_current(&self) -> Result<Snapshot, Error> {
        self.load_with_recovery().await
    }

    async fn replace_current(&self, snapshot: &Snapshot) -> Result<(), Error> {
        self.write_file(snapshot).await
    }
}

/// Factory for the `file` store type
pub struct FileSnapshotStoreFactory;

impl SnapshotStoreFactory for FileSnapshotStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn SnapshotStore>, Error> {
        match config {
            StoreConfig::File { path } => Ok(Box::new(FileSnapshotStore::new(path))),
            _ => Err(Error::config("Invalid config for file store")),
        }
    }
}
