// # SQLite Snapshot Store
//
// SQLite-backed implementation of SnapshotStore.
//
// ## Schema
//
// ```sql
// holders(id INTEGER PRIMARY KEY AUTOINCREMENT, rank INTEGER, address TEXT UNIQUE, balance_sats INTEGER)
// snapshot_meta(id INTEGER PRIMARY KEY CHECK (id = 1), captured_at TEXT)
// ```
//
// `holders` only ever contains the current snapshot. A replace deletes every
// row and inserts the new ones inside a single transaction, so readers see
// either the old list or the new list.
//
// rusqlite is blocking; every call runs on the blocking thread pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::Error;
use crate::config::StoreConfig;
use crate::snapshot::{Entry, Snapshot};
use crate::traits::snapshot_store::{SnapshotStore, SnapshotStoreFactory};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS holders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        rank INTEGER NOT NULL,
        address TEXT NOT NULL UNIQUE,
        balance_sats INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS snapshot_meta (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        captured_at TEXT NOT NULL
    );
";

/// SQLite snapshot store
pub struct SqliteSnapshotStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSnapshotStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteSnapshotStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::storage(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(&path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("SQLite journal mode: {}", journal_mode);

        Self::init(conn, Some(path))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, Error> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, Error> {
        conn.execute_batch(SCHEMA)?;
        if let Some(path) = &path {
            tracing::info!("SQLite snapshot store ready: {}", path.display());
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, Error> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| Error::storage("SQLite connection mutex poisoned"))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| Error::storage(format!("SQLite task failed: {}", e)))?
    }

    fn load(conn: &mut Connection) -> Result<Snapshot, Error> {
        let captured_at: Option<String> = conn
            .query_row(
                "SELECT captured_at FROM snapshot_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let mut stmt =
            conn.prepare("SELECT rank, address, balance_sats FROM holders ORDER BY rank ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (rank, address, balance) = row?;
            let balance_sats = u64::try_from(balance).map_err(|_| {
                Error::storage(format!("Negative balance stored for {}", address))
            })?;
            entries.push(Entry::new(rank, address, balance_sats));
        }

        let captured_at = match captured_at {
            Some(text) => DateTime::parse_from_rfc3339(&text)
                .map_err(|e| Error::storage(format!("Invalid captured_at {:?}: {}", text, e)))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };

        Ok(Snapshot::with_captured_at(entries, captured_at))
    }

    fn replace(conn: &mut Connection, snapshot: &Snapshot) -> Result<(), Error> {
        // Dropping the transaction without commit rolls it back.
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM holders", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO holders (rank, address, balance_sats) VALUES (?1, ?2, ?3)",
            )?;
            for entry in snapshot.entries() {
                let balance = i64::try_from(entry.balance_sats).map_err(|_| {
                    Error::storage(format!(
                        "Balance {} for {} does not fit in SQLite INTEGER",
                        entry.balance_sats, entry.address
                    ))
                })?;
                stmt.execute(params![entry.rank, entry.address, balance])?;
            }
        }
        tx.execute(
            "INSERT INTO snapshot_meta (id, captured_at) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET captured_at = excluded.captured_at",
            params![snapshot.captured_at().to_rfc3339()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn load_current(&self) -> Result<Snapshot, Error> {
        self.with_conn(Self::load).await
    }

    async fn replace_current(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let snapshot = snapshot.clone();
        let entries = snapshot.len();
        self.with_conn(move |conn| Self::replace(conn, &snapshot))
            .await?;
        tracing::debug!("Replaced stored snapshot with {} entries", entries);
        Ok(())
    }
}

/// Factory for the `sqlite` store type
pub struct SqliteSnapshotStoreFactory;

impl SnapshotStoreFactory for SqliteSnapshotStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn SnapshotStore>, Error> {
        match config {
            StoreConfig::Sqlite { path } => Ok(Box::new(SqliteSnapshotStore::open(path)?)),
            _ => Err(Error::config("Invalid config for sqlite store")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Snapshot {
        Snapshot::new(vec![
            Entry::new(1, "addrA", 500_000_000),
            Entry::new(2, "addrB", 300_000_000),
        ])
    }

    #[tokio::test]
    async fn test_first_run_is_empty() {
        let store = SqliteSnapshotStore::open_in_memory().unwrap();
        assert!(store.load_current().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_and_reload_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.db");

        let snapshot = sample();
        {
            let store = SqliteSnapshotStore::open(&path).unwrap();
            store.replace_current(&snapshot).await.unwrap();
        }

        let store = SqliteSnapshotStore::open(&path).unwrap();
        let loaded = store.load_current().await.unwrap();
        assert_eq!(loaded.entries(), snapshot.entries());
        // RFC 3339 keeps sub-second precision
        assert_eq!(loaded.captured_at(), snapshot.captured_at());
    }

    #[tokio::test]
    async fn test_replace_with_empty_snapshot() {
        let store = SqliteSnapshotStore::open_in_memory().unwrap();
        store.replace_current(&sample()).await.unwrap();
        store.replace_current(&Snapshot::empty()).await.unwrap();

        assert!(store.load_current().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_prior_snapshot() {
        let store = SqliteSnapshotStore::open_in_memory().unwrap();
        let prior = sample();
        store.replace_current(&prior).await.unwrap();

        // Second row violates the UNIQUE(address) constraint mid-transaction
        let broken = Snapshot::new(vec![
            Entry::new(1, "addrC", 9),
            Entry::new(2, "addrC", 8),
        ]);
        let err = store.replace_current(&broken).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let loaded = store.load_current().await.unwrap();
        assert_eq!(loaded.entries(), prior.entries());
    }

    #[tokio::test]
    async fn test_oversized_balance_rolls_back() {
        let store = SqliteSnapshotStore::open_in_memory().unwrap();
        let prior = sample();
        store.replace_current(&prior).await.unwrap();

        let oversized = Snapshot::new(vec![
            Entry::new(1, "addrX", 1),
            Entry::new(2, "addrY", u64::MAX),
        ]);
        assert!(store.replace_current(&oversized).await.is_err());
        assert_eq!(store.load_current().await.unwrap().entries(), prior.entries());
    }

    #[test]
    fn test_factory() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::Sqlite {
            path: dir.path().join("m.db").to_string_lossy().into_owned(),
        };
        assert!(SqliteSnapshotStoreFactory.create(&config).is_ok());
        assert!(SqliteSnapshotStoreFactory.create(&StoreConfig::Memory).is_err());
    }
}
