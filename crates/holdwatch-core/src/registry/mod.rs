//! Plugin-based component registry
//!
//! The registry maps configuration type names to factories, so the daemon
//! builds its source, notifier and store from configuration without
//! hardcoded if-else chains. Selection is explicit: an unknown type name is
//! a configuration error, never a silent fallback to another component.
//!
//! ## Registration
//!
//! Plugin crates expose a `register` function:
//!
//! ```rust,ignore
//! // In holdwatch-source-blockchair
//! pub fn register(registry: &ComponentRegistry) {
//!     registry.register_source("blockchair", Box::new(BlockchairFactory));
//! }
//! ```

use crate::config::{NotifierConfig, SourceConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::log_notifier::LogNotifierFactory;
use crate::state::{FileSnapshotStoreFactory, MemorySnapshotStoreFactory, SqliteSnapshotStoreFactory};
use crate::traits::{Notifier, SnapshotSource, SnapshotStore};
use crate::traits::{NotifierFactory, SnapshotSourceFactory, SnapshotStoreFactory};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Factories<F> = RwLock<HashMap<String, Box<F>>>;

/// Registry of snapshot source, notifier and store factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ComponentRegistry {
    sources: Factories<dyn SnapshotSourceFactory>,
    notifiers: Factories<dyn NotifierFactory>,
    stores: Factories<dyn SnapshotStoreFactory>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the core's built-in components
    ///
    /// Registers the `memory`, `file` and `sqlite` stores and the `log`
    /// notifier.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register the core's built-in components
    pub fn register_builtins(&self) {
        self.register_store("memory", Box::new(MemorySnapshotStoreFactory));
        self.register_store("file", Box::new(FileSnapshotStoreFactory));
        self.register_store("sqlite", Box::new(SqliteSnapshotStoreFactory));
        self.register_notifier("log", Box::new(LogNotifierFactory));
    }

    /// Register a snapshot source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "bitinfocharts", "blockchair")
    /// - `factory`: Factory object for creating source instances
    pub fn register_source(
        &self,
        name: impl Into<String>,
        factory: Box<dyn SnapshotSourceFactory>,
    ) {
        write(&self.sources).insert(name.into(), factory);
    }

    /// Register a notifier factory
    pub fn register_notifier(&self, name: impl Into<String>, factory: Box<dyn NotifierFactory>) {
        write(&self.notifiers).insert(name.into(), factory);
    }

    /// Register a snapshot store factory
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn SnapshotStoreFactory>) {
        write(&self.stores).insert(name.into(), factory);
    }

    /// Create a snapshot source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn SnapshotSource>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &SourceConfig) -> Result<Box<dyn SnapshotSource>> {
        let source_type = config.type_name();
        let sources = read(&self.sources);
        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown source type: {}", source_type)))?;

        factory.create(config)
    }

    /// Create a notifier from configuration
    pub fn create_notifier(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        let notifier_type = config.type_name();
        let notifiers = read(&self.notifiers);
        let factory = notifiers
            .get(notifier_type)
            .ok_or_else(|| Error::config(format!("Unknown notifier type: {}", notifier_type)))?;

        factory.create(config)
    }

    /// Create a snapshot store from configuration
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn SnapshotStore>> {
        let store_type = config.type_name();
        let stores = read(&self.stores);
        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        factory.create(config)
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        read(&self.sources).keys().cloned().collect()
    }

    /// List all registered notifier types
    pub fn list_notifiers(&self) -> Vec<String> {
        read(&self.notifiers).keys().cloned().collect()
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        read(&self.stores).keys().cloned().collect()
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        read(&self.sources).contains_key(name)
    }

    /// Check if a notifier type is registered
    pub fn has_notifier(&self, name: &str) -> bool {
        read(&self.notifiers).contains_key(name)
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        read(&self.stores).contains_key(name)
    }
}
