//! Core traits for the holdwatch system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`SnapshotSource`]: Fetch the current ranked holder list
//! - [`Notifier`]: Deliver change reports
//! - [`SnapshotStore`]: Durable storage of the current snapshot

pub mod notifier;
pub mod snapshot_source;
pub mod snapshot_store;

pub use notifier::{Notifier, NotifierFactory};
pub use snapshot_source::{SnapshotSource, SnapshotSourceFactory};
pub use snapshot_store::{SnapshotStore, SnapshotStoreFactory};
