// # Snapshot Source Trait
//
// Defines the interface for obtaining the current ranked holder list.
//
// ## Implementations
//
// - Scrape-based: `holdwatch-source-bitinfocharts` crate
// - API-based: `holdwatch-source-blockchair` crate
//
// ## Usage
//
// ```rust,ignore
// use holdwatch_core::SnapshotSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* SnapshotSource implementation */;
//
//     let snapshot = source.fetch(100).await?;
//     println!("{} holders", snapshot.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::snapshot::Snapshot;

/// Trait for snapshot source implementations
///
/// A source fetches the top-`limit` holders as they are "now". It must
/// return entries ranked 1..k (k <= `limit`) and deduplicated by address,
/// but the engine does not rely on it: every fetched snapshot is validated
/// before it reaches the reconciler.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS requests to their data endpoint only
/// - ✅ Parse provider-specific responses (HTML, JSON)
/// - ✅ Return success or failure (engine decides what happens next)
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (the engine retries on the next poll interval)
/// - ❌ Fall back to another source (selection is explicit in configuration)
/// - ❌ Access the snapshot store
/// - ❌ Spawn tasks or threads
///
/// # Errors
///
/// Failures are reported as [`crate::Error::Source`] with one of the kinds
/// `Unreachable`, `MalformedData` or `RateLimited`.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the current top-`limit` holders
    ///
    /// # Parameters
    ///
    /// - `limit`: Maximum number of entries to return
    ///
    /// # Returns
    ///
    /// - `Ok(Snapshot)`: Holders ranked 1..k, captured now
    /// - `Err(Error)`: If the source could not be read or parsed
    async fn fetch(&self, limit: usize) -> Result<Snapshot, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing snapshot sources from configuration
pub trait SnapshotSourceFactory: Send + Sync {
    /// Create a SnapshotSource instance from configuration
    fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Box<dyn SnapshotSource>, crate::Error>;
}
