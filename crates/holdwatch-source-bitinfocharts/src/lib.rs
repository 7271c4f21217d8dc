// # Bitinfocharts Snapshot Source
//
// This crate provides a scrape-based SnapshotSource that reads the
// "top 100 richest bitcoin addresses" page of bitinfocharts.com.
//
// ## Behavior
//
// - ✅ One HTTP GET per `fetch()` call
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Status codes mapped to source error kinds (429, 5xx, other)
// - ✅ Integer-only balance parsing
// - ❌ NO retry logic (owned by MonitorEngine, next poll interval)
// - ❌ NO fallback to another source (selection is explicit)
// - ❌ NO caching between fetches
//
// ## Error mapping
//
// | Condition                        | Kind            |
// |----------------------------------|-----------------|
// | connect error, timeout, 5xx      | `Unreachable`   |
// | 429                              | `RateLimited`   |
// | other status, missing table, bad | `MalformedData` |
// | cell content                     |                 |

mod table;

pub use table::parse_holder_table;

use async_trait::async_trait;
use holdwatch_core::config::SourceConfig;
use holdwatch_core::snapshot::Snapshot;
use holdwatch_core::traits::{SnapshotSource, SnapshotSourceFactory};
use holdwatch_core::{ComponentRegistry, Error, Result};
use std::time::Duration;

/// Richest-addresses page
pub const DEFAULT_URL: &str = "https://bitinfocharts.com/top-100-richest-bitcoin-addresses.html";

/// Default HTTP timeout for the page fetch (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Satoshis per bitcoin, as a power of ten
const BTC_DECIMALS: u32 = 8;

const USER_AGENT: &str = concat!("holdwatch/", env!("CARGO_PKG_VERSION"));

/// Scrape-based bitcoin top-holders source
#[derive(Debug, Clone)]
pub struct BitinfochartsSource {
    /// Page URL
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl BitinfochartsSource {
    /// Create a source reading the default page
    pub fn new() -> Self {
        Self::with_url(DEFAULT_URL)
    }

    /// Create a source reading a custom URL (mirrors, tests)
    pub fn with_url(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            url: url.into(),
            client,
        }
    }

    /// Page URL this source reads
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_page(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            Error::unreachable(format!("Request to {} failed: {}", self.url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => Error::rate_limited(format!("Rate limit exceeded. Status: {}", status)),
                500..=599 => Error::unreachable(format!("Server error (transient): {}", status)),
                _ => Error::malformed(format!("Unexpected status: {}", status)),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Error::unreachable(format!("Failed to read page body: {}", e)))
    }
}

impl Default for BitinfochartsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotSource for BitinfochartsSource {
    async fn fetch(&self, limit: usize) -> Result<Snapshot> {
        tracing::debug!("Fetching holder page from {}", self.url);
        let html = self.fetch_page().await?;
        parse_holder_table(&html, limit, BTC_DECIMALS)
    }

    fn source_name(&self) -> &'static str {
        "bitinfocharts"
    }
}

/// Factory for creating bitinfocharts sources
pub struct BitinfochartsFactory;

impl SnapshotSourceFactory for BitinfochartsFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn SnapshotSource>> {
        match config {
            SourceConfig::Bitinfocharts { url } => Ok(Box::new(match url {
                Some(url) => BitinfochartsSource::with_url(url.clone()),
                None => BitinfochartsSource::new(),
            })),
            _ => Err(Error::config("Invalid config for bitinfocharts source")),
        }
    }
}

/// Register the bitinfocharts source with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_source("bitinfocharts", Box::new(BitinfochartsFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = BitinfochartsFactory;

        let source = factory.create(&SourceConfig::Bitinfocharts { url: None });
        assert!(source.is_ok());
        assert_eq!(source.unwrap().source_name(), "bitinfocharts");
    }

    #[test]
    fn test_factory_url_override() {
        let source = BitinfochartsSource::with_url("http://127.0.0.1:8080/top.html");
        assert_eq!(source.url(), "http://127.0.0.1:8080/top.html");
        assert_eq!(BitinfochartsSource::new().url(), DEFAULT_URL);
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let config = SourceConfig::Blockchair {
            api_key: None,
            url: None,
        };
        assert!(BitinfochartsFactory.create(&config).is_err());
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let source = BitinfochartsSource::with_url("http://127.0.0.1:1/top.html");
        let err = source.fetch(100).await.unwrap_err();
        assert_eq!(
            err.source_kind(),
            Some(holdwatch_core::SourceErrorKind::Unreachable)
        );
    }

    #[test]
    fn test_register() {
        let registry = ComponentRegistry::new();
        register(&registry);
        assert!(registry.has_source("bitinfocharts"));
    }
}
