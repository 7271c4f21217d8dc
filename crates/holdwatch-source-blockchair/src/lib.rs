// # Blockchair Snapshot Source
//
// This crate provides an API-based SnapshotSource backed by the Blockchair
// `addresses` endpoint, sorted by balance.
//
// ## Behavior
//
// - ✅ One HTTP GET per `fetch()` call
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Optional API key (sent as `x-api-key`, never logged)
// - ✅ Accepts `data` as an array or as an object keyed by index
// - ❌ NO retry logic (owned by MonitorEngine)
// - ❌ NO fallback to another source
//
// ## API Reference
//
// ```http
// GET /bitcoin/addresses?limit=100&offset=0&s=balance(desc)
// ```
//
// ```json
// { "data": [ { "address": "34xp4v...", "balance": 24859700000000 } ], "context": { ... } }
// ```

use async_trait::async_trait;
use holdwatch_core::config::SourceConfig;
use holdwatch_core::snapshot::Snapshot;
use holdwatch_core::traits::{SnapshotSource, SnapshotSourceFactory};
use holdwatch_core::{ComponentRegistry, Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Blockchair addresses endpoint
pub const DEFAULT_URL: &str = "https://api.blockchair.com/bitcoin/addresses";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("holdwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct AddressesResponse {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AddressRow {
    address: String,
    balance: Balance,
}

/// Balances arrive as numbers or as digit strings depending on the endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Balance {
    Int(u64),
    Text(String),
}

impl Balance {
    fn to_sats(&self) -> Option<u64> {
        match self {
            Balance::Int(value) => Some(*value),
            Balance::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Blockchair API source
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
#[derive(Clone)]
pub struct BlockchairSource {
    /// Endpoint URL
    url: String,

    /// API key
    /// ⚠️ NEVER log this value
    api_key: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl std::fmt::Debug for BlockchairSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchairSource")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl BlockchairSource {
    /// Create a new Blockchair source
    ///
    /// # Parameters
    ///
    /// - `url`: Endpoint URL (None = public API)
    /// - `api_key`: Optional key that raises the request quota
    pub fn new(url: Option<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            api_key: api_key.filter(|key| !key.is_empty()),
            client,
        }
    }

    async fn fetch_body(&self, limit: usize) -> Result<String> {
        let mut request = self.client.get(&self.url).query(&[
            ("limit", limit.to_string()),
            ("offset", "0".to_string()),
            ("s", "balance(desc)".to_string()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::unreachable(format!("Blockchair request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            // 402 and 430 are Blockchair's quota responses
            return Err(match status.as_u16() {
                402 | 429 | 430 => {
                    Error::rate_limited(format!("Rate limit exceeded. Status: {}", status))
                }
                500..=599 => {
                    Error::unreachable(format!("Blockchair server error (transient): {}", status))
                }
                _ => Error::malformed(format!("Unexpected status: {}", status)),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Error::unreachable(format!("Failed to read response: {}", e)))
    }
}

/// Parse an addresses response body into a snapshot of at most `limit` rows
///
/// Ranks are assigned 1..k in response order. For the object form, entries
/// are ordered by their numeric key.
pub fn parse_addresses(body: &str, limit: usize) -> Result<Snapshot> {
    let response: AddressesResponse = serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("Invalid JSON response: {}", e)))?;

    let rows: Vec<Value> = match response.data {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(rows)) => rows,
        Some(Value::Object(map)) => {
            let mut keyed = map
                .into_iter()
                .map(|(key, row)| {
                    key.parse::<usize>()
                        .map(|index| (index, row))
                        .map_err(|_| Error::malformed(format!("Non-numeric data key {:?}", key)))
                })
                .collect::<Result<Vec<_>>>()?;
            keyed.sort_by_key(|(index, _)| *index);
            keyed.into_iter().map(|(_, row)| row).collect()
        }
        Some(other) => {
            return Err(Error::malformed(format!(
                "Unexpected data field: {}",
                other
            )));
        }
    };

    let mut holders = Vec::with_capacity(rows.len().min(limit));
    for row in rows.into_iter().take(limit) {
        let row: AddressRow = serde_json::from_value(row)
            .map_err(|e| Error::malformed(format!("Invalid address row: {}", e)))?;
        let balance = row.balance.to_sats().ok_or_else(|| {
            Error::malformed(format!("Unparseable balance for {}", row.address))
        })?;
        holders.push((row.address, balance));
    }

    Ok(Snapshot::from_ordered(holders))
}

#[async_trait]
impl SnapshotSource for BlockchairSource {
    async fn fetch(&self, limit: usize) -> Result<Snapshot> {
        tracing::debug!("Fetching top {} addresses from {}", limit, self.url);
        let body = self.fetch_body(limit).await?;
        parse_addresses(&body, limit)
    }

    fn source_name(&self) -> &'static str {
        "blockchair"
    }
}

/// Factory for creating Blockchair sources
pub struct BlockchairFactory;

impl SnapshotSourceFactory for BlockchairFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn SnapshotSource>> {
        match config {
            SourceConfig::Blockchair { api_key, url } => Ok(Box::new(BlockchairSource::new(
                url.clone(),
                api_key.clone(),
            ))),
            _ => Err(Error::config("Invalid config for Blockchair source")),
        }
    }
}

/// Register the Blockchair source with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_source("blockchair", Box::new(BlockchairFactory));
}
