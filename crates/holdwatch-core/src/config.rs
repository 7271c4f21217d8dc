//! Configuration types for the holdwatch system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::units::MAX_DECIMALS;

/// Main monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Snapshot source configuration
    pub source: SourceConfig,

    /// Notifier configuration
    pub notifier: NotifierConfig,

    /// Snapshot store configuration
    pub store: StoreConfig,

    /// Optional loop settings
    #[serde(default)]
    pub monitor: MonitorSettings,
}

impl MonitorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.source.validate()?;
        self.notifier.validate()?;
        self.store.validate()?;
        self.monitor.validate()?;
        Ok(())
    }
}

/// Snapshot source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Scrape the bitinfocharts richest-addresses page
    Bitinfocharts {
        /// Page URL override
        #[serde(default)]
        url: Option<String>,
    },

    /// Query the Blockchair addresses API
    Blockchair {
        /// Optional API key (raises rate limits)
        #[serde(default)]
        api_key: Option<String>,
        /// API URL override
        #[serde(default)]
        url: Option<String>,
    },

    /// Custom snapshot source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Bitinfocharts { url } | SourceConfig::Blockchair { url, .. } => {
                if let Some(url) = url {
                    validate_url("source", url)?;
                }
                Ok(())
            }
            SourceConfig::Custom { factory, config } => {
                validate_custom("source", factory, config)
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::Bitinfocharts { .. } => "bitinfocharts",
            SourceConfig::Blockchair { .. } => "blockchair",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Bitinfocharts { url: None }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Telegram bot
    Telegram {
        /// Bot API token
        bot_token: String,
        /// Target chat ID (numeric ID or @channel name)
        chat_id: String,
    },

    /// Write messages to the log only
    #[default]
    Log,

    /// Custom notifier
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            NotifierConfig::Telegram { bot_token, chat_id } => {
                if bot_token.is_empty() {
                    return Err(crate::Error::config("Telegram bot token cannot be empty"));
                }
                if chat_id.is_empty() {
                    return Err(crate::Error::config("Telegram chat ID cannot be empty"));
                }
                Ok(())
            }
            NotifierConfig::Log => Ok(()),
            NotifierConfig::Custom { factory, config } => {
                validate_custom("notifier", factory, config)
            }
        }
    }

    /// Get the notifier type name
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Telegram { .. } => "telegram",
            NotifierConfig::Log => "log",
            NotifierConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Snapshot store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// SQLite database holding the current snapshot table
    Sqlite {
        /// Path to the database file
        path: String,
    },

    /// JSON file written with atomic rename
    File {
        /// Path to the snapshot file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// Custom snapshot store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Sqlite { path } | StoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Store path cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
            StoreConfig::Custom { factory, config } => validate_custom("store", factory, config),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Sqlite { .. } => "sqlite",
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// How amounts and the list are named in notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// What the list ranks, used in the message header
    #[serde(default = "default_entity")]
    pub entity: String,

    /// Main unit symbol
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Number of smallest units per main unit, as a power of ten
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            entity: default_entity(),
            unit: default_unit(),
            decimals: default_decimals(),
        }
    }
}

/// Monitor loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Delay between cycles, also used as the retry delay after a failure
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum number of holders tracked
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Minimum absolute balance movement (smallest units) worth reporting
    #[serde(default = "default_balance_threshold_sats")]
    pub balance_threshold_sats: u64,

    /// Upper bound for every source, notifier and store call
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Notification rendering
    #[serde(default)]
    pub display: DisplayConfig,
}

impl MonitorSettings {
    /// Validate the loop settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.limit == 0 {
            return Err(crate::Error::config("Holder limit must be > 0"));
        }
        if self.io_timeout_secs == 0 {
            return Err(crate::Error::config("I/O timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.display.decimals > MAX_DECIMALS {
            return Err(crate::Error::config(format!(
                "Display decimals must be <= {}",
                MAX_DECIMALS
            )));
        }
        Ok(())
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            limit: default_limit(),
            balance_threshold_sats: default_balance_threshold_sats(),
            io_timeout_secs: default_io_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            display: DisplayConfig::default(),
        }
    }
}

fn validate_url(component: &str, url: &str) -> Result<(), crate::Error> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} URL must use HTTP or HTTPS scheme. Got: {}",
            component, url
        )));
    }
    Ok(())
}

fn validate_custom(
    component: &str,
    factory: &str,
    config: &serde_json::Value,
) -> Result<(), crate::Error> {
    if factory.is_empty() {
        return Err(crate::Error::config(format!(
            "Custom {} factory cannot be empty",
            component
        )));
    }
    if config.is_null() {
        return Err(crate::Error::config(format!(
            "Custom {} config cannot be null",
            component
        )));
    }
    Ok(())
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_limit() -> usize {
    100
}

// 0.01 of the main unit at 8 decimals
fn default_balance_threshold_sats() -> u64 {
    1_000_000
}

fn default_io_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_entity() -> String {
    "BTC holders".to_string()
}

fn default_unit() -> String {
    "BTC".to_string()
}

fn default_decimals() -> u32 {
    8
}
