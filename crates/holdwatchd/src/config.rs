//! Environment configuration for the daemon
//!
//! Every setting comes from a `HOLDWATCH_*` environment variable. Values are
//! read through a lookup function so tests never touch the process
//! environment.

use anyhow::Result;
use holdwatch_core::config::{MonitorConfig, MonitorSettings, NotifierConfig, SourceConfig, StoreConfig};
use std::str::FromStr;

const DEFAULT_STORE_PATH: &str = "./monitor.db";

/// Application configuration
pub struct Config {
    pub source_type: String,
    pub source_url: Option<String>,
    pub blockchair_api_key: Option<String>,
    pub notifier_type: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub store_type: String,
    pub store_path: String,
    pub poll_interval_secs: u64,
    pub limit: usize,
    pub balance_threshold_sats: u64,
    pub io_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let settings = MonitorSettings::default();

        Ok(Self {
            source_type: var("HOLDWATCH_SOURCE_TYPE")
                .unwrap_or_else(|| "bitinfocharts".to_string()),
            source_url: var("HOLDWATCH_SOURCE_URL"),
            blockchair_api_key: var("HOLDWATCH_BLOCKCHAIR_API_KEY"),
            notifier_type: var("HOLDWATCH_NOTIFIER_TYPE").unwrap_or_else(|| "telegram".to_string()),
            telegram_bot_token: var("HOLDWATCH_TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: var("HOLDWATCH_TELEGRAM_CHAT_ID"),
            store_type: var("HOLDWATCH_STORE_TYPE").unwrap_or_else(|| "sqlite".to_string()),
            store_path: var("HOLDWATCH_STORE_PATH").unwrap_or_else(|| DEFAULT_STORE_PATH.to_string()),
            poll_interval_secs: parse_or(&var, "HOLDWATCH_POLL_INTERVAL_SECS", settings.poll_interval_secs)?,
            limit: parse_or(&var, "HOLDWATCH_LIMIT", settings.limit)?,
            balance_threshold_sats: parse_or(
                &var,
                "HOLDWATCH_BALANCE_THRESHOLD_SATS",
                settings.balance_threshold_sats,
            )?,
            io_timeout_secs: parse_or(&var, "HOLDWATCH_IO_TIMEOUT_SECS", settings.io_timeout_secs)?,
            log_level: var("HOLDWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks type names, required credentials and numeric ranges. Fails
    /// fast so a misconfigured daemon never starts polling.
    pub fn validate(&self) -> Result<()> {
        match self.source_type.as_str() {
            "bitinfocharts" | "blockchair" => {}
            _ => anyhow::bail!(
                "HOLDWATCH_SOURCE_TYPE '{}' is not supported. \
                Supported sources: bitinfocharts, blockchair",
                self.source_type
            ),
        }

        if let Some(url) = &self.source_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!(
                "HOLDWATCH_SOURCE_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }

        match self.notifier_type.as_str() {
            "telegram" => {
                let token = self.telegram_bot_token.as_deref().unwrap_or_default();
                if token.is_empty() {
                    anyhow::bail!(
                        "HOLDWATCH_TELEGRAM_BOT_TOKEN is required when HOLDWATCH_NOTIFIER_TYPE=telegram. \
                        Set it via: export HOLDWATCH_TELEGRAM_BOT_TOKEN=123456:ABC..."
                    );
                }

                // Bot tokens look like "<bot id>:<secret>"
                let token_lower = token.to_lowercase();
                if !token.contains(':')
                    || token_lower.contains("your_token")
                    || token_lower.contains("replace_me")
                {
                    anyhow::bail!(
                        "HOLDWATCH_TELEGRAM_BOT_TOKEN does not look like a bot token. \
                        Use the token issued by @BotFather."
                    );
                }

                if self.telegram_chat_id.is_none() {
                    anyhow::bail!(
                        "HOLDWATCH_TELEGRAM_CHAT_ID is required when HOLDWATCH_NOTIFIER_TYPE=telegram"
                    );
                }
            }
            "log" => {}
            _ => anyhow::bail!(
                "HOLDWATCH_NOTIFIER_TYPE '{}' is not supported. \
                Supported notifiers: telegram, log",
                self.notifier_type
            ),
        }

        match self.store_type.as_str() {
            "sqlite" | "file" | "memory" => {}
            _ => anyhow::bail!(
                "HOLDWATCH_STORE_TYPE '{}' is not supported. \
                Supported types: sqlite, file, memory",
                self.store_type
            ),
        }

        if !(10..=86_400).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "HOLDWATCH_POLL_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        if !(1..=1000).contains(&self.limit) {
            anyhow::bail!("HOLDWATCH_LIMIT must be between 1 and 1000. Got: {}", self.limit);
        }

        if !(1..=300).contains(&self.io_timeout_secs) {
            anyhow::bail!(
                "HOLDWATCH_IO_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.io_timeout_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "HOLDWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the core monitor configuration
    pub fn to_monitor_config(&self) -> MonitorConfig {
        let source = match self.source_type.as_str() {
            "blockchair" => SourceConfig::Blockchair {
                api_key: self.blockchair_api_key.clone(),
                url: self.source_url.clone(),
            },
            _ => SourceConfig::Bitinfocharts {
                url: self.source_url.clone(),
            },
        };

        let notifier = match self.notifier_type.as_str() {
            "telegram" => NotifierConfig::Telegram {
                bot_token: self.telegram_bot_token.clone().unwrap_or_default(),
                chat_id: self.telegram_chat_id.clone().unwrap_or_default(),
            },
            _ => NotifierConfig::Log,
        };

        let store = match self.store_type.as_str() {
            "sqlite" => StoreConfig::Sqlite {
                path: self.store_path.clone(),
            },
            "file" => StoreConfig::File {
                path: self.store_path.clone(),
            },
            _ => StoreConfig::Memory,
        };

        MonitorConfig {
            source,
            notifier,
            store,
            monitor: MonitorSettings {
                poll_interval_secs: self.poll_interval_secs,
                limit: self.limit,
                balance_threshold_sats: self.balance_threshold_sats,
                io_timeout_secs: self.io_timeout_secs,
                ..MonitorSettings::default()
            },
        }
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a number. Got '{}': {}", key, value, e)),
        None => Ok(default),
    }
}
