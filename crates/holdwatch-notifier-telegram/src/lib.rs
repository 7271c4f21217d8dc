// # Telegram Notifier
//
// This crate provides a Notifier that posts change reports to a Telegram
// chat through the Bot API.
//
// ## Behavior
//
// - ✅ One `sendMessage` call per chunk (a report longer than 4096 characters
//   is split on line boundaries)
// - ✅ HTTP timeout configured (15 seconds)
// - ✅ Telegram `description` surfaced in delivery errors
// - ❌ NO retry logic (a failed report is dropped; the engine moves on)
// - ❌ NO message queue
//
// ## Security Requirements
//
// - Bot token NEVER appears in logs, errors or Debug output
// - Bot token MUST be provided via environment variables only
//
// ## API Reference
//
// ```http
// POST /bot<token>/sendMessage
// Content-Type: application/json
//
// {"chat_id": "<chat>", "text": "<message>"}
// ```

use async_trait::async_trait;
use holdwatch_core::config::NotifierConfig;
use holdwatch_core::traits::{Notifier, NotifierFactory};
use holdwatch_core::{ComponentRegistry, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for API requests (15 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest text accepted by `sendMessage`
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API notifier
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the bot token.
pub struct TelegramNotifier {
    /// Bot API token
    /// ⚠️ NEVER log this value
    bot_token: String,

    /// Target chat
    chat_id: String,

    /// API base URL
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramNotifier {
    /// Create a notifier for the public Bot API
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::with_api_base(TELEGRAM_API_BASE, bot_token, chat_id)
    }

    /// Create a notifier for a self-hosted Bot API server
    pub fn with_api_base(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn send_chunk(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        let response = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            // The URL carries the token
            .map_err(|e| Error::delivery(format!("Telegram request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let api: Option<ApiResponse> = serde_json::from_str(&body).ok();

        if status.is_success() && api.as_ref().is_some_and(|r| r.ok) {
            return Ok(());
        }

        let description = api
            .and_then(|r| r.description)
            .unwrap_or_else(|| "no description".to_string());
        Err(match status.as_u16() {
            401 | 404 => Error::delivery(format!(
                "Telegram rejected the bot token. Status: {}",
                status
            )),
            429 => Error::delivery(format!("Telegram rate limit exceeded: {}", description)),
            _ => Error::delivery(format!("Telegram error {}: {}", status, description)),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        let chunks = split_message(message, MAX_MESSAGE_CHARS);
        tracing::debug!(
            "Sending Telegram message to {} ({} chunks)",
            self.chat_id,
            chunks.len()
        );

        for chunk in &chunks {
            self.send_chunk(chunk).await?;
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "telegram"
    }
}

/// Split a message into chunks of at most `max_chars` characters
///
/// Splits on line boundaries; a single line longer than `max_chars` is
/// split mid-line.
pub fn split_message(message: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    // Counted separately from `current` so blank lines are kept
    let mut current_lines = 0;

    for line in message.split('\n') {
        let line_len = line.chars().count();
        let separator = usize::from(current_lines > 0);

        if current_len + separator + line_len <= max_chars {
            if separator == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += separator + line_len;
            current_lines += 1;
            continue;
        }

        if current_lines > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
            current_lines = 0;
        }

        if line_len <= max_chars {
            current.push_str(line);
            current_len = line_len;
            current_lines = 1;
        } else {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
        }
    }

    if current_lines > 0 || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Factory for creating Telegram notifiers
pub struct TelegramFactory;

impl NotifierFactory for TelegramFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        match config {
            NotifierConfig::Telegram { bot_token, chat_id } => {
                if bot_token.is_empty() {
                    return Err(Error::config("Telegram bot token is required"));
                }
                if chat_id.is_empty() {
                    return Err(Error::config("Telegram chat ID is required"));
                }
                Ok(Box::new(TelegramNotifier::new(bot_token.clone(), chat_id.clone())))
            }
            _ => Err(Error::config("Invalid config for Telegram notifier")),
        }
    }
}

/// Register the Telegram notifier with a registry
///
/// # Example
///
/// ```rust
/// use holdwatch_core::ComponentRegistry;
///
/// let registry = ComponentRegistry::new();
/// holdwatch_notifier_telegram::register(&registry);
/// assert!(registry.has_notifier("telegram"));
/// ```
pub fn register(registry: &ComponentRegistry) {
    registry.register_notifier("telegram", Box::new(TelegramFactory));
}
