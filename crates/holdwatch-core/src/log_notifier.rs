//! Notifier that writes messages to the log
//!
//! Selected with `type = "log"`. Useful for dry runs and when embedding the
//! engine in a process that already ships its logs somewhere.

use async_trait::async_trait;

use crate::config::NotifierConfig;
use crate::traits::{Notifier, NotifierFactory};
use crate::{Error, Result};

/// Notifier that emits every message through `tracing::info!`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        for line in message.lines() {
            tracing::info!(target: "holdwatch::notify", "{}", line);
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "log"
    }
}

/// Factory for the `log` notifier type
pub struct LogNotifierFactory;

impl NotifierFactory for LogNotifierFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        match config {
            NotifierConfig::Log => Ok(Box::new(LogNotifier::new())),
            _ => Err(Error::config("Invalid config for log notifier")),
        }
    }
}
