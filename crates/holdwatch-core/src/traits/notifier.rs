// # Notifier Trait
//
// Defines the interface for delivering change reports to an operator.
//
// ## Implementations
//
// - Telegram: `holdwatch-notifier-telegram` crate
// - Log: [`crate::LogNotifier`] (built in)

use async_trait::async_trait;

/// Trait for notifier implementations
///
/// Delivery is best-effort. The engine sends at most one change report per
/// cycle and never lets a delivery failure block persistence or the next
/// cycle.
///
/// # Trust Level: Untrusted
///
/// ## Forbidden Capabilities
/// - ❌ Retry or queue messages (a failed message is dropped)
/// - ❌ Decide whether a message is worth sending (owned by `MonitorEngine`)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one message
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The transport accepted the message
    /// - `Err(Error::Delivery)`: If the message could not be delivered
    async fn send(&self, message: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}

/// Helper trait for constructing notifiers from configuration
pub trait NotifierFactory: Send + Sync {
    /// Create a Notifier instance from configuration
    fn create(
        &self,
        config: &crate::config::NotifierConfig,
    ) -> Result<Box<dyn Notifier>, crate::Error>;
}
