// # holdwatchd - Top-holders monitor daemon
//
// The holdwatchd daemon is a thin integration layer. It is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering snapshot sources, notifiers and stores
// 4. Running the monitor engine until SIGTERM/SIGINT
//
// All comparison, notification and persistence logic lives in holdwatch-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Source
// - `HOLDWATCH_SOURCE_TYPE`: bitinfocharts (default) or blockchair
// - `HOLDWATCH_SOURCE_URL`: Override the source URL
// - `HOLDWATCH_BLOCKCHAIR_API_KEY`: Optional Blockchair API key
//
// ### Notifier
// - `HOLDWATCH_NOTIFIER_TYPE`: telegram (default) or log
// - `HOLDWATCH_TELEGRAM_BOT_TOKEN`: Bot API token
// - `HOLDWATCH_TELEGRAM_CHAT_ID`: Target chat
//
// ### Store
// - `HOLDWATCH_STORE_TYPE`: sqlite (default), file or memory
// - `HOLDWATCH_STORE_PATH`: Database or snapshot file path (default ./monitor.db)
//
// ### Monitor
// - `HOLDWATCH_POLL_INTERVAL_SECS`: Delay between cycles (default 300)
// - `HOLDWATCH_LIMIT`: Number of holders tracked (default 100)
// - `HOLDWATCH_BALANCE_THRESHOLD_SATS`: Minimum reported balance movement (default 1000000)
// - `HOLDWATCH_IO_TIMEOUT_SECS`: Bound for every network/storage call (default 30)
// - `HOLDWATCH_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export HOLDWATCH_TELEGRAM_BOT_TOKEN=123456:ABC...
// export HOLDWATCH_TELEGRAM_CHAT_ID=-1001234567890
// export HOLDWATCH_STORE_PATH=/var/lib/holdwatch/monitor.db
//
// holdwatchd
// ```

mod config;

use anyhow::Result;
use config::Config;
use holdwatch_core::{ComponentRegistry, MonitorEngine};
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum HoldwatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<HoldwatchExitCode> for ExitCode {
    fn from(code: HoldwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HoldwatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return HoldwatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HoldwatchExitCode::ConfigError.into();
    }

    info!("Starting holdwatchd {}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HoldwatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => HoldwatchExitCode::CleanShutdown,
            Err(e) if is_config_error(&e) => {
                error!("Startup error: {}", e);
                HoldwatchExitCode::ConfigError
            }
            Err(e) => {
                error!("Daemon error: {}", e);
                HoldwatchExitCode::RuntimeError
            }
        }
    });

    result.into()
}

fn is_config_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<holdwatch_core::Error>(),
        Some(holdwatch_core::Error::Config(_))
    )
}

/// Build the registry with every component compiled into this binary
fn build_registry() -> ComponentRegistry {
    let registry = ComponentRegistry::with_builtins();

    #[cfg(feature = "bitinfocharts")]
    holdwatch_source_bitinfocharts::register(&registry);

    #[cfg(feature = "blockchair")]
    holdwatch_source_blockchair::register(&registry);

    #[cfg(feature = "telegram")]
    holdwatch_notifier_telegram::register(&registry);

    debug!(
        "Registered sources={:?} notifiers={:?} stores={:?}",
        registry.list_sources(),
        registry.list_notifiers(),
        registry.list_stores()
    );
    registry
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let registry = build_registry();
    let monitor_config = config.to_monitor_config();
    monitor_config.validate()?;

    let source = registry.create_source(&monitor_config.source)?;
    let notifier = registry.create_notifier(&monitor_config.notifier)?;
    let store = registry.create_store(&monitor_config.store)?;

    info!("Source: {}", source.source_name());
    info!("Notifier: {}", notifier.notifier_name());
    info!("Store: {} ({})", config.store_type, config.store_path);

    let (engine, mut event_rx) = MonitorEngine::new(source, notifier, store, monitor_config)?;

    let events = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signals = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Signal handling failed, shutting down: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    let result = engine.run_with_shutdown(Some(shutdown_rx)).await;

    // Closing the engine closes the event channel
    drop(engine);
    signals.abort();
    let _ = events.await;

    result?;
    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
