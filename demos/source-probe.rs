// # Snapshot Source Probe
//
// Fetches one snapshot from a real source and prints it. Nothing is stored
// and nothing is sent, so it is safe to run against production endpoints
// when checking that a page layout or API response still parses.
//
// ## Usage
//
// ```bash
// # bitinfocharts page (default)
// cargo run -p holdwatch-demos --bin source_probe
//
// # Blockchair API, first 20 rows
// PROBE_SOURCE=blockchair PROBE_LIMIT=20 cargo run -p holdwatch-demos --bin source_probe
// ```
//
// ## Environment Variables
//
// - `PROBE_SOURCE`: bitinfocharts (default) or blockchair
// - `PROBE_URL`: Override the source URL
// - `PROBE_LIMIT`: Number of rows to request (default 100)
// - `BLOCKCHAIR_API_KEY`: Optional Blockchair API key

use holdwatch_core::traits::SnapshotSource;
use holdwatch_source_bitinfocharts::BitinfochartsSource;
use holdwatch_source_blockchair::BlockchairSource;
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let kind = env::var("PROBE_SOURCE").unwrap_or_else(|_| "bitinfocharts".to_string());
    let url = env::var("PROBE_URL").ok().filter(|u| !u.is_empty());
    let limit = match env::var("PROBE_LIMIT") {
        Ok(raw) => match raw.parse::<usize>() {
            Ok(limit) if limit > 0 => limit,
            _ => {
                tracing::error!("PROBE_LIMIT must be a positive integer, got {:?}", raw);
                return ExitCode::from(1);
            }
        },
        Err(_) => 100,
    };

    let source: Box<dyn SnapshotSource> = match kind.as_str() {
        "bitinfocharts" => Box::new(match url {
            Some(url) => BitinfochartsSource::with_url(url),
            None => BitinfochartsSource::new(),
        }),
        "blockchair" => Box::new(BlockchairSource::new(
            url,
            env::var("BLOCKCHAIR_API_KEY").ok(),
        )),
        other => {
            tracing::error!("Unknown PROBE_SOURCE {:?}", other);
            return ExitCode::from(1);
        }
    };

    tracing::info!("Probing {} (limit {})", source.source_name(), limit);

    let snapshot = match source.fetch(limit).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("Fetch failed: {}", e);
            return ExitCode::from(2);
        }
    };

    let snapshot = match snapshot.validate(limit) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("Snapshot rejected: {}", e);
            return ExitCode::from(2);
        }
    };

    for entry in snapshot.entries() {
        println!(
            "{:>4}  {:<64}  {} BTC",
            entry.rank,
            entry.address,
            entry.balance_units(8)
        );
    }
    tracing::info!("{} rows parsed", snapshot.len());

    ExitCode::SUCCESS
}
