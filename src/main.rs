use clap::Parser;
use crypto_market_snapshot::{Config, SnapshotTracker};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Log to stdout; override with RUST_LOG=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }
    tracing::debug!(?config, "Loaded configuration");

    let tracker = match SnapshotTracker::from_config(&config) {
        Ok(tracker) => tracker,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create listing provider");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    match tracker.run(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Snapshot could not be persisted, exiting");
            ExitCode::FAILURE
        }
    }
}
