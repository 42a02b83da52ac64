//! # Crypto Market Snapshot
//!
//! Polls a market-data API for the top 50 cryptocurrencies, reports a few
//! summary statistics and keeps the latest listing batch in a spreadsheet.
//!
//! ## Usage
//!
//! ```no_run
//! use crypto_market_snapshot::{analyze, Analysis, SheetWriter};
//! use crypto_market_snapshot::provider::fetch_batch;
//! use crypto_market_snapshot::providers::CoinMarketCapProvider;
//! use crypto_market_snapshot::metrics::FetchMetrics;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = CoinMarketCapProvider::new("your-api-key")?;
//! let mut metrics = FetchMetrics::new();
//!
//! // Failures come back as an empty batch
//! let batch = fetch_batch(&provider, &mut metrics).await;
//!
//! match analyze(&batch) {
//!     Analysis::Report(report) => println!("{report}"),
//!     Analysis::Unavailable => println!("No data available for analysis."),
//! }
//!
//! SheetWriter::new("crypto_data.xlsx").write_snapshot(&batch)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SnapshotTracker::run()
//!     ↓
//! ListingProvider (CoinMarketCap)  →  empty batch on failure
//!     ↓
//! analyze()  →  report logged
//!     ↓
//! SheetWriter (first sheet of an .xlsx, fully replaced)
//!     ↓
//! sleep(interval)
//! ```
//!
//! ## Error Handling
//!
//! Fetch failures never leave the fetcher: they are logged and turn into an
//! empty batch, which the analyzer reports as [`Analysis::Unavailable`].
//! A [`PersistenceError`] is the only error that stops the loop.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod sheet;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use analysis::analyze;
pub use config::Config;
pub use error::{ConfigError, PersistenceError, ProviderError};
pub use sheet::SheetWriter;
pub use tracker::{CycleOutcome, SnapshotTracker};
pub use types::{Analysis, AnalysisReport, AssetRecord, PriceMover, RankedAsset};
