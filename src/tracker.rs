//! Snapshot loop controller
//!
//! Drives the fetch → analyze → report → persist → sleep cycle. Cycles run
//! strictly one after another; the next fetch never starts before the
//! previous cycle's sleep has finished.

use crate::{
    analysis::analyze,
    config::Config,
    error::{PersistenceError, ProviderError},
    metrics::{FetchMetrics, FetchSummary},
    provider::{fetch_batch, ListingProvider},
    providers::CoinMarketCapProvider,
    sheet::SheetWriter,
    types::{Analysis, AssetRecord},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// What a single cycle did
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Number of records fetched
    pub records: usize,
    /// Analysis of the fetched batch
    pub analysis: Analysis,
    /// Whether the snapshot file was rewritten
    pub persisted: bool,
}

/// Periodically snapshots the top listings into a spreadsheet
///
/// # Example
/// ```no_run
/// use crypto_market_snapshot::{SnapshotTracker, Config};
/// use clap::Parser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::parse();
/// let tracker = SnapshotTracker::from_config(&config)?;
/// tracker.run(async { tokio::signal::ctrl_c().await.ok(); }).await?;
/// # Ok(())
/// # }
/// ```
pub struct SnapshotTracker {
    provider: Arc<dyn ListingProvider>,
    writer: SheetWriter,
    interval: Duration,
    max_backoff: Option<Duration>,
    metrics: FetchMetrics,
    consecutive_failures: u32,
}

impl SnapshotTracker {
    /// Creates a tracker with a custom provider
    ///
    /// This is primarily for testing with mock providers.
    pub fn new(provider: Arc<dyn ListingProvider>, writer: SheetWriter, interval: Duration) -> Self {
        Self {
            provider,
            writer,
            interval,
            max_backoff: None,
            metrics: FetchMetrics::new(),
            consecutive_failures: 0,
        }
    }

    /// Creates a CoinMarketCap-backed tracker from the runtime configuration
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let provider = CoinMarketCapProvider::with_options(
            &config.api_key,
            &config.api_url,
            config.timeout(),
        )?;

        Ok(Self::new(
            Arc::new(provider),
            SheetWriter::new(&config.output),
            config.interval(),
        )
        .with_backoff(config.max_backoff()))
    }

    /// Enables doubling the delay after consecutive failed fetches, up to `max`
    pub fn with_backoff(mut self, max: Option<Duration>) -> Self {
        self.max_backoff = max;
        self
    }

    /// Returns the name of the current provider
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Gets fetch metrics including latency percentiles and success rate
    pub fn fetch_metrics(&self) -> FetchSummary {
        self.metrics.summary()
    }

    /// Runs one fetch → analyze → report → persist cycle
    ///
    /// An empty batch is reported as unavailable and leaves the existing
    /// snapshot in place. Only persistence failures are returned.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, PersistenceError> {
        tracing::info!(provider = self.provider_name(), "Fetching cryptocurrency data");

        let records = fetch_batch(self.provider.as_ref(), &mut self.metrics).await;
        if records.is_empty() {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        } else {
            self.consecutive_failures = 0;
        }

        let analysis = analyze(&records);
        match &analysis {
            Analysis::Report(report) => tracing::info!("\n{report}"),
            Analysis::Unavailable => tracing::warn!(
                consecutive_failures = self.consecutive_failures,
                "No data available for analysis"
            ),
        }

        let count = records.len();
        let persisted = if records.is_empty() {
            tracing::info!(
                path = %self.writer.path().display(),
                "Keeping previous snapshot"
            );
            false
        } else {
            self.persist(records).await?;
            tracing::info!(
                path = %self.writer.path().display(),
                rows = count,
                "Spreadsheet updated"
            );
            true
        };

        let summary = self.metrics.summary();
        tracing::debug!(
            total_requests = summary.total_requests,
            failed_requests = summary.failed_requests,
            success_rate = summary.success_rate,
            latency_p50_ms = summary.latency_p50_ms,
            latency_p99_ms = summary.latency_p99_ms,
            "Fetch metrics"
        );

        Ok(CycleOutcome {
            records: count,
            analysis,
            persisted,
        })
    }

    /// Writes the batch on the blocking pool and waits for it
    async fn persist(&self, records: Vec<AssetRecord>) -> Result<(), PersistenceError> {
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || writer.write_snapshot(&records))
            .await
            .map_err(|e| PersistenceError::Task(e.to_string()))?
    }

    /// Delay before the next cycle
    ///
    /// Always the configured interval unless backoff is enabled and the last
    /// fetches failed, in which case it doubles per failure up to the cap.
    pub fn next_delay(&self) -> Duration {
        match self.max_backoff {
            Some(max) if self.consecutive_failures > 0 => {
                let factor = 1u32 << self.consecutive_failures.min(16);
                self.interval.saturating_mul(factor).min(max)
            }
            _ => self.interval,
        }
    }

    /// Runs cycles until `shutdown` resolves or persistence fails
    ///
    /// `shutdown` is only observed between cycles, so a started cycle always
    /// completes.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), PersistenceError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            path = %self.writer.path().display(),
            backoff = self.max_backoff.is_some(),
            "Starting market snapshot loop"
        );

        tokio::pin!(shutdown);

        loop {
            self.run_cycle().await?;

            let delay = self.next_delay();
            tracing::info!(delay_secs = delay.as_secs(), "Waiting before the next update");

            tokio::select! {
                _ = sleep(delay) => {}
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping snapshot loop");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;
    use std::fs;
    use tempfile::TempDir;

    fn batch(n: usize) -> Vec<AssetRecord> {
        (0..n)
            .map(|i| {
                let i = i as f64;
                AssetRecord::new(format!("Coin {i}"), format!("C{i}"), 10.0 + i, 100.0 * (i + 1.0), 1.0, i - 2.0)
            })
            .collect()
    }

    fn tracker(provider: &MockProvider, dir: &TempDir) -> SnapshotTracker {
        SnapshotTracker::new(
            Arc::new(provider.clone()),
            SheetWriter::new(dir.path().join("snapshot.xlsx")),
            Duration::from_secs(60),
        )
    }

    fn snapshot_rows(dir: &TempDir) -> u32 {
        let book = umya_spreadsheet::reader::xlsx::read(dir.path().join("snapshot.xlsx")).unwrap();
        book.get_sheet(&0).unwrap().get_highest_row()
    }

    #[tokio::test]
    async fn test_cycle_writes_snapshot() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::new();
        provider.push_batch(batch(4));

        let mut tracker = tracker(&provider, &dir);
        let outcome = tracker.run_cycle().await.unwrap();

        assert_eq!(outcome.records, 4);
        assert!(outcome.persisted);
        let report = outcome.analysis.report().unwrap();
        assert_eq!(report.top_by_market_cap[0].name, "Coin 3");
        assert_eq!(snapshot_rows(&dir), 5);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_snapshot_and_loop_continues() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::new();
        provider.push_batch(batch(3));
        provider.push_error(ProviderError::Timeout);
        provider.push_batch(batch(2));

        let mut tracker = tracker(&provider, &dir);

        assert!(tracker.run_cycle().await.unwrap().persisted);
        let before = fs::read(dir.path().join("snapshot.xlsx")).unwrap();

        let outcome = tracker.run_cycle().await.unwrap();
        assert_eq!(outcome.records, 0);
        assert_eq!(outcome.analysis, Analysis::Unavailable);
        assert!(!outcome.persisted);
        assert_eq!(fs::read(dir.path().join("snapshot.xlsx")).unwrap(), before);

        let outcome = tracker.run_cycle().await.unwrap();
        assert!(outcome.persisted);
        assert_eq!(snapshot_rows(&dir), 3);
        assert_eq!(provider.call_count(), 3);

        let metrics = tracker.fetch_metrics();
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("snapshot.xlsx"), "garbage").unwrap();
        let provider = MockProvider::new();
        provider.push_batch(batch(2));

        let result = tracker(&provider, &dir).run_cycle().await;

        assert!(matches!(result, Err(PersistenceError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::new();
        provider.push_batch(batch(2));

        tracker(&provider, &dir).run(async {}).await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(snapshot_rows(&dir), 3);
    }

    #[tokio::test]
    async fn test_run_returns_persistence_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("snapshot.xlsx"), "garbage").unwrap();
        let provider = MockProvider::new();
        provider.push_batch(batch(2));

        let result = tracker(&provider, &dir)
            .run(std::future::pending::<()>())
            .await;

        assert!(matches!(result, Err(PersistenceError::Corrupt { .. })));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_next_delay_backoff() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::new();
        for _ in 0..10 {
            provider.push_error(ProviderError::RateLimitExceeded);
        }

        let mut plain = tracker(&provider, &dir);
        plain.run_cycle().await.unwrap();
        assert_eq!(plain.next_delay(), Duration::from_secs(60));

        let mut backing_off =
            tracker(&provider, &dir).with_backoff(Some(Duration::from_secs(300)));
        assert_eq!(backing_off.next_delay(), Duration::from_secs(60));
        backing_off.run_cycle().await.unwrap();
        assert_eq!(backing_off.next_delay(), Duration::from_secs(120));
        backing_off.run_cycle().await.unwrap();
        assert_eq!(backing_off.next_delay(), Duration::from_secs(240));
        backing_off.run_cycle().await.unwrap();
        assert_eq!(backing_off.next_delay(), Duration::from_secs(300));

        provider.push_batch(batch(1));
        // Drain the queued errors first
        while backing_off.run_cycle().await.unwrap().records == 0 {}
        assert_eq!(backing_off.next_delay(), Duration::from_secs(60));
    }
}
