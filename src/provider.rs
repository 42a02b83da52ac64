//! Provider abstraction for fetching listings from external APIs

use crate::{error::ProviderError, metrics::FetchMetrics, types::AssetRecord};
use async_trait::async_trait;
use std::time::Instant;

/// Trait for listing providers
///
/// Implementations fetch the current top listings from a market-data API
/// and return them as typed records, in the order the API ranks them.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Fetches the current listings in a single request
    ///
    /// # Returns
    /// The listing batch or an error if the request or decoding fails
    async fn fetch_listings(&self) -> Result<Vec<AssetRecord>, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Fetches one batch, collapsing any failure into an empty batch
///
/// Failures are logged here and never propagate further. There is no retry.
/// The outcome and latency of the call are recorded in `metrics`.
pub async fn fetch_batch(
    provider: &dyn ListingProvider,
    metrics: &mut FetchMetrics,
) -> Vec<AssetRecord> {
    let start = Instant::now();

    match provider.fetch_listings().await {
        Ok(records) => {
            metrics.record(start.elapsed(), true);
            tracing::debug!(
                count = records.len(),
                provider = provider.provider_name(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Fetched listings"
            );
            records
        }
        Err(e) => {
            metrics.record(start.elapsed(), false);
            tracing::warn!(
                provider = provider.provider_name(),
                error = %e,
                "Failed to fetch listings"
            );
            Vec::new()
        }
    }
}
