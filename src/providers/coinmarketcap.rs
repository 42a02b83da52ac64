//! CoinMarketCap listings provider implementation

use crate::{
    constants::{
        COINMARKETCAP_API_KEY_HEADER, COINMARKETCAP_API_URL, COINMARKETCAP_LISTINGS_ENDPOINT,
        CONVERT_CURRENCY, LISTING_LIMIT, LISTING_START, REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::ProviderError,
    provider::ListingProvider,
    types::AssetRecord,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinMarketCap response for the latest listings
#[derive(Debug, Deserialize)]
struct ListingsResponse {
    data: Vec<ListingEntry>,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    symbol: String,
    quote: HashMap<String, QuoteData>,
}

/// Quote fields may be null upstream, so every one is optional on the wire
#[derive(Debug, Deserialize)]
struct QuoteData {
    price: Option<f64>,
    market_cap: Option<f64>,
    volume_24h: Option<f64>,
    percent_change_24h: Option<f64>,
}

/// Envelope CoinMarketCap puts around error responses
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: ApiStatus,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    error_code: Option<i64>,
    error_message: Option<String>,
}

/// CoinMarketCap listings provider
pub struct CoinMarketCapProvider {
    client: Client,
    base_url: String,
}

impl CoinMarketCapProvider {
    /// Creates a provider against the public API with the default timeout
    pub fn new(api_key: &str) -> Result<Self, ProviderError> {
        Self::with_options(
            api_key,
            COINMARKETCAP_API_URL,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Creates a provider against `base_url` with a custom request timeout
    pub fn with_options(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|e| ProviderError::invalid_response(format!("Invalid API key: {e}")))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COINMARKETCAP_API_KEY_HEADER, api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the listings URL for ranks 1..=50 quoted in USD
    fn build_url(&self) -> String {
        format!(
            "{}{}?start={}&limit={}&convert={}",
            self.base_url,
            COINMARKETCAP_LISTINGS_ENDPOINT,
            LISTING_START,
            LISTING_LIMIT,
            CONVERT_CURRENCY
        )
    }
}

/// Decodes a listings payload into typed records
///
/// Every entry must carry a USD quote with all four figures; a single
/// incomplete entry fails the whole batch.
fn parse_listings(body: &str) -> Result<Vec<AssetRecord>, ProviderError> {
    let response: ListingsResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("Failed to parse CoinMarketCap response: {e}"))
    })?;

    response
        .data
        .into_iter()
        .map(ListingEntry::into_record)
        .collect()
}

impl ListingEntry {
    fn into_record(self) -> Result<AssetRecord, ProviderError> {
        let quote = self.quote.get(CONVERT_CURRENCY).ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "{} has no {} quote",
                self.symbol, CONVERT_CURRENCY
            ))
        })?;

        let field = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| {
                ProviderError::invalid_response(format!("{} quote is missing {}", self.symbol, name))
            })
        };

        let price_usd = field(quote.price, "price")?;
        let market_cap_usd = field(quote.market_cap, "market_cap")?;
        let volume_24h_usd = field(quote.volume_24h, "volume_24h")?;
        let percent_change_24h = field(quote.percent_change_24h, "percent_change_24h")?;

        Ok(AssetRecord {
            name: self.name,
            symbol: self.symbol,
            price_usd,
            market_cap_usd,
            volume_24h_usd,
            percent_change_24h,
        })
    }
}

/// Pulls the upstream error message out of an error body, if there is one
fn error_message(body: &str) -> Option<String> {
    let status = serde_json::from_str::<StatusResponse>(body).ok()?.status;
    match (status.error_code, status.error_message) {
        (Some(code), Some(message)) => Some(format!("{message} (code {code})")),
        (None, Some(message)) => Some(message),
        _ => None,
    }
}

#[async_trait]
impl ListingProvider for CoinMarketCapProvider {
    async fn fetch_listings(&self) -> Result<Vec<AssetRecord>, ProviderError> {
        let url = self.build_url();
        tracing::debug!(url = %url, "Fetching listings from CoinMarketCap");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();

        // Check for rate limiting
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        let body = response
            .text()
            .await
            .map_err(ProviderError::from_transport)?;

        if !status.is_success() {
            let detail = error_message(&body).unwrap_or(body);
            return Err(ProviderError::ApiError(format!("HTTP {status}: {detail}")));
        }

        let records = parse_listings(&body)?;

        tracing::debug!(
            count = records.len(),
            "Successfully fetched listings from CoinMarketCap"
        );

        Ok(records)
    }

    fn provider_name(&self) -> &'static str {
        "coinmarketcap"
    }
}
