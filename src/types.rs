//! Types for the market snapshot service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One listing row, already flattened out of the upstream quote object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Display name
    pub name: String,

    /// Ticker symbol
    pub symbol: String,

    /// Current price in USD
    pub price_usd: f64,

    /// Market capitalisation in USD
    pub market_cap_usd: f64,

    /// Traded volume over the last 24h in USD
    pub volume_24h_usd: f64,

    /// Price change over the last 24h, in percent
    pub percent_change_24h: f64,
}

impl AssetRecord {
    /// Create a new asset record
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        price_usd: f64,
        market_cap_usd: f64,
        volume_24h_usd: f64,
        percent_change_24h: f64,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            price_usd,
            market_cap_usd,
            volume_24h_usd,
            percent_change_24h,
        }
    }
}

/// An asset name paired with its market cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAsset {
    pub name: String,
    pub market_cap_usd: f64,
}

/// An asset name paired with its 24h change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMover {
    pub name: String,
    pub symbol: String,
    pub percent_change_24h: f64,
}

impl From<&AssetRecord> for PriceMover {
    fn from(record: &AssetRecord) -> Self {
        Self {
            name: record.name.clone(),
            symbol: record.symbol.clone(),
            percent_change_24h: record.percent_change_24h,
        }
    }
}

/// Summary statistics for one non-empty batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Largest assets by market cap, descending
    pub top_by_market_cap: Vec<RankedAsset>,

    /// Mean price across the batch
    pub average_price: f64,

    /// Biggest 24h gainer
    pub highest_24h_change: PriceMover,

    /// Biggest 24h loser
    pub lowest_24h_change: PriceMover,

    /// Number of records analysed
    pub asset_count: usize,

    /// When the report was computed
    pub generated_at: DateTime<Utc>,
}

/// Result of analysing a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Analysis {
    /// The batch was empty, nothing to report
    Unavailable,
    /// Statistics for a non-empty batch
    Report(AnalysisReport),
}

impl Analysis {
    /// Returns the report, if one is available
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Analysis::Report(report) => Some(report),
            Analysis::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Analysis::Report(_))
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Analysis Report ({} assets, {})",
            self.asset_count,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Top {} by Market Cap:", self.top_by_market_cap.len())?;
        for (rank, asset) in self.top_by_market_cap.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {:<20} ${:.0}",
                rank + 1,
                asset.name,
                asset.market_cap_usd
            )?;
        }
        writeln!(f, "Average Price: ${:.2}", self.average_price)?;
        writeln!(
            f,
            "Highest 24h Change: {} ({}) {:+.2}%",
            self.highest_24h_change.name,
            self.highest_24h_change.symbol,
            self.highest_24h_change.percent_change_24h
        )?;
        write!(
            f,
            "Lowest 24h Change: {} ({}) {:+.2}%",
            self.lowest_24h_change.name,
            self.lowest_24h_change.symbol,
            self.lowest_24h_change.percent_change_24h
        )
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analysis::Report(report) => report.fmt(f),
            Analysis::Unavailable => write!(f, "No data available for analysis."),
        }
    }
}
