//! Summary statistics over a fetched batch
//!
//! Everything here is a pure function of its input.

use crate::{
    constants::TOP_BY_MARKET_CAP,
    types::{Analysis, AnalysisReport, AssetRecord, PriceMover, RankedAsset},
};
use chrono::Utc;

/// Analyses a batch of listings
///
/// Returns [`Analysis::Unavailable`] for an empty batch instead of a report
/// with undefined fields.
pub fn analyze(records: &[AssetRecord]) -> Analysis {
    let (Some(highest), Some(lowest)) = (highest_change(records), lowest_change(records)) else {
        return Analysis::Unavailable;
    };

    Analysis::Report(AnalysisReport {
        top_by_market_cap: top_by_market_cap(records, TOP_BY_MARKET_CAP),
        average_price: average_price(records).unwrap_or_default(),
        highest_24h_change: PriceMover::from(highest),
        lowest_24h_change: PriceMover::from(lowest),
        asset_count: records.len(),
        generated_at: Utc::now(),
    })
}

/// Returns up to `n` assets ordered by market cap, largest first
///
/// The sort is stable, so equal market caps keep their input order.
pub fn top_by_market_cap(records: &[AssetRecord], n: usize) -> Vec<RankedAsset> {
    let mut ranked: Vec<&AssetRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.market_cap_usd.total_cmp(&a.market_cap_usd));

    ranked
        .into_iter()
        .take(n)
        .map(|r| RankedAsset {
            name: r.name.clone(),
            market_cap_usd: r.market_cap_usd,
        })
        .collect()
}

/// Arithmetic mean of `price_usd`, `None` for an empty batch
pub fn average_price(records: &[AssetRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }

    let total: f64 = records.iter().map(|r| r.price_usd).sum();
    Some(total / records.len() as f64)
}

/// Record with the largest 24h change; the first one wins ties
pub fn highest_change(records: &[AssetRecord]) -> Option<&AssetRecord> {
    records.iter().reduce(|best, r| {
        if r.percent_change_24h > best.percent_change_24h {
            r
        } else {
            best
        }
    })
}

/// Record with the smallest 24h change; the first one wins ties
pub fn lowest_change(records: &[AssetRecord]) -> Option<&AssetRecord> {
    records.iter().reduce(|best, r| {
        if r.percent_change_24h < best.percent_change_24h {
            r
        } else {
            best
        }
    })
}
