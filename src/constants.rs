//! Constants for the market snapshot service
//!
//! Defaults live here. Every value that an operator may want to change is
//! also exposed on [`crate::config::Config`]; the rest are fixed by the
//! upstream API contract or the spreadsheet layout.

/// How often a new snapshot is taken (in seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// HTTP request timeout when fetching listings (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Upper bound for the poll delay when failure backoff is enabled (in seconds)
pub const MAX_BACKOFF_SECS: u64 = 3600;

/// CoinMarketCap Pro API base URL
pub const COINMARKETCAP_API_URL: &str = "https://pro-api.coinmarketcap.com";

/// CoinMarketCap endpoint for the latest listings
pub const COINMARKETCAP_LISTINGS_ENDPOINT: &str = "/v1/cryptocurrency/listings/latest";

/// Header carrying the CoinMarketCap API key
pub const COINMARKETCAP_API_KEY_HEADER: &str = "x-cmc_pro_api_key";

/// First listing rank requested
pub const LISTING_START: u32 = 1;

/// Number of listings requested per cycle
pub const LISTING_LIMIT: u32 = 50;

/// Fiat currency the quotes are converted to
pub const CONVERT_CURRENCY: &str = "USD";

/// Number of assets reported in the market cap ranking
pub const TOP_BY_MARKET_CAP: usize = 5;

/// Default spreadsheet path
pub const DEFAULT_OUTPUT_FILE: &str = "crypto_data.xlsx";

/// Column headers of the snapshot sheet, in order
pub const SHEET_HEADERS: [&str; 6] = [
    "Name",
    "Symbol",
    "Current Price (USD)",
    "Market Cap",
    "24h Trading Volume",
    "Price Change (24h %)",
];

/// User agent for HTTP requests
pub const USER_AGENT: &str = concat!("crypto-market-snapshot/", env!("CARGO_PKG_VERSION"));
