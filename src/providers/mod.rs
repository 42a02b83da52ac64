//! Listing provider implementations

pub mod coinmarketcap;

pub use coinmarketcap::CoinMarketCapProvider;
