//! Runtime configuration
//!
//! Every option can be given on the command line or through the environment
//! (a `.env` file is loaded by the binary before parsing).

use crate::{
    constants::{
        COINMARKETCAP_API_URL, DEFAULT_OUTPUT_FILE, DEFAULT_POLL_INTERVAL_SECS, MAX_BACKOFF_SECS,
        REQUEST_TIMEOUT_SECS,
    },
    error::ConfigError,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// CoinMarketCap Pro API key
    #[arg(long, env = "CMC_PRO_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Spreadsheet the snapshot is written to
    #[arg(short, long, env = "SNAPSHOT_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Seconds to wait between cycles
    #[arg(short, long, env = "SNAPSHOT_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "SNAPSHOT_TIMEOUT_SECS", default_value_t = REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Base URL of the listings API
    #[arg(long, env = "CMC_API_URL", default_value = COINMARKETCAP_API_URL)]
    pub api_url: String,

    /// Double the wait after each consecutive failed fetch
    #[arg(long, env = "SNAPSHOT_BACKOFF")]
    pub backoff: bool,
}

// Hand-written so the key never ends up in logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("output", &self.output)
            .field("interval_secs", &self.interval_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_url", &self.api_url)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl Config {
    /// Checks the values clap cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let is_xlsx = self
            .output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        if !is_xlsx {
            return Err(ConfigError::InvalidOutputPath(
                self.output.display().to_string(),
            ));
        }

        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("interval"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("timeout"));
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Largest delay between cycles, or `None` when backoff is disabled
    pub fn max_backoff(&self) -> Option<Duration> {
        self.backoff
            .then(|| Duration::from_secs(MAX_BACKOFF_SECS.max(self.interval_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("crypto-market-snapshot").chain(args.iter().copied());
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--api-key", "abc"]);

        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_FILE));
        assert_eq!(config.interval(), Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));
        assert_eq!(config.timeout(), Duration::from_secs(REQUEST_TIMEOUT_SECS));
        assert_eq!(config.api_url, COINMARKETCAP_API_URL);
        assert_eq!(config.max_backoff(), None);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--api-key",
            "abc",
            "--output",
            "out/Prices.XLSX",
            "--interval-secs",
            "60",
            "--backoff",
        ]);

        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.max_backoff(), Some(Duration::from_secs(MAX_BACKOFF_SECS)));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = parse(&["--api-key", "  "]);
        assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));

        config.api_key = "abc".to_string();
        config.output = PathBuf::from("snapshot.csv");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOutputPath(_))
        ));

        config.output = PathBuf::from("snapshot.xlsx");
        config.interval_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration("interval")));

        config.interval_secs = 1;
        config.timeout_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration("timeout")));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = parse(&["--api-key", "super-secret"]);
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
