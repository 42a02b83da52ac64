//! Error types for the market snapshot service

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when fetching listings from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

impl ProviderError {
    /// Maps a transport error, separating timeouts from other failures
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(err)
        }
    }

    /// Creates an InvalidResponse error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Errors that can occur when writing the spreadsheet snapshot
///
/// All of them are fatal for the process.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The target exists but is not a readable workbook
    #[error("{path} exists but is not a readable workbook: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The workbook has no sheet to write into
    #[error("{path} contains no worksheet")]
    MissingSheet { path: PathBuf },

    /// Saving the workbook failed
    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Filesystem error while inspecting or syncing the target
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking write task did not complete
    #[error("Snapshot write task failed: {0}")]
    Task(String),
}

impl PersistenceError {
    /// Creates a Corrupt error
    pub fn corrupt(path: &Path, reason: impl ToString) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Creates a Write error
    pub fn write(path: &Path, reason: impl ToString) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Creates an Io error
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors in the runtime configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key is empty
    #[error("API key is empty; set CMC_PRO_API_KEY or pass --api-key")]
    MissingApiKey,

    /// Output path does not name an .xlsx file
    #[error("Output path {0} must end in .xlsx")]
    InvalidOutputPath(String),

    /// A duration setting was zero
    #[error("{0} must be at least one second")]
    ZeroDuration(&'static str),
}
