//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while fetching, decoding or caching statistical data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status from the statistics API
    #[error("HTTP {status} while fetching dataset {dataset}")]
    Http {
        /// Dataset code that was requested
        dataset: String,
        /// HTTP status code returned
        status: u16,
    },

    /// Cube metadata is inconsistent or incomplete
    #[error("Malformed cube: {0}")]
    Structure(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid dataset code
    #[error("Invalid dataset code: {0}")]
    InvalidDataset(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for a structural cube error.
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }
}
