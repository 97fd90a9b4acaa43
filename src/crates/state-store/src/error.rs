//! Error types for store operations

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend unreachable or request failed in transit
    #[error("Store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with an error
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend configuration is unusable
    #[error("Store configuration error: {0}")]
    Config(String),
}
