//! Error types shared by the cache wrapper, the store contract and the rate limiters.

use thiserror::Error;

/// Errors surfaced by cacher operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing key-value store failed the request.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Neither a hit nor a miss was ever recorded for the key.
    #[error("no statistics available for key '{0}'")]
    StatisticsNotFound(String),

    /// A counter operation found a value that is not a signed 64-bit integer.
    #[error("value stored under '{key}' is not an integer: {value:?}")]
    InvalidCounter { key: String, value: String },

    /// Applying `delta` to the counter would leave the signed 64-bit range.
    #[error("counter '{key}' would overflow applying {delta}")]
    CounterOverflow { key: String, delta: i64 },

    /// A rate-limit counter disappeared between initialisation and read-back.
    #[error("counter '{0}' vanished before it could be read")]
    CounterMissing(String),

    /// A typed value could not be encoded or decoded.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type CacheResult<T> = Result<T, CacheError>;

impl CacheError {
    /// Whether this error came from the backing store rather than from cacher itself.
    pub fn is_store_error(&self) -> bool {
        matches!(self, CacheError::StoreUnavailable(_))
    }
}
