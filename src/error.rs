//! Error types for the urbansense library.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, UrbanError>;

/// Errors that can occur while fitting, forecasting or scoring.
///
/// Expected data sparsity is not an error: fitting and forecasting signal
/// it with `None`. These variants cover invalid input and genuine failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UrbanError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error (duplicates, ordering).
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., singular regression).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// An external data provider failed outright.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Persistence store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for UrbanError {
    fn from(err: serde_json::Error) -> Self {
        UrbanError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for UrbanError {
    fn from(err: std::io::Error) -> Self {
        UrbanError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for UrbanError {
    fn from(err: rusqlite::Error) -> Self {
        UrbanError::Storage(err.to_string())
    }
}

impl From<toml::de::Error> for UrbanError {
    fn from(err: toml::de::Error) -> Self {
        UrbanError::Config(err.to_string())
    }
}
