//! Error types for the deep_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the deep_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Feature and target lengths (or column counts) disagree
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Window plus horizon exceeds the available rows
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A train/test split produced zero test rows
    #[error("Empty test set: {0}")]
    EmptyTestSet(String),

    /// The hyperparameter search returned no viable model
    #[error("Search failure: {0}")]
    SearchFailure(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON configuration parsing
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
