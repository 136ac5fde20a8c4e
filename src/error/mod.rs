//! Error handling for the DQI engine.
//!
//! Only [`DqiError::Configuration`] aborts a scoring run. Everything the engine
//! can recover from is reported through [`crate::audit::IssueLog`] instead.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the DQI engine
#[derive(Debug, thiserror::Error)]
pub enum DqiError {
    /// Invalid weight registry or engine configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error building or slicing Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading or writing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error opening or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error (de)serializing a registry, configuration or report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Table shape that cannot be processed at all
    #[error("Schema error: {0}")]
    Schema(String),
}

impl DqiError {
    /// Shorthand for a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error is a fatal configuration error
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result type for DQI engine operations
pub type Result<T> = std::result::Result<T, DqiError>;
