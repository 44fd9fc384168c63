//! Error types for frame building and export.

use thiserror::Error;

/// Errors that can occur while building or writing output.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DataFrame construction or writing failed.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, ExportError>;
