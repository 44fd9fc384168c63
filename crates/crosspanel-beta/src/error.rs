//! Error types for beta estimation.

use thiserror::Error;

/// Result type for beta estimation.
pub type Result<T> = std::result::Result<T, BetaError>;

/// Errors raised before any estimate is computed.
///
/// Undefined estimates are never errors; they are `None` in the output.
#[derive(Debug, Error)]
pub enum BetaError {
    /// Window policy is inconsistent
    #[error("Invalid beta configuration: {0}")]
    InvalidConfig(String),
}
