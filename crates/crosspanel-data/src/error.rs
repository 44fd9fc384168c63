//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading raw tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A column the table must carry is absent from its header
    #[error("Missing column `{column}` in table {table}")]
    MissingColumn {
        /// Table being read
        table: String,
        /// Column that was expected
        column: String,
    },

    /// A cell could not be parsed
    #[error("Parse error in table {table}, line {line}: {reason}")]
    Parse {
        /// Table being read
        table: String,
        /// One-based line number (header is line 1)
        line: u64,
        /// What went wrong
        reason: String,
    },

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Invalid period literal
    #[error("Invalid period: {0} (expected YYYY-MM)")]
    InvalidPeriod(String),
}
