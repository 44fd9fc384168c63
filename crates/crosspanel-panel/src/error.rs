//! Error types for panel construction.

use chrono::NaiveDate;
use crosspanel_data::{DataError, EntityKey, SecurityKey};
use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors that abort panel construction.
#[derive(Debug, Error)]
pub enum PanelError {
    /// A join expected to be one-to-one or many-to-one found duplicate keys
    #[error("Cardinality violation in {table}: key {key} appears {count} times")]
    Cardinality {
        /// Table whose key is duplicated
        table: String,
        /// Offending key
        key: String,
        /// Number of rows carrying the key
        count: usize,
    },

    /// More than one link covers an observation date
    #[error("Ambiguous link for entity {entity} on {date}: candidates {candidates:?}")]
    AmbiguousLink {
        /// Entity being resolved
        entity: EntityKey,
        /// Observation date
        date: NaiveDate,
        /// Security keys whose link intervals cover the date
        candidates: Vec<SecurityKey>,
    },

    /// A transform parameter is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data error
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}
