//! Pipeline errors.

use crosspanel_beta::BetaError;
use crosspanel_data::DataError;
use crosspanel_output::ExportError;
use crosspanel_panel::PanelError;
use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading or parsing an input table failed
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// A join or link failed a cardinality check
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// The beta window policy is invalid
    #[error("Beta error: {0}")]
    Beta(#[from] BetaError),

    /// Building or writing output failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// The configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
