#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/crosspanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export the layers
pub use crosspanel_beta as beta;
pub use crosspanel_data as data;
pub use crosspanel_output as output;
pub use crosspanel_panel as panel;

pub use config::{FULL_SIGNALS, PipelineConfig, Strategy, Variant};
pub use crosspanel_data::{CsvSource, MemorySource, TableSource};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineOutput, Step, WrittenFiles};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
