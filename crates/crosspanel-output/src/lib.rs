#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/crosspanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod export;
pub mod frame;
pub mod summary;
pub mod writer;

pub use error::{ExportError, Result};
pub use export::{ExportFormat, Exporter};
pub use frame::{
    ESG_COLUMNS, FACTOR_COLUMNS, FactorRow, PANEL_BASE_COLUMNS, PanelLayout, SignalColumn,
    daily_factor_frame, etf_frame, factor_frame, factor_table, panel_frame,
};
pub use summary::RunSummary;
pub use writer::{TableFormat, sibling_path, write_frame};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
