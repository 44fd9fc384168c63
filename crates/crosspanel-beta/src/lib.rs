#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/crosspanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod ols;
pub mod panel;
pub mod rolling;

pub use error::{BetaError, Result};
pub use ols::{OlsFit, fit_ols, fit_ols_with_tolerance};
pub use panel::{BetaObservation, BetaSummary, estimate_panel_betas};
pub use rolling::{BetaConfig, rolling_betas};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
