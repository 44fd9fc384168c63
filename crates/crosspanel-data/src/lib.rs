#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/crosspanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod error;
pub mod period;
pub mod records;
pub mod screen;
pub mod source;

pub use error::{DataError, Result};
pub use period::{EntityKey, Period, SecurityKey};
pub use records::{
    CarbonRecord, DailyFactorObservation, EsgScoreRecord, EtfReturn, FactorObservation,
    FundamentalObservation, InstitutionLink, LinkRecord, MarketIndexObservation,
    ReturnObservation,
};
pub use screen::{SampleWindow, require_fundamentals};
pub use source::{CsvSource, MemorySource, TableSource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
