#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/crosspanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod delist;
pub mod error;
pub mod esg;
pub mod etf;
pub mod expand;
pub mod lag;
pub mod link;
pub mod merge;
pub mod returns;
pub mod row;

pub use delist::DelistingPolicy;
pub use error::{PanelError, Result};
pub use esg::{EsgAspect, EsgRecord, EsgReport, build_esg, institution_map};
pub use etf::{EtfConfig, EtfDailyRow, assemble_etf_daily};
pub use expand::{LagConfig, MonthlyFundamental, expand, project_periods};
pub use lag::{apply_lagged_market_cap, lag_contiguous};
pub use link::{
    AmbiguousLink, LinkPolicy, LinkTable, Linked, Resolution, ResolveReport, default_open_end,
};
pub use merge::{MergeReport, merge_panel, unique_index};
pub use returns::{CleanReturn, ShareScreen, clean_returns};
pub use row::PanelRow;

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
