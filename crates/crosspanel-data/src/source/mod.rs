//! Sources of raw tables.
//!
//! The acquisition layer is external to the pipeline; [`TableSource`] is the
//! seam it plugs into. Two implementations ship with the crate: a directory
//! of CSV extracts and an in-memory set of tables.

pub mod directory;
pub mod memory;

pub use directory::CsvSource;
pub use memory::MemorySource;

use crate::error::Result;
use crate::records::{
    CarbonRecord, DailyFactorObservation, EsgScoreRecord, EtfReturn, FactorObservation,
    FundamentalObservation, InstitutionLink, LinkRecord, MarketIndexObservation,
    ReturnObservation,
};

/// Provider of the raw tables the pipeline consumes.
pub trait TableSource {
    /// Fundamentals, carrying the requested extra signal columns.
    ///
    /// Every returned observation has an entry for each requested signal,
    /// `None` when the cell is empty.
    fn fundamentals(&self, signals: &[String]) -> Result<Vec<FundamentalObservation>>;

    /// Identifier link history.
    fn links(&self) -> Result<Vec<LinkRecord>>;

    /// Monthly security returns with delisting information.
    fn returns(&self) -> Result<Vec<ReturnObservation>>;

    /// Monthly risk factors.
    fn factors(&self) -> Result<Vec<FactorObservation>>;

    /// Monthly value-weighted market index.
    fn market_index(&self) -> Result<Vec<MarketIndexObservation>>;

    /// Long-format ESG scores.
    fn esg_scores(&self) -> Result<Vec<EsgScoreRecord>>;

    /// Carbon intensity records.
    fn carbon_intensity(&self) -> Result<Vec<CarbonRecord>>;

    /// Institution to entity identifiers.
    fn institutions(&self) -> Result<Vec<InstitutionLink>>;

    /// Daily ETF returns.
    fn etf_daily(&self) -> Result<Vec<EtfReturn>>;

    /// Monthly ETF returns.
    fn etf_monthly(&self) -> Result<Vec<EtfReturn>>;

    /// Daily risk factors.
    fn daily_factors(&self) -> Result<Vec<DailyFactorObservation>>;
}
