//! In-memory tables.

use super::TableSource;
use crate::error::Result;
use crate::records::{
    CarbonRecord, DailyFactorObservation, EsgScoreRecord, EtfReturn, FactorObservation,
    FundamentalObservation, InstitutionLink, LinkRecord, MarketIndexObservation,
    ReturnObservation,
};

/// A [`TableSource`] over tables already held in memory.
///
/// Useful when the acquisition layer hands over records directly, and in
/// tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    /// Fundamentals
    pub fundamentals: Vec<FundamentalObservation>,
    /// Identifier links
    pub links: Vec<LinkRecord>,
    /// Monthly returns
    pub returns: Vec<ReturnObservation>,
    /// Monthly factors
    pub factors: Vec<FactorObservation>,
    /// Market index
    pub market: Vec<MarketIndexObservation>,
    /// ESG scores
    pub esg_scores: Vec<EsgScoreRecord>,
    /// Carbon intensity
    pub carbon: Vec<CarbonRecord>,
    /// Institution identifiers
    pub institutions: Vec<InstitutionLink>,
    /// Daily ETF returns
    pub etf_daily: Vec<EtfReturn>,
    /// Monthly ETF returns
    pub etf_monthly: Vec<EtfReturn>,
    /// Daily factors
    pub daily_factors: Vec<DailyFactorObservation>,
}

impl TableSource for MemorySource {
    fn fundamentals(&self, signals: &[String]) -> Result<Vec<FundamentalObservation>> {
        // Project onto the requested signals so both sources agree on the shape.
        Ok(self
            .fundamentals
            .iter()
            .map(|obs| {
                let mut obs = obs.clone();
                obs.signals = signals
                    .iter()
                    .map(|name| (name.clone(), obs.signal(name)))
                    .collect();
                obs
            })
            .collect())
    }

    fn links(&self) -> Result<Vec<LinkRecord>> {
        Ok(self.links.clone())
    }

    fn returns(&self) -> Result<Vec<ReturnObservation>> {
        Ok(self.returns.clone())
    }

    fn factors(&self) -> Result<Vec<FactorObservation>> {
        Ok(self.factors.clone())
    }

    fn market_index(&self) -> Result<Vec<MarketIndexObservation>> {
        Ok(self.market.clone())
    }

    fn esg_scores(&self) -> Result<Vec<EsgScoreRecord>> {
        Ok(self.esg_scores.clone())
    }

    fn carbon_intensity(&self) -> Result<Vec<CarbonRecord>> {
        Ok(self.carbon.clone())
    }

    fn institutions(&self) -> Result<Vec<InstitutionLink>> {
        Ok(self.institutions.clone())
    }

    fn etf_daily(&self) -> Result<Vec<EtfReturn>> {
        Ok(self.etf_daily.clone())
    }

    fn etf_monthly(&self) -> Result<Vec<EtfReturn>> {
        Ok(self.etf_monthly.clone())
    }

    fn daily_factors(&self) -> Result<Vec<DailyFactorObservation>> {
        Ok(self.daily_factors.clone())
    }
}
