//! The terminal panel row.

use chrono::NaiveDate;
use crosspanel_data::{EntityKey, Period, SecurityKey};
use std::collections::BTreeMap;

/// One security in one month with every merged and derived field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelRow {
    /// Security key
    pub permno: SecurityKey,
    /// Entity whose fundamentals were merged
    pub gvkey: EntityKey,
    /// Month of the row
    pub period: Period,
    /// Ticker symbol
    pub ticker: Option<String>,
    /// Company name
    pub conm: Option<String>,
    /// Delisting-adjusted return
    pub daret: Option<f64>,
    /// Return without dividends
    pub retx: Option<f64>,
    /// Volume
    pub vol: Option<f64>,
    /// Shares outstanding
    pub shrout: Option<f64>,
    /// Price
    pub prc: Option<f64>,
    /// Share code
    pub shrcd: Option<i32>,
    /// Exchange code
    pub exchcd: Option<i32>,
    /// Market capitalization
    pub me: Option<f64>,
    /// Prior-month market capitalization, missing across gaps
    pub me_lagged: Option<f64>,
    /// Value-weighted market return
    pub vwretd: Option<f64>,
    /// Risk-free rate
    pub rf: Option<f64>,
    /// Market excess return
    pub mktrf: Option<f64>,
    /// Size factor
    pub smb: Option<f64>,
    /// Value factor
    pub hml: Option<f64>,
    /// Momentum factor
    pub umd: Option<f64>,
    /// Profitability factor
    pub rmw: Option<f64>,
    /// Investment factor
    pub cma: Option<f64>,
    /// Total assets
    pub at: Option<f64>,
    /// Signal fields carried from fundamentals
    pub signals: BTreeMap<String, Option<f64>>,
    /// Gross profitability `(revt - cogs) / at`
    pub profit_a: Option<f64>,
    /// Rolling market beta
    pub beta: Option<f64>,
    /// Overall ESG score
    pub esg_score: Option<f64>,
    /// Environmental score
    pub e_score: Option<f64>,
    /// Social score
    pub s_score: Option<f64>,
    /// Governance score
    pub g_score: Option<f64>,
    /// Carbon intensity
    pub carbon_intensity: Option<f64>,
}

impl PanelRow {
    /// First day of the row's month.
    pub fn ldate(&self) -> Option<NaiveDate> {
        self.period.first_day()
    }

    /// Return in excess of the risk-free rate.
    pub fn excess_return(&self) -> Option<f64> {
        Some(self.daret? - self.rf?)
    }

    /// Market return in excess of the risk-free rate.
    pub fn excess_market(&self) -> Option<f64> {
        Some(self.vwretd? - self.rf?)
    }

    /// Value of a signal field.
    pub fn signal(&self, name: &str) -> Option<f64> {
        self.signals.get(name).copied().flatten()
    }

    /// Gross profitability from the `revt`, `cogs` and `at` fields.
    pub fn gross_profitability(&self) -> Option<f64> {
        let revt = self.signal("revt")?;
        let cogs = self.signal("cogs")?;
        Some((revt - cogs) / self.at?)
    }
}
