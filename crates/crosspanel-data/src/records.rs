//! Raw record types as delivered by the data acquisition layer.
//!
//! Dates stay as calendar dates here; conversion to [`Period`] happens in
//! the transforms that need it.

use crate::period::{EntityKey, Period, SecurityKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the identifier link history (gvkey → permno with validity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Fundamentals entity key
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub gvkey: EntityKey,
    /// Linked security key
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub permno: SecurityKey,
    /// First date the link is valid
    #[serde(deserialize_with = "crate::cell::deserialize_date")]
    pub linkdt: NaiveDate,
    /// Last date the link is valid, `None` while the link is still active
    #[serde(default, deserialize_with = "crate::cell::deserialize_optional_date")]
    pub linkenddt: Option<NaiveDate>,
}

/// A point-in-time fundamentals observation.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalObservation {
    /// Fundamentals entity key
    pub gvkey: EntityKey,
    /// Fiscal period end date
    pub datadate: NaiveDate,
    /// Total assets
    pub at: Option<f64>,
    /// Net income
    pub ni: Option<f64>,
    /// Calendar-year closing price
    pub prcc_c: Option<f64>,
    /// Company name
    pub conm: Option<String>,
    /// Fiscal year
    pub fyear: Option<i32>,
    /// Additional signal fields requested by the caller, keyed by column name
    pub signals: BTreeMap<String, Option<f64>>,
}

impl FundamentalObservation {
    /// Whether the fields every panel row needs are present.
    pub const fn has_required_fields(&self) -> bool {
        self.at.is_some() && self.ni.is_some() && self.prcc_c.is_some()
    }

    /// Value of a signal column, `None` when absent or missing.
    pub fn signal(&self, name: &str) -> Option<f64> {
        self.signals.get(name).copied().flatten()
    }
}

/// A monthly security return observation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnObservation {
    /// Security key
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub permno: SecurityKey,
    /// Observation date (month end)
    #[serde(deserialize_with = "crate::cell::deserialize_date")]
    pub date: NaiveDate,
    /// Holding-period return
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub ret: Option<f64>,
    /// Return without dividends
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub retx: Option<f64>,
    /// Trading volume (raw units)
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub vol: Option<f64>,
    /// Shares outstanding (raw units)
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub shrout: Option<f64>,
    /// Price; negative values flag a bid/ask midpoint
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub prc: Option<f64>,
    /// Share code
    #[serde(default, deserialize_with = "crate::cell::deserialize_code")]
    pub shrcd: Option<i32>,
    /// Exchange code
    #[serde(default, deserialize_with = "crate::cell::deserialize_code")]
    pub exchcd: Option<i32>,
    /// Delisting code
    #[serde(default, deserialize_with = "crate::cell::deserialize_code")]
    pub dlstcd: Option<i32>,
    /// Delisting return
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub dlret: Option<f64>,
    /// Ticker symbol
    #[serde(default)]
    pub ticker: Option<String>,
    /// Company name
    #[serde(default)]
    pub comnam: Option<String>,
}

impl ReturnObservation {
    /// Month of the observation.
    pub fn period(&self) -> Period {
        Period::from_date(self.date)
    }
}

/// Monthly risk-factor returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    /// Observation date
    #[serde(deserialize_with = "crate::cell::deserialize_date")]
    pub date: NaiveDate,
    /// Market excess return
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub mktrf: Option<f64>,
    /// Size
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub smb: Option<f64>,
    /// Value
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub hml: Option<f64>,
    /// Risk-free rate
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub rf: Option<f64>,
    /// Momentum
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub umd: Option<f64>,
    /// Profitability
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub rmw: Option<f64>,
    /// Investment
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub cma: Option<f64>,
}

impl FactorObservation {
    /// Month of the observation.
    pub fn period(&self) -> Period {
        Period::from_date(self.date)
    }
}

/// Daily risk-factor returns; same columns as the monthly table.
pub type DailyFactorObservation = FactorObservation;

/// Value-weighted market index return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketIndexObservation {
    /// Observation date
    #[serde(deserialize_with = "crate::cell::deserialize_date")]
    pub date: NaiveDate,
    /// Value-weighted return including distributions
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub vwretd: Option<f64>,
}

impl MarketIndexObservation {
    /// Month of the observation.
    pub fn period(&self) -> Period {
        Period::from_date(self.date)
    }
}

/// Long-format ESG score (one aspect per row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgScoreRecord {
    /// Score date
    #[serde(default, deserialize_with = "crate::cell::deserialize_optional_date")]
    pub scoredate: Option<NaiveDate>,
    /// Score value
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub scorevalue: Option<f64>,
    /// Scoring institution identifier
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub institutionid: i64,
    /// Aspect the score refers to
    pub aspectname: String,
}

/// Carbon intensity of one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonRecord {
    /// Scoring institution identifier
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub institutionid: i64,
    /// Reporting period end
    #[serde(default, deserialize_with = "crate::cell::deserialize_optional_date")]
    pub periodenddate: Option<NaiveDate>,
    /// Carbon intensity
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub carbon_intensity: Option<f64>,
}

/// Maps a scoring institution to a fundamentals entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionLink {
    /// Fundamentals entity key
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub gvkey: EntityKey,
    /// Scoring institution identifier
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub institutionid: i64,
}

/// One ETF return observation (daily or monthly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfReturn {
    /// Security key
    #[serde(deserialize_with = "crate::cell::deserialize_identifier")]
    pub permno: SecurityKey,
    /// Ticker symbol
    #[serde(default)]
    pub ticker: Option<String>,
    /// Observation date
    #[serde(deserialize_with = "crate::cell::deserialize_date")]
    pub date: NaiveDate,
    /// Return
    #[serde(default, deserialize_with = "crate::cell::deserialize_number")]
    pub ret: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> FundamentalObservation {
        FundamentalObservation {
            gvkey: EntityKey(1004),
            datadate: NaiveDate::from_ymd_opt(2001, 5, 31).unwrap(),
            at: Some(740.998),
            ni: Some(35.163),
            prcc_c: Some(13.8),
            conm: Some("AAR CORP".to_string()),
            fyear: Some(2000),
            signals: BTreeMap::from([("ceq".to_string(), Some(340.0)), ("revt".to_string(), None)]),
        }
    }

    #[test]
    fn test_required_fields() {
        let mut obs = observation();
        assert!(obs.has_required_fields());
        obs.ni = None;
        assert!(!obs.has_required_fields());
    }

    #[test]
    fn test_signal_lookup() {
        let obs = observation();
        assert_eq!(obs.signal("ceq"), Some(340.0));
        assert_eq!(obs.signal("revt"), None);
        assert_eq!(obs.signal("cogs"), None);
    }

    #[test]
    fn test_return_period() {
        let obs = ReturnObservation {
            permno: SecurityKey(10001),
            date: NaiveDate::from_ymd_opt(1990, 1, 31).unwrap(),
            ..Default::default()
        };
        assert_eq!(obs.period(), Period::new(1990, 1).unwrap());
    }
}
