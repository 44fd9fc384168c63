//! Daily ETF table for time-series work.

use crate::error::Result;
use crate::merge::unique_index;
use chrono::NaiveDate;
use crosspanel_data::{EtfReturn, FactorObservation, Period, SecurityKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// ETFs to assemble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtfConfig {
    /// Tickers kept from the daily and monthly tables
    pub tickers: Vec<String>,
}

impl Default for EtfConfig {
    fn default() -> Self {
        Self {
            tickers: vec!["SPY".to_string(), "XLF".to_string()],
        }
    }
}

impl EtfConfig {
    fn accepts(&self, ticker: Option<&str>) -> bool {
        ticker.is_some_and(|t| self.tickers.iter().any(|wanted| wanted == t))
    }
}

/// A daily ETF return with its month's ETF return and factors.
#[derive(Debug, Clone, PartialEq)]
pub struct EtfDailyRow {
    /// Trading day
    pub date: NaiveDate,
    /// Month of the trading day
    pub period: Period,
    /// Security key
    pub permno: SecurityKey,
    /// Daily return
    pub retd: Option<f64>,
    /// Ticker from the monthly table
    pub ticker: Option<String>,
    /// Monthly return
    pub ret_m: Option<f64>,
    /// Market excess return of the month
    pub mktrf: Option<f64>,
    /// Risk-free rate of the month
    pub rf: Option<f64>,
}

fn distinct<T, K: Eq + std::hash::Hash>(rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter().filter(|row| seen.insert(key(row))).collect()
}

/// Join daily ETF returns with monthly returns and monthly factors.
///
/// Both return tables are restricted to the configured tickers and made
/// distinct first. Monthly returns join many-to-one on (month, security)
/// and factors many-to-one on month; unmatched days are dropped. Output is
/// sorted by (security, date).
pub fn assemble_etf_daily(
    daily: Vec<EtfReturn>,
    monthly: Vec<EtfReturn>,
    factors: &[FactorObservation],
    config: &EtfConfig,
) -> Result<Vec<EtfDailyRow>> {
    let daily: Vec<EtfReturn> = daily
        .into_iter()
        .filter(|r| config.accepts(r.ticker.as_deref()))
        .collect();
    let daily = distinct(daily, |r| (r.date, r.permno, r.ret.map(f64::to_bits)));

    let monthly: Vec<EtfReturn> = monthly
        .into_iter()
        .filter(|r| config.accepts(r.ticker.as_deref()))
        .collect();
    let monthly = distinct(monthly, |r| {
        (
            Period::from_date(r.date),
            r.permno,
            r.ticker.clone(),
            r.ret.map(f64::to_bits),
        )
    });

    let monthly_index = unique_index(&monthly, |r| (Period::from_date(r.date), r.permno), "etf monthly")?;
    let factor_index = unique_index(factors, FactorObservation::period, "factors")?;

    let mut rows: Vec<EtfDailyRow> = daily
        .into_iter()
        .filter_map(|day| {
            let period = Period::from_date(day.date);
            let month = &monthly[*monthly_index.get(&(period, day.permno))?];
            let factor = &factors[*factor_index.get(&period)?];
            Some(EtfDailyRow {
                date: day.date,
                period,
                permno: day.permno,
                retd: day.ret,
                ticker: month.ticker.clone(),
                ret_m: month.ret,
                mktrf: factor.mktrf,
                rf: factor.rf,
            })
        })
        .collect();
    rows.sort_by_key(|row| (row.permno, row.date));

    debug!(rows = rows.len(), tickers = ?config.tickers, "assembled etf daily table");
    Ok(rows)
}
