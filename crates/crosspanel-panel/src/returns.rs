//! Monthly return cleaning.

use crate::delist::DelistingPolicy;
use crosspanel_data::{Period, ReturnObservation, SecurityKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shares outstanding are reported in thousands; the panel carries millions.
const SHROUT_DIVISOR: f64 = 1_000.0;
/// Volume divisor applied to the raw share volume.
const VOLUME_DIVISOR: f64 = 10_000.0;

/// Share and exchange codes a security must carry to enter the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareScreen {
    /// Accepted share codes (common shares)
    pub share_codes: Vec<i32>,
    /// Accepted exchange codes (NYSE, AMEX, NASDAQ)
    pub exchange_codes: Vec<i32>,
}

impl Default for ShareScreen {
    fn default() -> Self {
        Self {
            share_codes: vec![10, 11, 12],
            exchange_codes: vec![1, 2, 3],
        }
    }
}

impl ShareScreen {
    /// Whether both codes are present and accepted.
    pub fn accepts(&self, shrcd: Option<i32>, exchcd: Option<i32>) -> bool {
        shrcd.is_some_and(|code| self.share_codes.contains(&code))
            && exchcd.is_some_and(|code| self.exchange_codes.contains(&code))
    }
}

/// A return observation after delisting adjustment, unit conversion and
/// screening.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReturn {
    /// Security key
    pub permno: SecurityKey,
    /// Month of the observation
    pub period: Period,
    /// Ticker symbol
    pub ticker: Option<String>,
    /// Company name from the security master
    pub comnam: Option<String>,
    /// Delisting-adjusted return
    pub adjusted_return: Option<f64>,
    /// Return without dividends
    pub retx: Option<f64>,
    /// Volume, in units of 10,000 shares
    pub volume: Option<f64>,
    /// Shares outstanding, in millions
    pub shares_outstanding: Option<f64>,
    /// Price (negative for bid/ask midpoints)
    pub price: Option<f64>,
    /// Share code
    pub shrcd: Option<i32>,
    /// Exchange code
    pub exchcd: Option<i32>,
    /// Shares outstanding times absolute price
    pub market_cap: Option<f64>,
}

impl CleanReturn {
    fn from_observation(obs: ReturnObservation, policy: &DelistingPolicy) -> Self {
        let adjusted_return = policy.adjust(obs.ret, obs.dlstcd, obs.dlret, obs.exchcd);
        let shares_outstanding = obs.shrout.map(|s| s / SHROUT_DIVISOR);
        let market_cap = shares_outstanding
            .zip(obs.prc)
            .map(|(shares, price)| shares * price.abs());

        Self {
            permno: obs.permno,
            period: Period::from_date(obs.date),
            ticker: obs.ticker,
            comnam: obs.comnam,
            adjusted_return,
            retx: obs.retx,
            volume: obs.vol.map(|v| v / VOLUME_DIVISOR),
            shares_outstanding,
            price: obs.prc,
            shrcd: obs.shrcd,
            exchcd: obs.exchcd,
            market_cap,
        }
    }
}

/// Adjust, convert and screen monthly returns.
///
/// Delisting adjustment runs before the share screen. Returns the retained
/// rows (input order) and the number screened out.
pub fn clean_returns(
    observations: Vec<ReturnObservation>,
    policy: &DelistingPolicy,
    screen: &ShareScreen,
) -> (Vec<CleanReturn>, usize) {
    let before = observations.len();
    let cleaned: Vec<CleanReturn> = observations
        .into_iter()
        .map(|obs| CleanReturn::from_observation(obs, policy))
        .filter(|row| screen.accepts(row.shrcd, row.exchcd))
        .collect();
    let dropped = before - cleaned.len();
    debug!(kept = cleaned.len(), dropped, "cleaned returns");
    (cleaned, dropped)
}
