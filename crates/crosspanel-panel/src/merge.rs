//! Cardinality-checked joins into panel rows.

use crate::error::{PanelError, Result};
use crate::esg::EsgRecord;
use crate::expand::MonthlyFundamental;
use crate::returns::CleanReturn;
use crate::row::PanelRow;
use crosspanel_data::{FactorObservation, MarketIndexObservation, Period};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, warn};

/// Index rows by key, failing if any key occurs more than once.
///
/// Maps each key to the position of its row.
pub fn unique_index<T, K, F>(rows: &[T], key: F, table: &str) -> Result<HashMap<K, usize>>
where
    K: Eq + Hash + Debug,
    F: Fn(&T) -> K,
{
    let mut index = HashMap::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        let k = key(row);
        if index.contains_key(&k) {
            let count = rows.iter().filter(|&other| key(other) == k).count();
            return Err(PanelError::Cardinality {
                table: table.to_string(),
                key: format!("{k:?}"),
                count,
            });
        }
        index.insert(k, position);
    }
    Ok(index)
}

/// Row counts from [`merge_panel`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Return rows without matching fundamentals
    pub unmatched_returns: usize,
    /// Rows dropped because their month has no factor or market observation
    pub unmatched_period_rows: usize,
    /// Months missing from the factor or market series
    pub unmatched_periods: Vec<Period>,
    /// Rows carrying ESG data
    pub esg_matched: usize,
    /// Rows produced
    pub rows: usize,
}

/// Join returns, fundamentals, factors, the market index and optional ESG data.
///
/// Returns and fundamentals join one-to-one on (security, month). Factors
/// and the market index join many-to-one on month, dropping rows whose month
/// is missing from either. ESG records join one-to-one on (security, month)
/// without dropping rows. Duplicate keys on any side are an error.
pub fn merge_panel(
    returns: Vec<CleanReturn>,
    fundamentals: Vec<MonthlyFundamental>,
    factors: &[FactorObservation],
    market: &[MarketIndexObservation],
    esg: Option<&[EsgRecord]>,
) -> Result<(Vec<PanelRow>, MergeReport)> {
    unique_index(&returns, |r| (r.permno, r.period), "returns")?;
    let fundamentals_index = unique_index(&fundamentals, |f| (f.permno, f.period), "fundamentals")?;
    let factor_index = unique_index(factors, FactorObservation::period, "factors")?;
    let market_index = unique_index(market, MarketIndexObservation::period, "market index")?;
    let esg_index = match esg {
        Some(records) => Some(unique_index(records, |e| (e.permno, e.period), "esg")?),
        None => None,
    };

    let mut fundamentals: Vec<Option<MonthlyFundamental>> =
        fundamentals.into_iter().map(Some).collect();
    let mut report = MergeReport::default();
    let mut missing_periods = BTreeSet::new();
    let mut rows = Vec::with_capacity(returns.len());

    for ret in returns {
        let key = (ret.permno, ret.period);
        let Some(fundamental) = fundamentals_index
            .get(&key)
            .and_then(|&position| fundamentals[position].take())
        else {
            report.unmatched_returns += 1;
            continue;
        };

        let factor = factor_index.get(&ret.period).map(|&i| &factors[i]);
        let index = market_index.get(&ret.period).map(|&i| &market[i]);
        let (Some(factor), Some(index)) = (factor, index) else {
            report.unmatched_period_rows += 1;
            missing_periods.insert(ret.period);
            continue;
        };

        let mut row = PanelRow {
            permno: ret.permno,
            gvkey: fundamental.gvkey,
            period: ret.period,
            ticker: ret.ticker,
            conm: fundamental.conm,
            daret: ret.adjusted_return,
            retx: ret.retx,
            vol: ret.volume,
            shrout: ret.shares_outstanding,
            prc: ret.price,
            shrcd: ret.shrcd,
            exchcd: ret.exchcd,
            me: ret.market_cap,
            me_lagged: None,
            vwretd: index.vwretd,
            rf: factor.rf,
            mktrf: factor.mktrf,
            smb: factor.smb,
            hml: factor.hml,
            umd: factor.umd,
            rmw: factor.rmw,
            cma: factor.cma,
            at: fundamental.at,
            signals: fundamental.signals,
            ..Default::default()
        };

        if let (Some(esg_index), Some(records)) = (&esg_index, esg) {
            if let Some(&position) = esg_index.get(&key) {
                let record = &records[position];
                row.esg_score = record.esg_score;
                row.e_score = record.e_score;
                row.s_score = record.s_score;
                row.g_score = record.g_score;
                row.carbon_intensity = record.carbon_intensity;
                report.esg_matched += 1;
            }
        }

        rows.push(row);
    }

    report.unmatched_periods = missing_periods.into_iter().collect();
    report.rows = rows.len();
    if !report.unmatched_periods.is_empty() {
        warn!(
            periods = report.unmatched_periods.len(),
            rows = report.unmatched_period_rows,
            "months missing from factor or market series"
        );
    }
    debug!(
        rows = report.rows,
        unmatched_returns = report.unmatched_returns,
        esg_matched = report.esg_matched,
        "merged panel"
    );
    Ok((rows, report))
}
