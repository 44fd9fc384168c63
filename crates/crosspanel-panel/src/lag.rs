//! Prior-month values with gap screening.

use crate::row::PanelRow;
use crosspanel_data::Period;
use std::collections::HashSet;
use tracing::debug;

/// Prior row's value, per row of one entity's period-sorted sequence.
///
/// The first row has no prior value. A prior value is kept only when the
/// prior row's period is exactly one month before the current one.
pub fn lag_contiguous(series: &[(Period, Option<f64>)]) -> Vec<Option<f64>> {
    let mut lagged = Vec::with_capacity(series.len());
    if !series.is_empty() {
        lagged.push(None);
    }
    lagged.extend(series.windows(2).map(|pair| {
        let (prior_period, prior_value) = pair[0];
        let (period, _) = pair[1];
        if period - prior_period == 1 {
            prior_value
        } else {
            None
        }
    }));
    lagged
}

/// Deduplicate, sort and fill `me_lagged`.
///
/// Keeps the first row of each (security, month), sorts by (security,
/// month) and sets each row's `me_lagged` to the prior month's market
/// capitalization of the same security.
pub fn apply_lagged_market_cap(rows: Vec<PanelRow>) -> Vec<PanelRow> {
    let before = rows.len();
    let mut seen = HashSet::with_capacity(rows.len());
    let mut rows: Vec<PanelRow> = rows
        .into_iter()
        .filter(|row| seen.insert((row.permno, row.period)))
        .collect();
    rows.sort_by_key(|row| (row.permno, row.period));

    let mut gaps = 0usize;
    for group in rows.chunk_by_mut(|a, b| a.permno == b.permno) {
        let series: Vec<(Period, Option<f64>)> =
            group.iter().map(|row| (row.period, row.me)).collect();
        for (index, (row, lagged)) in group.iter_mut().zip(lag_contiguous(&series)).enumerate() {
            if index > 0 && lagged.is_none() && series[index - 1].1.is_some() {
                gaps += 1;
            }
            row.me_lagged = lagged;
        }
    }

    debug!(duplicates = before - rows.len(), gaps, "lagged market cap");
    rows
}
