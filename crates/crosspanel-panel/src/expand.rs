//! Reporting-lag expansion of fundamentals.
//!
//! Each observation is assumed public `reporting_lag` months after its fiscal
//! period end and to stay current for `persistence` months. Where projected
//! runs overlap, the observation with the latest report date wins the month;
//! equal report dates fall back to input order (later wins). The same order
//! collapses entity months first and security months second.

use crate::error::{PanelError, Result};
use crate::link::Linked;
use chrono::NaiveDate;
use crosspanel_data::{EntityKey, FundamentalObservation, Period, SecurityKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Longest accepted reporting lag or persistence, in months.
const MAX_MONTHS: u32 = 1_200;

/// Disclosure lag and persistence, in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagConfig {
    /// Months between fiscal period end and the first month the data is used
    pub reporting_lag: i32,
    /// Number of consecutive months each observation is carried
    pub persistence: u32,
}

impl Default for LagConfig {
    fn default() -> Self {
        Self {
            reporting_lag: 6,
            persistence: 12,
        }
    }
}

impl LagConfig {
    /// Check that the lag and persistence are usable month counts.
    pub fn validate(&self) -> Result<()> {
        if self.persistence == 0 || self.persistence > MAX_MONTHS {
            return Err(PanelError::InvalidConfig(format!(
                "persistence must be between 1 and {MAX_MONTHS} months, got {}",
                self.persistence
            )));
        }
        if self.reporting_lag.unsigned_abs() > MAX_MONTHS {
            return Err(PanelError::InvalidConfig(format!(
                "reporting_lag must be within {MAX_MONTHS} months, got {}",
                self.reporting_lag
            )));
        }
        Ok(())
    }
}

/// The months an observation reported on `report_date` is carried over.
///
/// A persistence above the accepted maximum is capped at it.
pub fn project_periods(
    report_date: NaiveDate,
    config: &LagConfig,
) -> impl Iterator<Item = Period> + use<> {
    let base = Period::from_date(report_date) + config.reporting_lag;
    let count = i32::try_from(config.persistence.min(MAX_MONTHS)).unwrap_or(0);
    (0..count).map(move |offset| base + offset)
}

/// Fundamentals carried into one month for one security.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFundamental {
    /// Entity the observation belongs to
    pub gvkey: EntityKey,
    /// Security the entity resolved to
    pub permno: SecurityKey,
    /// Month the values apply to
    pub period: Period,
    /// Report date of the source observation
    pub report_date: NaiveDate,
    /// Position of the source observation in the input
    pub source_index: usize,
    /// Total assets
    pub at: Option<f64>,
    /// Company name
    pub conm: Option<String>,
    /// Signal fields
    pub signals: BTreeMap<String, Option<f64>>,
}

impl MonthlyFundamental {
    const fn precedence(&self) -> (NaiveDate, usize) {
        (self.report_date, self.source_index)
    }
}

/// Expand linked fundamentals into one row per security per month.
///
/// Entities are expanded in parallel. The result is sorted by
/// (security key, period).
pub fn expand(
    observations: Vec<Linked<FundamentalObservation>>,
    config: &LagConfig,
) -> Vec<MonthlyFundamental> {
    let input = observations.len();

    let mut by_entity: BTreeMap<EntityKey, Vec<(usize, Linked<FundamentalObservation>)>> =
        BTreeMap::new();
    for (index, linked) in observations.into_iter().enumerate() {
        by_entity
            .entry(linked.record.gvkey)
            .or_default()
            .push((index, linked));
    }
    let groups: Vec<_> = by_entity.into_values().collect();
    let entities = groups.len();

    let entity_months: Vec<MonthlyFundamental> = groups
        .into_par_iter()
        .flat_map_iter(|group| expand_entity(group, config))
        .collect();
    let entity_rows = entity_months.len();

    let mut by_security: HashMap<(SecurityKey, Period), MonthlyFundamental> =
        HashMap::with_capacity(entity_rows);
    for row in entity_months {
        let key = (row.permno, row.period);
        match by_security.get(&key) {
            Some(current) if current.precedence() >= row.precedence() => {}
            _ => {
                by_security.insert(key, row);
            }
        }
    }

    let mut rows: Vec<MonthlyFundamental> = by_security.into_values().collect();
    rows.sort_unstable_by_key(|row| (row.permno, row.period));

    debug!(
        input,
        entities,
        entity_rows,
        security_rows = rows.len(),
        "expanded fundamentals"
    );
    rows
}

/// Collapse one entity's projected months, latest report winning.
fn expand_entity(
    group: Vec<(usize, Linked<FundamentalObservation>)>,
    config: &LagConfig,
) -> Vec<MonthlyFundamental> {
    let mut winners: BTreeMap<Period, (NaiveDate, usize, usize)> = BTreeMap::new();
    for (position, (index, linked)) in group.iter().enumerate() {
        let report_date = linked.record.datadate;
        for period in project_periods(report_date, config) {
            let candidate = (report_date, *index, position);
            winners
                .entry(period)
                .and_modify(|current| {
                    if (candidate.0, candidate.1) > (current.0, current.1) {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
    }

    winners
        .into_iter()
        .map(|(period, (report_date, source_index, position))| {
            let linked = &group[position].1;
            MonthlyFundamental {
                gvkey: linked.record.gvkey,
                permno: linked.security,
                period,
                report_date,
                source_index,
                at: linked.record.at,
                conm: linked.record.conm.clone(),
                signals: linked.record.signals.clone(),
            }
        })
        .collect()
}
