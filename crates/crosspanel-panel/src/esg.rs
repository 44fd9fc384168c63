//! Monthly ESG score and carbon-intensity series.
//!
//! Scores and carbon records are keyed by a scoring institution. They are
//! mapped to an entity through the institution table, to a security through
//! the link table (validity checked on the record date), and then carried
//! forward month by month from the first to the last observed month of
//! each security.

use crate::error::{PanelError, Result};
use crate::link::{LinkPolicy, LinkTable, ResolveReport};
use chrono::NaiveDate;
use crosspanel_data::{
    CarbonRecord, EntityKey, EsgScoreRecord, InstitutionLink, Period, SecurityKey,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Score aspects retained from the long-format score table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EsgAspect {
    /// Overall ESG score
    Overall,
    /// Environmental dimension
    Environmental,
    /// Social dimension
    Social,
    /// Economic governance dimension
    Governance,
}

impl EsgAspect {
    /// Parse a source aspect name; other aspects are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "S&P Global ESG Score" => Some(Self::Overall),
            "Environmental Dimension" => Some(Self::Environmental),
            "Social Dimension" => Some(Self::Social),
            "Economic Governance Dimension" => Some(Self::Governance),
            _ => None,
        }
    }

    /// Output column name.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Overall => "ESG_score",
            Self::Environmental => "E_score",
            Self::Social => "S_score",
            Self::Governance => "G_score",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Overall => 0,
            Self::Environmental => 1,
            Self::Social => 2,
            Self::Governance => 3,
        }
    }
}

/// ESG data for one security in one month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EsgRecord {
    /// Security key
    pub permno: SecurityKey,
    /// Month
    pub period: Period,
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

/// Counts from [`build_esg`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsgReport {
    /// Score rows without a date or value
    pub scores_missing: usize,
    /// Score rows with an unrecognised aspect
    pub scores_other_aspect: usize,
    /// Carbon rows without a period end or value
    pub carbon_missing: usize,
    /// Institutions dropped for appearing more than once in the institution table
    pub duplicated_institutions: usize,
    /// Snapshots whose institution has no entity
    pub unmapped_institutions: usize,
    /// Link resolution counts, scores and carbon combined
    pub links: ResolveReport,
    /// Monthly records produced
    pub records: usize,
}

/// Institution to entity map, dropping institutions listed more than once.
pub fn institution_map(links: &[InstitutionLink]) -> HashMap<i64, EntityKey> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for link in links {
        *counts.entry(link.institutionid).or_default() += 1;
    }
    links
        .iter()
        .filter(|link| counts.get(&link.institutionid) == Some(&1))
        .map(|link| (link.institutionid, link.gvkey))
        .collect()
}

/// Scores of one institution on one date, one slot per aspect.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoreSnapshot {
    date: NaiveDate,
    institutionid: i64,
    scores: [Option<f64>; 4],
}

fn pivot_scores(
    records: Vec<EsgScoreRecord>,
    report: &mut EsgReport,
) -> Result<Vec<ScoreSnapshot>> {
    let mut seen = HashSet::new();
    let mut snapshots: BTreeMap<(NaiveDate, i64), [Option<f64>; 4]> = BTreeMap::new();

    for record in records {
        let (Some(date), Some(value)) = (record.scoredate, record.scorevalue) else {
            report.scores_missing += 1;
            continue;
        };
        let Some(aspect) = EsgAspect::from_name(&record.aspectname) else {
            report.scores_other_aspect += 1;
            continue;
        };
        if !seen.insert((date, record.institutionid, aspect)) {
            return Err(PanelError::Cardinality {
                table: "esg scores".to_string(),
                key: format!("({date}, {}, {})", record.institutionid, aspect.column()),
                count: 2,
            });
        }
        snapshots.entry((date, record.institutionid)).or_default()[aspect.slot()] = Some(value);
    }

    Ok(snapshots
        .into_iter()
        .map(|((date, institutionid), scores)| ScoreSnapshot {
            date,
            institutionid,
            scores,
        })
        .collect())
}

/// Carry each point forward to every month up to the next point.
///
/// `points` must be sorted by date. Each month from the first to the last
/// observed month takes the latest point dated at or before its month end.
fn month_end_fill<T: Clone>(points: &[(NaiveDate, T)]) -> Vec<(Period, T)> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let start = Period::from_date(first.0);
    let end = Period::from_date(last.0);

    let mut filled = Vec::with_capacity((end - start + 1).max(0) as usize);
    let mut cursor = 0;
    let mut period = start;
    while period <= end {
        while cursor + 1 < points.len() && Period::from_date(points[cursor + 1].0) <= period {
            cursor += 1;
        }
        filled.push((period, points[cursor].1.clone()));
        period = period.succ();
    }
    filled
}

/// Map dated institution records to securities and fill them monthly.
fn monthly_by_security<T: Clone>(
    records: Vec<(i64, NaiveDate, T)>,
    institutions: &HashMap<i64, EntityKey>,
    links: &LinkTable,
    policy: LinkPolicy,
    report: &mut EsgReport,
) -> Result<BTreeMap<SecurityKey, Vec<(Period, T)>>> {
    let mut with_entity = Vec::with_capacity(records.len());
    for (institutionid, date, payload) in records {
        match institutions.get(&institutionid) {
            Some(&gvkey) => with_entity.push((gvkey, date, payload)),
            None => report.unmapped_institutions += 1,
        }
    }

    let (linked, link_report) = links.resolve_all(with_entity, |r| (r.0, r.1), policy)?;
    report.links.absorb(link_report);

    let mut by_security: BTreeMap<SecurityKey, Vec<(NaiveDate, T)>> = BTreeMap::new();
    for item in linked {
        let (_, date, payload) = item.record;
        by_security
            .entry(item.security)
            .or_default()
            .push((date, payload));
    }

    Ok(by_security
        .into_iter()
        .map(|(security, mut points)| {
            points.sort_by_key(|point| point.0);
            (security, month_end_fill(&points))
        })
        .collect())
}

/// Build the monthly ESG and carbon-intensity series per security.
///
/// The two series are outer-merged on (security, month). A duplicated
/// (date, institution, aspect) in the score table is an error.
pub fn build_esg(
    scores: Vec<EsgScoreRecord>,
    carbon: Vec<CarbonRecord>,
    institutions: &[InstitutionLink],
    links: &LinkTable,
    policy: LinkPolicy,
) -> Result<(Vec<EsgRecord>, EsgReport)> {
    let mut report = EsgReport::default();

    let institution_ids = institution_map(institutions);
    let listed: HashSet<i64> = institutions.iter().map(|l| l.institutionid).collect();
    report.duplicated_institutions = listed.len() - institution_ids.len();

    let snapshots = pivot_scores(scores, &mut report)?;
    let score_points: Vec<_> = snapshots
        .into_iter()
        .map(|s| (s.institutionid, s.date, s.scores))
        .collect();

    let mut carbon_points = Vec::with_capacity(carbon.len());
    for record in carbon {
        match (record.periodenddate, record.carbon_intensity) {
            (Some(date), Some(value)) => carbon_points.push((record.institutionid, date, value)),
            _ => report.carbon_missing += 1,
        }
    }

    let score_series =
        monthly_by_security(score_points, &institution_ids, links, policy, &mut report)?;
    let carbon_series =
        monthly_by_security(carbon_points, &institution_ids, links, policy, &mut report)?;

    let mut merged: BTreeMap<(SecurityKey, Period), EsgRecord> = BTreeMap::new();
    for (permno, series) in score_series {
        for (period, scores) in series {
            let record = merged.entry((permno, period)).or_insert_with(|| EsgRecord {
                permno,
                period,
                ..Default::default()
            });
            record.esg_score = scores[EsgAspect::Overall.slot()];
            record.e_score = scores[EsgAspect::Environmental.slot()];
            record.s_score = scores[EsgAspect::Social.slot()];
            record.g_score = scores[EsgAspect::Governance.slot()];
        }
    }
    for (permno, series) in carbon_series {
        for (period, value) in series {
            merged
                .entry((permno, period))
                .or_insert_with(|| EsgRecord {
                    permno,
                    period,
                    ..Default::default()
                })
                .carbon_intensity = Some(value);
        }
    }

    let records: Vec<EsgRecord> = merged.into_values().collect();
    report.records = records.len();
    debug!(
        records = report.records,
        unmapped_institutions = report.unmapped_institutions,
        duplicated_institutions = report.duplicated_institutions,
        "built esg series"
    );
    Ok((records, report))
}
