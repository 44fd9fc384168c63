//! Dated identifier links.
//!
//! A fundamentals entity maps to a security through link intervals. An
//! observation is kept when exactly one interval of its entity covers the
//! observation date; both interval ends are inclusive.

use crate::error::{PanelError, Result};
use chrono::NaiveDate;
use crosspanel_data::{EntityKey, LinkRecord, SecurityKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// End date assumed for links that are still active.
pub fn default_open_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// What to do when more than one link covers an observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
    /// Fail with [`PanelError::AmbiguousLink`]
    #[default]
    Strict,
    /// Drop the observation and record it in the [`ResolveReport`]
    Skip,
}

/// Outcome of resolving one (entity, date) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No link covers the date
    Unmapped,
    /// Exactly one security covers the date
    Resolved(SecurityKey),
    /// Several securities cover the date; sorted and deduplicated
    Ambiguous(Vec<SecurityKey>),
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    security: SecurityKey,
    start: NaiveDate,
    end: NaiveDate,
}

impl Interval {
    fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Link intervals indexed by entity key.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    by_entity: HashMap<EntityKey, Vec<Interval>>,
}

impl LinkTable {
    /// Index `links`, closing open intervals at `open_end`.
    pub fn new(links: &[LinkRecord], open_end: NaiveDate) -> Self {
        let mut by_entity: HashMap<EntityKey, Vec<Interval>> = HashMap::new();
        for link in links {
            by_entity.entry(link.gvkey).or_default().push(Interval {
                security: link.permno,
                start: link.linkdt,
                end: link.linkenddt.unwrap_or(open_end),
            });
        }
        debug!(
            entities = by_entity.len(),
            links = links.len(),
            "indexed link table"
        );
        Self { by_entity }
    }

    /// Number of entities with at least one link.
    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    /// Whether the table holds no links.
    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    /// Resolve `entity` as of `date`.
    pub fn resolve(&self, entity: EntityKey, date: NaiveDate) -> Resolution {
        let Some(intervals) = self.by_entity.get(&entity) else {
            return Resolution::Unmapped;
        };
        let mut candidates: Vec<SecurityKey> = intervals
            .iter()
            .filter(|interval| interval.covers(date))
            .map(|interval| interval.security)
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        match candidates.len() {
            0 => Resolution::Unmapped,
            1 => Resolution::Resolved(candidates[0]),
            _ => Resolution::Ambiguous(candidates),
        }
    }

    /// Resolve every record, keeping those that map to exactly one security.
    ///
    /// `key` extracts the entity and the date the link must cover. Unmapped
    /// records are dropped and counted; ambiguous ones are handled per
    /// `policy`. Input order is preserved.
    pub fn resolve_all<T, F>(
        &self,
        records: Vec<T>,
        key: F,
        policy: LinkPolicy,
    ) -> Result<(Vec<Linked<T>>, ResolveReport)>
    where
        F: Fn(&T) -> (EntityKey, NaiveDate),
    {
        let mut report = ResolveReport::default();
        let mut linked = Vec::with_capacity(records.len());

        for record in records {
            let (entity, date) = key(&record);
            match self.resolve(entity, date) {
                Resolution::Resolved(security) => {
                    report.resolved += 1;
                    linked.push(Linked { security, record });
                }
                Resolution::Unmapped => report.unmapped += 1,
                Resolution::Ambiguous(candidates) => match policy {
                    LinkPolicy::Strict => {
                        return Err(PanelError::AmbiguousLink {
                            entity,
                            date,
                            candidates,
                        });
                    }
                    LinkPolicy::Skip => {
                        warn!(%entity, %date, ?candidates, "skipping ambiguous link");
                        report.ambiguous.push(AmbiguousLink {
                            entity,
                            date,
                            candidates,
                        });
                    }
                },
            }
        }

        debug!(
            resolved = report.resolved,
            unmapped = report.unmapped,
            ambiguous = report.ambiguous.len(),
            "resolved links"
        );
        Ok((linked, report))
    }
}

/// A record paired with the security it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Linked<T> {
    /// Resolved security key
    pub security: SecurityKey,
    /// Original record
    pub record: T,
}

/// An observation dropped because several links covered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousLink {
    /// Entity being resolved
    pub entity: EntityKey,
    /// Observation date
    pub date: NaiveDate,
    /// Covering securities
    pub candidates: Vec<SecurityKey>,
}

/// Counts from [`LinkTable::resolve_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveReport {
    /// Records mapped to a single security
    pub resolved: usize,
    /// Records with no covering link
    pub unmapped: usize,
    /// Records skipped as ambiguous
    pub ambiguous: Vec<AmbiguousLink>,
}

impl ResolveReport {
    /// Fold another report into this one.
    pub fn absorb(&mut self, other: Self) {
        self.resolved += other.resolved;
        self.unmapped += other.unmapped;
        self.ambiguous.extend(other.ambiguous);
    }
}
