//! Beta estimation across many securities.

use crate::error::Result;
use crate::rolling::{BetaConfig, rolling_betas};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One period of one security.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaObservation<K> {
    /// Security the observation belongs to
    pub key: K,
    /// Return in excess of the risk-free rate
    pub excess_return: Option<f64>,
    /// Market return in excess of the risk-free rate
    pub excess_market: Option<f64>,
}

/// Counts from [`estimate_panel_betas`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetaSummary {
    /// Securities estimated
    pub entities: usize,
    /// Securities with at least one defined beta
    pub entities_with_beta: usize,
    /// Periods with a defined beta
    pub defined: usize,
    /// Periods without a beta
    pub undefined: usize,
}

/// Estimate betas for observations grouped by security.
///
/// `observations` must be sorted by security and, within a security, by
/// period; each run of equal keys is one security's sequence. Securities are
/// estimated in parallel and the output is aligned with the input.
pub fn estimate_panel_betas<K>(
    observations: &[BetaObservation<K>],
    config: &BetaConfig,
) -> Result<(Vec<Option<f64>>, BetaSummary)>
where
    K: PartialEq + Sync,
{
    config.validate()?;

    let groups: Vec<&[BetaObservation<K>]> = observations
        .chunk_by(|a, b| a.key == b.key)
        .collect();

    let per_entity: Vec<Vec<Option<f64>>> = groups
        .par_iter()
        .map(|group| {
            let pairs: Vec<(Option<f64>, Option<f64>)> = group
                .iter()
                .map(|obs| (obs.excess_return, obs.excess_market))
                .collect();
            rolling_betas(&pairs, config)
        })
        .collect();

    let mut summary = BetaSummary {
        entities: per_entity.len(),
        ..BetaSummary::default()
    };
    let mut betas = Vec::with_capacity(observations.len());
    for entity in per_entity {
        let defined = entity.iter().filter(|beta| beta.is_some()).count();
        if defined > 0 {
            summary.entities_with_beta += 1;
        }
        summary.defined += defined;
        summary.undefined += entity.len() - defined;
        betas.extend(entity);
    }

    debug!(
        entities = summary.entities,
        entities_with_beta = summary.entities_with_beta,
        defined = summary.defined,
        undefined = summary.undefined,
        "estimated rolling betas"
    );
    Ok((betas, summary))
}
