//! Row counts of one pipeline run.

use crate::error::Result;
use crate::export::{ExportFormat, Exporter, csv_string};
use crosspanel_beta::BetaSummary;
use crosspanel_panel::{EsgReport, MergeReport, ResolveReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Rows read, dropped and produced at each step of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Fundamentals rows read from the source
    pub fundamentals_read: usize,
    /// Fundamentals outside the sample window
    pub fundamentals_outside_window: usize,
    /// Fundamentals lacking assets, net income or price
    pub fundamentals_missing_required: usize,
    /// Resolution of fundamentals to securities
    pub links: ResolveReport,
    /// Monthly fundamentals after expansion and collapse
    pub monthly_fundamentals: usize,
    /// Return rows read from the source
    pub returns_read: usize,
    /// Return rows outside the sample window
    pub returns_outside_window: usize,
    /// Return rows failing the share or exchange screen
    pub returns_screened: usize,
    /// Panel merge counts
    pub merge: MergeReport,
    /// ESG series counts, when ESG data was merged
    pub esg: Option<EsgReport>,
    /// Beta estimation counts, when betas were estimated
    pub beta: Option<BetaSummary>,
    /// Rows in the final panel
    pub output_rows: usize,
    /// Rows in the factor table
    pub factor_rows: usize,
}

#[derive(Debug, Serialize)]
struct Metric<'a> {
    metric: &'a str,
    value: usize,
}

impl RunSummary {
    /// Flat `(metric, value)` list in step order.
    pub fn metrics(&self) -> Vec<(&'static str, usize)> {
        let mut metrics = vec![
            ("fundamentals_read", self.fundamentals_read),
            ("fundamentals_outside_window", self.fundamentals_outside_window),
            ("fundamentals_missing_required", self.fundamentals_missing_required),
            ("links_resolved", self.links.resolved),
            ("links_unmapped", self.links.unmapped),
            ("links_ambiguous", self.links.ambiguous.len()),
            ("monthly_fundamentals", self.monthly_fundamentals),
            ("returns_read", self.returns_read),
            ("returns_outside_window", self.returns_outside_window),
            ("returns_screened", self.returns_screened),
            ("unmatched_returns", self.merge.unmatched_returns),
            ("unmatched_period_rows", self.merge.unmatched_period_rows),
            ("unmatched_periods", self.merge.unmatched_periods.len()),
        ];
        if let Some(esg) = &self.esg {
            metrics.extend([
                ("esg_records", esg.records),
                ("esg_matched", self.merge.esg_matched),
                ("esg_unmapped_institutions", esg.unmapped_institutions),
            ]);
        }
        if let Some(beta) = &self.beta {
            metrics.extend([
                ("beta_entities", beta.entities),
                ("beta_entities_with_beta", beta.entities_with_beta),
                ("beta_defined", beta.defined),
                ("beta_undefined", beta.undefined),
            ]);
        }
        metrics.extend([("output_rows", self.output_rows), ("factor_rows", self.factor_rows)]);
        metrics
    }

    /// Emit the summary as one `info` event.
    pub fn log(&self) {
        info!(
            fundamentals = self.fundamentals_read,
            monthly_fundamentals = self.monthly_fundamentals,
            returns = self.returns_read,
            unmapped = self.links.unmapped,
            ambiguous = self.links.ambiguous.len(),
            unmatched_periods = self.merge.unmatched_periods.len(),
            entities_with_beta = self.beta.map(|b| b.entities_with_beta),
            output_rows = self.output_rows,
            factor_rows = self.factor_rows,
            "run summary"
        );
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics = self.metrics();
        let width = metrics.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, value) in metrics {
            writeln!(f, "{name:<width$}  {value:>10}")?;
        }
        Ok(())
    }
}

impl Exporter for RunSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => csv_string(
                self.metrics()
                    .into_iter()
                    .map(|(metric, value)| Metric { metric, value }),
            ),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
