//! End-to-end panel construction.

use crate::config::PipelineConfig;
use crate::error::Result;
use crosspanel_beta::{BetaConfig, BetaObservation, BetaSummary, estimate_panel_betas};
use crosspanel_data::{DailyFactorObservation, SecurityKey, TableSource, require_fundamentals};
use crosspanel_output::{
    ExportFormat, Exporter, FactorRow, PanelLayout, RunSummary, TableFormat, factor_frame,
    factor_table, panel_frame, sibling_path, write_frame,
};
use crosspanel_panel::{
    EtfDailyRow, LinkTable, PanelRow, apply_lagged_market_cap, assemble_etf_daily, build_esg,
    clean_returns, expand, merge_panel,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stage of a run, reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Loading and screening fundamentals
    Fundamentals,
    /// Resolving fundamentals to securities
    Links,
    /// Projecting fundamentals onto months
    Expand,
    /// Loading and cleaning returns
    Returns,
    /// Building the ESG series
    Esg,
    /// Joining returns, fundamentals and factors
    Merge,
    /// Estimating rolling betas
    Beta,
    /// Lagging market capitalization
    Lag,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fundamentals => "loading fundamentals",
            Self::Links => "resolving links",
            Self::Expand => "expanding fundamentals",
            Self::Returns => "cleaning returns",
            Self::Esg => "building ESG series",
            Self::Merge => "merging panel",
            Self::Beta => "estimating betas",
            Self::Lag => "lagging market cap",
        };
        f.write_str(name)
    }
}

/// Result of [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Panel rows sorted by (security, month)
    pub panel: Vec<PanelRow>,
    /// Distinct monthly factor rows
    pub factors: Vec<FactorRow>,
    /// Step counts
    pub summary: RunSummary,
}

/// Files written by [`PipelineOutput::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    /// Panel table
    pub panel: PathBuf,
    /// Factor table
    pub factors: PathBuf,
    /// JSON run summary
    pub summary: PathBuf,
}

impl PipelineOutput {
    /// Write the panel to `path`, with the factor table and run summary next to it.
    ///
    /// The table format follows the extension of `path`.
    pub fn write(&self, path: &Path, layout: &PanelLayout) -> Result<WrittenFiles> {
        let format = TableFormat::from_path(path)?;
        let mut panel = panel_frame(&self.panel, layout)?;
        write_frame(&mut panel, path, format)?;

        let factors = sibling_path(path, "factors", format.extension());
        write_frame(&mut factor_frame(&self.factors)?, &factors, format)?;

        let summary = sibling_path(path, "summary", ExportFormat::PrettyJson.extension());
        self.summary.export_to_file(&summary, ExportFormat::PrettyJson)?;

        Ok(WrittenFiles {
            panel: path.to_path_buf(),
            factors,
            summary,
        })
    }
}

/// Panel builder for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Output column layout.
    pub fn layout(&self) -> PanelLayout {
        self.config.layout()
    }

    /// Build the panel from `source`.
    pub fn run(&self, source: &dyn TableSource) -> Result<PipelineOutput> {
        self.run_with_progress(source, &mut |_| {})
    }

    /// Build the panel, calling `progress` as each step starts.
    ///
    /// Nothing is persisted; an error aborts the run with no partial output.
    pub fn run_with_progress(
        &self,
        source: &dyn TableSource,
        progress: &mut dyn FnMut(Step),
    ) -> Result<PipelineOutput> {
        let config = &self.config;
        let window = config.window()?;
        let mut summary = RunSummary::default();
        info!(
            variant = %config.variant,
            strategy = %config.strategy,
            start = %config.sample_start,
            end = %config.sample_end,
            "building panel"
        );

        progress(Step::Fundamentals);
        let fundamentals = source.fundamentals(&config.effective_signals())?;
        summary.fundamentals_read = fundamentals.len();
        let fundamentals = window.retain(fundamentals, |f| f.datadate);
        summary.fundamentals_outside_window = summary.fundamentals_read - fundamentals.len();
        let (fundamentals, missing) = require_fundamentals(fundamentals);
        summary.fundamentals_missing_required = missing;
        info!(
            read = summary.fundamentals_read,
            kept = fundamentals.len(),
            "loaded fundamentals"
        );

        progress(Step::Links);
        let links = LinkTable::new(&source.links()?, config.open_link_end);
        let (linked, link_report) =
            links.resolve_all(fundamentals, |f| (f.gvkey, f.datadate), config.link_policy)?;
        summary.links = link_report;

        progress(Step::Expand);
        let monthly = expand(linked, &config.lag);
        summary.monthly_fundamentals = monthly.len();
        info!(rows = monthly.len(), "expanded fundamentals to months");

        progress(Step::Returns);
        let returns = source.returns()?;
        summary.returns_read = returns.len();
        let returns = window.retain(returns, |r| r.date);
        summary.returns_outside_window = summary.returns_read - returns.len();
        let (returns, screened) = clean_returns(returns, &config.delisting, &config.screen());
        summary.returns_screened = screened;
        info!(read = summary.returns_read, kept = returns.len(), "cleaned returns");

        let factors = source.factors()?;
        let market = source.market_index()?;

        let esg = if config.merges_esg() {
            progress(Step::Esg);
            let (records, report) = build_esg(
                source.esg_scores()?,
                source.carbon_intensity()?,
                &source.institutions()?,
                &links,
                config.link_policy,
            )?;
            info!(records = records.len(), "built ESG series");
            summary.esg = Some(report);
            Some(records)
        } else {
            None
        };

        progress(Step::Merge);
        let (mut rows, merge_report) =
            merge_panel(returns, monthly, &factors, &market, esg.as_deref())?;
        summary.merge = merge_report;
        info!(rows = rows.len(), "merged panel");

        if config.computes_beta() {
            progress(Step::Beta);
            summary.beta = Some(assign_betas(&mut rows, &config.beta)?);
        }
        derive_fields(&mut rows, config);

        progress(Step::Lag);
        let panel = apply_lagged_market_cap(rows);
        let factors = factor_table(&panel);
        summary.output_rows = panel.len();
        summary.factor_rows = factors.len();
        summary.log();

        Ok(PipelineOutput {
            panel,
            factors,
            summary,
        })
    }

    /// Assemble the daily ETF table.
    ///
    /// Daily and monthly ETF returns are restricted to the sample window.
    pub fn run_etf(&self, source: &dyn TableSource) -> Result<Vec<EtfDailyRow>> {
        let window = self.config.window()?;
        let daily = window.retain(source.etf_daily()?, |r| r.date);
        let monthly = window.retain(source.etf_monthly()?, |r| r.date);
        let rows = assemble_etf_daily(daily, monthly, &source.factors()?, &self.config.etf)?;
        info!(rows = rows.len(), tickers = ?self.config.etf.tickers, "assembled ETF table");
        Ok(rows)
    }

    /// Load the daily or the monthly factor table, sorted by date.
    pub fn run_factors(
        &self,
        source: &dyn TableSource,
        daily: bool,
    ) -> Result<Vec<DailyFactorObservation>> {
        let mut factors = if daily {
            source.daily_factors()?
        } else {
            source.factors()?
        };
        factors.sort_by_key(|f| f.date);
        info!(rows = factors.len(), daily, "loaded factors");
        Ok(factors)
    }
}

/// Estimate rolling betas on the merged rows.
///
/// Rows are put in (security, month) order first so each security's
/// excess returns form one ordered sequence.
fn assign_betas(rows: &mut [PanelRow], config: &BetaConfig) -> Result<BetaSummary> {
    rows.sort_by_key(|row| (row.permno, row.period));
    let observations: Vec<BetaObservation<SecurityKey>> = rows
        .iter()
        .map(|row| BetaObservation {
            key: row.permno,
            excess_return: row.excess_return(),
            excess_market: row.excess_market(),
        })
        .collect();
    let (betas, summary) = estimate_panel_betas(&observations, config)?;
    for (row, beta) in rows.iter_mut().zip(betas) {
        row.beta = beta;
    }
    info!(
        entities = summary.entities,
        entities_with_beta = summary.entities_with_beta,
        undefined = summary.undefined,
        "estimated betas"
    );
    Ok(summary)
}

fn derive_fields(rows: &mut [PanelRow], config: &PipelineConfig) {
    let profitability = config.computes_profitability();
    let assets = config.carries_assets();
    for row in rows.iter_mut() {
        if profitability {
            row.profit_a = row.gross_profitability();
        }
        if !assets {
            row.at = None;
        }
    }
    debug!(profitability, assets, "derived panel fields");
}
