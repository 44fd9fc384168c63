//! Run configuration.

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use crosspanel_beta::BetaConfig;
use crosspanel_data::SampleWindow;
use crosspanel_output::{PanelLayout, SignalColumn};
use crosspanel_panel::{
    DelistingPolicy, EtfConfig, LagConfig, LinkPolicy, ShareScreen, default_open_end,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Signals the full panel always loads.
pub const FULL_SIGNALS: [&str; 3] = ["ceq", "revt", "cogs"];

/// Which panel to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Columns needed by one strategy
    #[default]
    Compact,
    /// Every derived column plus ESG data
    Full,
}

impl FromStr for Variant {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(PipelineError::Config(format!("unknown variant '{other}'"))),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Strategy the compact panel is built for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Strategy {
    /// Book-to-market; `ceq` is written as `be`
    #[default]
    Value,
    /// Gross profitability and beta; carries `at`
    Quality,
    /// Asset growth; carries `at`
    AssetGrowth,
    /// Any other strategy, using the requested signals as-is
    Other(String),
}

impl Strategy {
    /// Whether total assets are carried.
    pub const fn carries_assets(&self) -> bool {
        matches!(self, Self::Quality | Self::AssetGrowth)
    }
}

impl From<String> for Strategy {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Value" => Self::Value,
            "Quality" => Self::Quality,
            "AssetGrowth" => Self::AssetGrowth,
            _ => Self::Other(s),
        }
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.to_string()
    }
}

impl FromStr for Strategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "Value"),
            Self::Quality => write!(f, "Quality"),
            Self::AssetGrowth => write!(f, "AssetGrowth"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Everything a run needs besides its input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First fundamentals and return date in the sample
    pub sample_start: NaiveDate,
    /// Last fundamentals and return date in the sample
    pub sample_end: NaiveDate,
    /// End date given to links without one
    pub open_link_end: NaiveDate,
    /// Panel variant
    pub variant: Variant,
    /// Strategy of a compact panel
    pub strategy: Strategy,
    /// Extra signal fields loaded from the fundamentals
    pub signals: Vec<String>,
    /// Reporting lag and persistence
    pub lag: LagConfig,
    /// Delisting replacement returns
    pub delisting: DelistingPolicy,
    /// Rolling beta window policy
    pub beta: BetaConfig,
    /// Handling of observations covered by several links
    pub link_policy: LinkPolicy,
    /// Share codes retained
    pub share_codes: Vec<i32>,
    /// Exchange codes retained
    pub exchange_codes: Vec<i32>,
    /// ETF time-series tickers
    pub etf: EtfConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let screen = ShareScreen::default();
        Self {
            sample_start: NaiveDate::from_ymd_opt(1963, 1, 1).unwrap_or(NaiveDate::MIN),
            sample_end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or(NaiveDate::MAX),
            open_link_end: default_open_end(),
            variant: Variant::Compact,
            strategy: Strategy::Value,
            signals: vec!["ceq".to_string()],
            lag: LagConfig::default(),
            delisting: DelistingPolicy::default(),
            beta: BetaConfig::default(),
            link_policy: LinkPolicy::default(),
            share_codes: screen.share_codes,
            exchange_codes: screen.exchange_codes,
            etf: EtfConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a configuration from a JSON file; absent fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.sample_start > self.sample_end {
            return Err(PipelineError::Config(format!(
                "sample_start {} is after sample_end {}",
                self.sample_start, self.sample_end
            )));
        }
        self.lag.validate()?;
        if self.share_codes.is_empty() || self.exchange_codes.is_empty() {
            return Err(PipelineError::Config(
                "share_codes and exchange_codes must not be empty".to_string(),
            ));
        }
        self.beta.validate()?;
        Ok(())
    }

    /// Inclusive sample window.
    pub fn window(&self) -> Result<SampleWindow> {
        Ok(SampleWindow::new(self.sample_start, self.sample_end)?)
    }

    /// Share and exchange code screen.
    pub fn screen(&self) -> ShareScreen {
        ShareScreen {
            share_codes: self.share_codes.clone(),
            exchange_codes: self.exchange_codes.clone(),
        }
    }

    /// Signal fields loaded from the fundamentals, without duplicates.
    pub fn effective_signals(&self) -> Vec<String> {
        let mut signals: Vec<String> = match self.variant {
            Variant::Full => FULL_SIGNALS.iter().map(|s| s.to_string()).collect(),
            Variant::Compact => Vec::new(),
        };
        for signal in &self.signals {
            if !signals.contains(signal) {
                signals.push(signal.clone());
            }
        }
        signals
    }

    /// Whether rolling betas are estimated.
    pub fn computes_beta(&self) -> bool {
        self.variant == Variant::Full || self.strategy == Strategy::Quality
    }

    /// Whether gross profitability is derived.
    pub fn computes_profitability(&self) -> bool {
        self.computes_beta()
    }

    /// Whether total assets are carried.
    pub fn carries_assets(&self) -> bool {
        self.variant == Variant::Full || self.strategy.carries_assets()
    }

    /// Whether ESG and carbon data are merged.
    pub fn merges_esg(&self) -> bool {
        self.variant == Variant::Full
    }

    /// Whether `ceq` is written as `be`.
    pub fn renames_book_equity(&self) -> bool {
        self.variant == Variant::Full || self.strategy == Strategy::Value
    }

    /// Output column layout.
    pub fn layout(&self) -> PanelLayout {
        let rename = self.renames_book_equity();
        PanelLayout {
            include_at: self.carries_assets(),
            signals: self
                .effective_signals()
                .into_iter()
                .map(|s| {
                    if rename && s == "ceq" {
                        SignalColumn::renamed(s, "be")
                    } else {
                        SignalColumn::same(s)
                    }
                })
                .collect(),
            include_profit_a: self.computes_profitability(),
            include_beta: self.computes_beta(),
            include_esg: self.merges_esg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspanel_panel::PanelError;
    use rstest::rstest;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.open_link_end, NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
        assert_eq!(config.share_codes, vec![10, 11, 12]);
        assert_eq!(config.exchange_codes, vec![1, 2, 3]);
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let config = PipelineConfig {
            sample_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            sample_end: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_invalid_beta_window_is_rejected() {
        let config = PipelineConfig {
            beta: BetaConfig {
                min_observations: 80,
                ..BetaConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Beta(_))));
    }

    #[test]
    fn test_invalid_lag_is_rejected() {
        let config = PipelineConfig {
            lag: LagConfig {
                persistence: 0,
                ..LagConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Panel(PanelError::InvalidConfig(_)))
        ));
    }

    #[rstest]
    #[case(Strategy::Value, false, false, true)]
    #[case(Strategy::Quality, true, true, false)]
    #[case(Strategy::AssetGrowth, true, false, false)]
    #[case(Strategy::Other("Momentum".to_string()), false, false, false)]
    fn test_compact_columns(
        #[case] strategy: Strategy,
        #[case] at: bool,
        #[case] beta: bool,
        #[case] be: bool,
    ) {
        let config = PipelineConfig {
            strategy,
            ..PipelineConfig::default()
        };
        let layout = config.layout();
        assert_eq!(layout.include_at, at);
        assert_eq!(layout.include_beta, beta);
        assert_eq!(layout.include_profit_a, beta);
        assert!(!layout.include_esg);
        assert_eq!(layout.signals[0].name == "be", be);
    }

    #[test]
    fn test_full_variant_adds_signals() {
        let config = PipelineConfig {
            variant: Variant::Full,
            strategy: Strategy::Other("Anything".to_string()),
            signals: vec!["revt".to_string(), "xrd".to_string()],
            ..PipelineConfig::default()
        };
        assert_eq!(config.effective_signals(), vec!["ceq", "revt", "cogs", "xrd"]);
        let names = config.layout().column_names();
        let tail: Vec<&str> = names[21..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "at", "be", "revt", "cogs", "xrd", "profitA", "beta", "ESG_score", "E_score",
                "S_score", "G_score", "carbon_intensity"
            ]
        );
    }

    #[test]
    fn test_json_round_trip_and_partial_input() {
        let config = PipelineConfig {
            strategy: Strategy::AssetGrowth,
            variant: Variant::Full,
            ..PipelineConfig::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"AssetGrowth\""));
        assert!(json.contains("\"full\""));
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: PipelineConfig =
            serde_json::from_str(r#"{"strategy": "Quality", "signals": ["revt", "cogs"]}"#).unwrap();
        assert_eq!(partial.strategy, Strategy::Quality);
        assert_eq!(partial.beta, BetaConfig::default());
    }

    #[test]
    fn test_parse_variant_and_strategy() {
        assert_eq!("FULL".parse::<Variant>().unwrap(), Variant::Full);
        assert!("wide".parse::<Variant>().is_err());
        assert_eq!("Quality".parse::<Strategy>().unwrap(), Strategy::Quality);
        assert_eq!(
            "Size".parse::<Strategy>().unwrap(),
            Strategy::Other("Size".to_string())
        );
    }
}
