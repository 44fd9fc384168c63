//! Window policy and the per-security beta kernel.

use crate::error::{BetaError, Result};
use crate::ols::fit_ols_with_tolerance;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Minimum-sample and maximum-window policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaConfig {
    /// Complete observations a window needs before a beta is reported
    /// (default: 20)
    pub min_observations: usize,
    /// Longest window; beyond it the window rolls (default: 60)
    pub max_window: usize,
    /// Relative regressor variance treated as zero (default: 1e-12)
    pub degeneracy_tolerance: f64,
}

impl Default for BetaConfig {
    fn default() -> Self {
        Self {
            min_observations: 20,
            max_window: 60,
            degeneracy_tolerance: crate::ols::DEFAULT_TOLERANCE,
        }
    }
}

impl BetaConfig {
    /// Check the window policy is consistent.
    pub fn validate(&self) -> Result<()> {
        if self.max_window == 0 {
            return Err(BetaError::InvalidConfig("max_window must be positive".to_string()));
        }
        if self.min_observations < 2 {
            return Err(BetaError::InvalidConfig(format!(
                "min_observations must be at least 2, got {}",
                self.min_observations
            )));
        }
        if self.min_observations > self.max_window {
            return Err(BetaError::InvalidConfig(format!(
                "min_observations ({}) exceeds max_window ({})",
                self.min_observations, self.max_window
            )));
        }
        if !(self.degeneracy_tolerance >= 0.0 && self.degeneracy_tolerance.is_finite()) {
            return Err(BetaError::InvalidConfig(format!(
                "degeneracy_tolerance must be finite and non-negative, got {}",
                self.degeneracy_tolerance
            )));
        }
        Ok(())
    }

    /// Window length used for a security with `len` observations.
    pub fn window_for(&self, len: usize) -> usize {
        len.min(self.max_window)
    }
}

/// Betas for one security's period-ordered `(excess return, excess market)` pairs.
///
/// The output has one entry per input pair. Each beta uses only pairs up to
/// and including its own period. A security with fewer pairs than
/// `min_observations` gets no betas. Otherwise the window grows from the
/// first pair up to `max_window` pairs and then rolls. Pairs with a missing
/// component are skipped inside the window, and a window with fewer than
/// `min_observations` complete pairs or a degenerate regressor yields `None`.
pub fn rolling_betas(pairs: &[(Option<f64>, Option<f64>)], config: &BetaConfig) -> Vec<Option<f64>> {
    let len = pairs.len();
    if len < config.min_observations {
        return vec![None; len];
    }
    let window = config.window_for(len);

    (0..len)
        .map(|t| {
            let start = (t + 1).saturating_sub(window);
            let (y, x): (Vec<f64>, Vec<f64>) = pairs[start..=t]
                .iter()
                .filter_map(|&(y, x)| Some((y?, x?)))
                .unzip();
            if y.len() < config.min_observations {
                return None;
            }
            let x = Array1::from(x);
            let y = Array1::from(y);
            fit_ols_with_tolerance(&x.view(), &y.view(), config.degeneracy_tolerance)
                .map(|fit| fit.slope)
        })
        .collect()
}
