//! Simple linear regression with an intercept.
//!
//! For regressor `x` and response `y`:
//!
//! slope = Σ(x - x̄)(y - ȳ) / Σ(x - x̄)²
//! intercept = ȳ - slope · x̄

use ndarray::ArrayView1;

/// Relative variance threshold below which a regressor is treated as constant.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Coefficients of a fitted `y = intercept + slope · x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsFit {
    /// Intercept
    pub intercept: f64,
    /// Slope coefficient
    pub slope: f64,
    /// Observations used
    pub nobs: usize,
}

/// Fit `y` on `x` with [`DEFAULT_TOLERANCE`].
pub fn fit_ols(x: &ArrayView1<'_, f64>, y: &ArrayView1<'_, f64>) -> Option<OlsFit> {
    fit_ols_with_tolerance(x, y, DEFAULT_TOLERANCE)
}

/// Fit `y` on `x`.
///
/// Returns `None` when the inputs differ in length, hold fewer than two
/// observations, contain non-finite values, or when the centred sum of
/// squares of `x` is at most `tolerance` times its raw sum of squares.
pub fn fit_ols_with_tolerance(
    x: &ArrayView1<'_, f64>,
    y: &ArrayView1<'_, f64>,
    tolerance: f64,
) -> Option<OlsFit> {
    let nobs = x.len();
    if nobs != y.len() || nobs < 2 {
        return None;
    }
    if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
        return None;
    }

    let x_mean = x.mean()?;
    let y_mean = y.mean()?;

    let (sxx, sxy) = x
        .iter()
        .zip(y.iter())
        .fold((0.0, 0.0), |(sxx, sxy), (&xi, &yi)| {
            let dx = xi - x_mean;
            (sxx + dx * dx, sxy + dx * (yi - y_mean))
        });
    let raw = x.dot(x);
    if sxx <= tolerance * raw || sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(OlsFit {
        intercept: y_mean - slope * x_mean,
        slope,
        nobs,
    })
}
