//! Delisting-return adjustment.

use serde::{Deserialize, Serialize};

/// Exchange codes treated as NYSE or NASDAQ.
const NYSE_NASDAQ: [i32; 2] = [1, 2];
/// Exchange code of AMEX.
const AMEX: i32 = 3;

/// Replacement values for missing delisting returns.
///
/// A performance-related delisting (code 500 or 520 to 584) with no recorded
/// delisting return is assigned `nyse_nasdaq_replacement` on exchanges 1 and 2
/// and `amex_replacement` on exchange 3. Delisting returns below `floor` are
/// clamped to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelistingPolicy {
    /// Replacement on NYSE and NASDAQ
    pub nyse_nasdaq_replacement: f64,
    /// Replacement on AMEX
    pub amex_replacement: f64,
    /// Lowest admissible delisting return
    pub floor: f64,
}

impl Default for DelistingPolicy {
    fn default() -> Self {
        Self {
            nyse_nasdaq_replacement: -0.35,
            amex_replacement: -0.55,
            floor: -1.0,
        }
    }
}

impl DelistingPolicy {
    /// Whether a delisting code signals a performance-related delisting.
    pub const fn is_performance_delisting(code: i32) -> bool {
        code == 500 || (code >= 520 && code <= 584)
    }

    /// Delisting return after replacement and clamping; `0.0` when none applies.
    ///
    /// A non-finite `dlret` counts as missing.
    pub fn delisting_return(
        &self,
        dlstcd: Option<i32>,
        dlret: Option<f64>,
        exchcd: Option<i32>,
    ) -> f64 {
        let dlret = dlret.filter(|v| v.is_finite());
        let performance = dlstcd.is_some_and(Self::is_performance_delisting);
        let replaced = match (dlret, exchcd) {
            (Some(value), _) => Some(value),
            (None, Some(exchange)) if performance && NYSE_NASDAQ.contains(&exchange) => {
                Some(self.nyse_nasdaq_replacement)
            }
            (None, Some(AMEX)) if performance => Some(self.amex_replacement),
            (None, _) => None,
        };
        replaced.map_or(0.0, |value| value.max(self.floor))
    }

    /// Combine a raw return with its delisting return.
    ///
    /// A missing raw return is replaced by the delisting return when that is
    /// non-zero, and stays missing otherwise. Non-finite inputs count as missing.
    pub fn adjust(
        &self,
        ret: Option<f64>,
        dlstcd: Option<i32>,
        dlret: Option<f64>,
        exchcd: Option<i32>,
    ) -> Option<f64> {
        let delisting = self.delisting_return(dlstcd, dlret, exchcd);
        match ret.filter(|v| v.is_finite()) {
            Some(raw) => Some(raw + delisting),
            None if delisting != 0.0 => Some(delisting),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(500, true)]
    #[case(519, false)]
    #[case(520, true)]
    #[case(551, true)]
    #[case(584, true)]
    #[case(585, false)]
    #[case(100, false)]
    fn test_performance_codes(#[case] code: i32, #[case] expected: bool) {
        assert_eq!(DelistingPolicy::is_performance_delisting(code), expected);
    }

    #[rstest]
    #[case(1, -0.35)]
    #[case(2, -0.35)]
    #[case(3, -0.55)]
    #[case(4, 0.0)]
    fn test_replacement_by_exchange(#[case] exchcd: i32, #[case] expected: f64) {
        let policy = DelistingPolicy::default();
        assert_relative_eq!(
            policy.delisting_return(Some(520), None, Some(exchcd)),
            expected
        );
    }

    #[test]
    fn test_nyse_replacement_added_to_return() {
        let policy = DelistingPolicy::default();
        let adjusted = policy.adjust(Some(-0.10), Some(520), None, Some(1)).unwrap();
        assert_relative_eq!(adjusted, -0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_amex_replacement_without_return() {
        let policy = DelistingPolicy::default();
        let adjusted = policy.adjust(None, Some(580), None, Some(3)).unwrap();
        assert_relative_eq!(adjusted, -0.55);
    }

    #[test]
    fn test_observed_delisting_return_is_kept() {
        let policy = DelistingPolicy::default();
        assert_relative_eq!(policy.delisting_return(Some(520), Some(-0.2), Some(1)), -0.2);
        let adjusted = policy.adjust(Some(0.05), Some(331), Some(0.1), Some(1)).unwrap();
        assert_relative_eq!(adjusted, 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_floor_clamps_delisting_return() {
        let policy = DelistingPolicy::default();
        assert_relative_eq!(policy.delisting_return(Some(560), Some(-1.5), Some(1)), -1.0);

        let harsh = DelistingPolicy {
            nyse_nasdaq_replacement: -1.2,
            ..DelistingPolicy::default()
        };
        assert_relative_eq!(harsh.delisting_return(Some(500), None, Some(2)), -1.0);
    }

    #[test]
    fn test_no_delisting_leaves_return() {
        let policy = DelistingPolicy::default();
        assert_eq!(policy.adjust(Some(0.03), None, None, Some(1)), Some(0.03));
        assert_eq!(policy.adjust(None, None, None, Some(1)), None);
        // non-performance delisting without a return contributes nothing
        assert_eq!(policy.adjust(None, Some(231), None, Some(1)), None);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::NEG_INFINITY)]
    fn test_non_finite_delisting_return_is_missing(#[case] dlret: f64) {
        let policy = DelistingPolicy::default();
        assert_eq!(policy.delisting_return(None, Some(dlret), Some(1)), 0.0);
        assert_eq!(policy.adjust(Some(0.02), None, Some(dlret), Some(1)), Some(0.02));
        // a performance delisting still gets its replacement
        let adjusted = policy.adjust(Some(0.02), Some(520), Some(dlret), Some(1)).unwrap();
        assert_relative_eq!(adjusted, -0.33, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_return_is_missing() {
        let policy = DelistingPolicy::default();
        assert_eq!(policy.adjust(Some(f64::NAN), None, None, Some(1)), None);
        assert_relative_eq!(
            policy.adjust(Some(f64::NAN), Some(580), None, Some(3)).unwrap(),
            -0.55
        );
    }
}
