//! Input screens applied before any transform.

use crate::error::{DataError, Result};
use crate::records::FundamentalObservation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inclusive calendar window the sample is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleWindow {
    /// First date in the sample
    pub start: NaiveDate,
    /// Last date in the sample
    pub end: NaiveDate,
}

impl SampleWindow {
    /// Create a window, rejecting an inverted range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Whether `date` falls inside the window (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Keep the items whose date falls inside the window.
    pub fn retain<T>(&self, items: Vec<T>, date: impl Fn(&T) -> NaiveDate) -> Vec<T> {
        let before = items.len();
        let kept: Vec<T> = items.into_iter().filter(|item| self.contains(date(item))).collect();
        debug!(
            dropped = before - kept.len(),
            kept = kept.len(),
            "applied sample window {}..={}",
            self.start,
            self.end
        );
        kept
    }
}

/// Drop fundamentals lacking assets, net income or price.
///
/// Returns the retained observations and the number dropped.
pub fn require_fundamentals(
    observations: Vec<FundamentalObservation>,
) -> (Vec<FundamentalObservation>, usize) {
    let before = observations.len();
    let kept: Vec<_> = observations
        .into_iter()
        .filter(FundamentalObservation::has_required_fields)
        .collect();
    let dropped = before - kept.len();
    debug!(dropped, kept = kept.len(), "required fundamentals screen");
    (kept, dropped)
}
