//! Monthly periods and identifier newtypes.
//!
//! A [`Period`] is a calendar month stored as a month ordinal
//! (`year * 12 + month - 1`), so month arithmetic is plain integer arithmetic
//! and ordering matches calendar order.

use crate::error::DataError;
use chrono::{Datelike, NaiveDate};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Internal identifier of a company's fundamentals record series (gvkey).
#[derive(
    Debug,
    Display,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct EntityKey(pub i64);

/// Identifier of a tradeable security (permno).
#[derive(
    Debug,
    Display,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct SecurityKey(pub i64);

/// A calendar month.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(i32);

impl Period {
    /// Build a period from a year and a one-based month.
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month == 0 || month > 12 {
            return None;
        }
        Some(Self(year * 12 + month as i32 - 1))
    }

    /// Build a period directly from its month ordinal.
    pub const fn from_ordinal(ordinal: i32) -> Self {
        Self(ordinal)
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year() * 12 + date.month0() as i32)
    }

    /// Month ordinal (`year * 12 + month - 1`).
    pub const fn ordinal(self) -> i32 {
        self.0
    }

    /// Calendar year.
    pub const fn year(self) -> i32 {
        self.0.div_euclid(12)
    }

    /// One-based calendar month.
    pub const fn month(self) -> u32 {
        (self.0.rem_euclid(12) + 1) as u32
    }

    /// First calendar day of the month, `None` outside chrono's date range.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1)
    }

    /// The following month.
    pub const fn succ(self) -> Self {
        Self(self.0 + 1)
    }

    /// The preceding month.
    pub const fn pred(self) -> Self {
        Self(self.0 - 1)
    }
}

impl Add<i32> for Period {
    type Output = Self;

    fn add(self, months: i32) -> Self {
        Self(self.0 + months)
    }
}

impl Sub<i32> for Period {
    type Output = Self;

    fn sub(self, months: i32) -> Self {
        Self(self.0 - months)
    }
}

impl Sub for Period {
    type Output = i32;

    /// Signed distance in months.
    fn sub(self, other: Self) -> i32 {
        self.0 - other.0
    }
}

impl From<NaiveDate> for Period {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DataError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Period {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_date_ignores_day() {
        assert_eq!(
            Period::from_date(date(2020, 3, 1)),
            Period::from_date(date(2020, 3, 31))
        );
        assert_eq!(Period::from_date(date(2020, 3, 31)), Period::new(2020, 3).unwrap());
    }

    #[test]
    fn test_arithmetic_crosses_year_boundary() {
        let nov = Period::new(2019, 11).unwrap();
        let may = nov + 6;
        assert_eq!(may.year(), 2020);
        assert_eq!(may.month(), 5);
        assert_eq!(may - nov, 6);
        assert_eq!(may - 6, nov);
        assert_eq!(Period::new(2020, 1).unwrap().pred(), Period::new(2019, 12).unwrap());
        assert_eq!(Period::new(2019, 12).unwrap().succ(), Period::new(2020, 1).unwrap());
    }

    #[test]
    fn test_display_and_parse() {
        let p = Period::new(1999, 7).unwrap();
        assert_eq!(p.to_string(), "1999-07");
        assert_eq!("1999-07".parse::<Period>().unwrap(), p);
        assert!("1999-13".parse::<Period>().is_err());
        assert!("199907".parse::<Period>().is_err());
    }

    #[test]
    fn test_first_day() {
        let p = Period::new(2024, 2).unwrap();
        assert_eq!(p.first_day(), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_string_conversion() {
        let p = Period::new(2001, 10).unwrap();
        let s = String::from(p);
        assert_eq!(s, "2001-10");
        assert_eq!(Period::try_from(s).unwrap(), p);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(EntityKey(1004).to_string(), "1004");
        assert_eq!(SecurityKey::from(10001).0, 10001);
    }
}
