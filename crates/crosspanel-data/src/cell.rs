//! Decoding of individual table cells.
//!
//! Every table source applies the same cell rules: an empty cell or one of
//! [`MISSING_MARKERS`] is missing, non-finite numbers are missing, integer
//! codes and identifiers may be spelled as floats (`520.0`), and dates are ISO
//! `YYYY-MM-DD` with any trailing time component ignored.
//!
//! The `deserialize_*` functions plug these rules into serde record types via
//! `#[serde(deserialize_with = "...")]`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::Error as _};

/// Cell values read as missing in addition to the empty string.
pub const MISSING_MARKERS: [&str; 4] = ["NA", "NaN", "nan", "."];

/// Whether a trimmed cell holds no value.
pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// A floating-point value; missing and non-finite cells give `None`.
pub fn parse_number(cell: &str) -> Result<Option<f64>, String> {
    if is_missing(cell) {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(|v| v.is_finite().then_some(v))
        .map_err(|e| format!("{e} ({cell:?})"))
}

/// An integer code such as a share or exchange code; missing cells give `None`.
pub fn parse_code(cell: &str) -> Result<Option<i32>, String> {
    if is_missing(cell) {
        return Ok(None);
    }
    let value = parse_integer(cell)?;
    i32::try_from(value)
        .map(Some)
        .map_err(|_| format!("code out of range ({cell:?})"))
}

/// A required integer identifier, accepting zero-padded (`001004`) and float
/// (`1004.0`) spellings.
pub fn parse_identifier(cell: &str) -> Result<i64, String> {
    if is_missing(cell) {
        return Err("missing identifier".to_string());
    }
    parse_integer(cell)
}

fn parse_integer(cell: &str) -> Result<i64, String> {
    if let Ok(value) = cell.parse::<i64>() {
        return Ok(value);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 2f64.powi(53) => Ok(v as i64),
        _ => Err(format!("invalid integer {cell:?}")),
    }
}

/// A required calendar date.
pub fn parse_date(cell: &str) -> Result<NaiveDate, String> {
    let day = cell.get(..10).unwrap_or(cell);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("{e} ({cell:?})"))
}

/// An optional calendar date; missing cells give `None`.
pub fn parse_optional_date(cell: &str) -> Result<Option<NaiveDate>, String> {
    if is_missing(cell) {
        return Ok(None);
    }
    parse_date(cell).map(Some)
}

fn raw_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let cell = Option::<String>::deserialize(deserializer)?;
    Ok(cell.map(|s| s.trim().to_string()).unwrap_or_default())
}

/// `Option<f64>` field under the shared cell rules.
pub fn deserialize_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    parse_number(&raw_cell(deserializer)?).map_err(D::Error::custom)
}

/// `Option<i32>` code field under the shared cell rules.
pub fn deserialize_code<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i32>, D::Error> {
    parse_code(&raw_cell(deserializer)?).map_err(D::Error::custom)
}

/// Identifier field (`i64` or a key newtype) under the shared cell rules.
pub fn deserialize_identifier<'de, D, K>(deserializer: D) -> Result<K, D::Error>
where
    D: Deserializer<'de>,
    K: From<i64>,
{
    parse_identifier(&raw_cell(deserializer)?)
        .map(K::from)
        .map_err(D::Error::custom)
}

/// Required date field under the shared cell rules.
pub fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    parse_date(&raw_cell(deserializer)?).map_err(D::Error::custom)
}

/// Optional date field under the shared cell rules.
pub fn deserialize_optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    parse_optional_date(&raw_cell(deserializer)?).map_err(D::Error::custom)
}
