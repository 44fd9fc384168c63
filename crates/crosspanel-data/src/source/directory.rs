//! Directory of CSV extracts, one file per raw table.
//!
//! Every file carries a header row. Cells follow the rules of
//! [`crate::cell`] in every table.

use super::TableSource;
use crate::cell;
use crate::error::{DataError, Result};
use crate::period::EntityKey;
use crate::records::{
    CarbonRecord, DailyFactorObservation, EsgScoreRecord, EtfReturn, FactorObservation,
    FundamentalObservation, InstitutionLink, LinkRecord, MarketIndexObservation,
    ReturnObservation,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the fundamentals table.
pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";
/// File name of the identifier link table.
pub const LINKS_FILE: &str = "links.csv";
/// File name of the monthly returns table.
pub const RETURNS_FILE: &str = "returns.csv";
/// File name of the monthly factor table.
pub const FACTORS_FILE: &str = "factors.csv";
/// File name of the market index table.
pub const MARKET_FILE: &str = "market.csv";
/// File name of the ESG score table.
pub const ESG_SCORES_FILE: &str = "esg_scores.csv";
/// File name of the carbon intensity table.
pub const CARBON_FILE: &str = "carbon.csv";
/// File name of the institution identifier table.
pub const INSTITUTIONS_FILE: &str = "institutions.csv";
/// File name of the daily ETF returns table.
pub const ETF_DAILY_FILE: &str = "etf_daily.csv";
/// File name of the monthly ETF returns table.
pub const ETF_MONTHLY_FILE: &str = "etf_monthly.csv";
/// File name of the daily factor table.
pub const DAILY_FACTORS_FILE: &str = "factors_daily.csv";

/// Reads raw tables from CSV files in a single directory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    /// Create a source rooted at `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory the tables are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn reader(&self, file: &str) -> Result<csv::Reader<File>> {
        let path = self.dir.join(file);
        debug!(path = %path.display(), "opening table");
        let handle = File::open(&path)?;
        Ok(ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(handle))
    }

    fn read_typed<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let mut reader = self.reader(file)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
        debug!(file, rows = rows.len(), "read table");
        Ok(rows)
    }
}

impl TableSource for CsvSource {
    fn fundamentals(&self, signals: &[String]) -> Result<Vec<FundamentalObservation>> {
        let mut reader = self.reader(FUNDAMENTALS_FILE)?;
        let headers = reader.headers()?.clone();
        let columns = FundamentalColumns::locate(&headers, signals)?;

        let mut observations = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            // header is line 1
            let line = row as u64 + 2;
            observations.push(columns.parse(&record, line)?);
        }
        debug!(rows = observations.len(), "read fundamentals");
        Ok(observations)
    }

    fn links(&self) -> Result<Vec<LinkRecord>> {
        self.read_typed(LINKS_FILE)
    }

    fn returns(&self) -> Result<Vec<ReturnObservation>> {
        self.read_typed(RETURNS_FILE)
    }

    fn factors(&self) -> Result<Vec<FactorObservation>> {
        self.read_typed(FACTORS_FILE)
    }

    fn market_index(&self) -> Result<Vec<MarketIndexObservation>> {
        self.read_typed(MARKET_FILE)
    }

    fn esg_scores(&self) -> Result<Vec<EsgScoreRecord>> {
        self.read_typed(ESG_SCORES_FILE)
    }

    fn carbon_intensity(&self) -> Result<Vec<CarbonRecord>> {
        self.read_typed(CARBON_FILE)
    }

    fn institutions(&self) -> Result<Vec<InstitutionLink>> {
        self.read_typed(INSTITUTIONS_FILE)
    }

    fn etf_daily(&self) -> Result<Vec<EtfReturn>> {
        self.read_typed(ETF_DAILY_FILE)
    }

    fn etf_monthly(&self) -> Result<Vec<EtfReturn>> {
        self.read_typed(ETF_MONTHLY_FILE)
    }

    fn daily_factors(&self) -> Result<Vec<DailyFactorObservation>> {
        self.read_typed(DAILY_FACTORS_FILE)
    }
}

/// Column positions of the fundamentals table.
#[derive(Debug)]
struct FundamentalColumns {
    gvkey: usize,
    datadate: usize,
    at: usize,
    ni: usize,
    prcc_c: usize,
    conm: Option<usize>,
    fyear: Option<usize>,
    signals: Vec<(String, usize)>,
}

impl FundamentalColumns {
    const TABLE: &'static str = "fundamentals";

    fn locate(headers: &StringRecord, signals: &[String]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DataError::MissingColumn {
                table: Self::TABLE.to_string(),
                column: name.to_string(),
            })
        };

        let signals = signals
            .iter()
            .map(|name| require(name).map(|idx| (name.clone(), idx)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            gvkey: require("gvkey")?,
            datadate: require("datadate")?,
            at: require("at")?,
            ni: require("ni")?,
            prcc_c: require("prcc_c")?,
            conm: find("conm"),
            fyear: find("fyear"),
            signals,
        })
    }

    fn parse(&self, record: &StringRecord, line: u64) -> Result<FundamentalObservation> {
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let number = |idx: usize, name: &str| {
            cell::parse_number(field(idx))
                .map_err(|reason| parse_error(Self::TABLE, line, name, reason))
        };

        let gvkey = cell::parse_identifier(field(self.gvkey))
            .map_err(|reason| parse_error(Self::TABLE, line, "gvkey", reason))?;
        let datadate = cell::parse_date(field(self.datadate))
            .map_err(|reason| parse_error(Self::TABLE, line, "datadate", reason))?;

        let conm = self
            .conm
            .map(field)
            .filter(|s| !cell::is_missing(s))
            .map(str::to_string);
        let fyear = match self.fyear {
            Some(idx) => cell::parse_code(field(idx))
                .map_err(|reason| parse_error(Self::TABLE, line, "fyear", reason))?,
            None => None,
        };

        let mut signals = BTreeMap::new();
        for (name, idx) in &self.signals {
            signals.insert(name.clone(), number(*idx, name)?);
        }

        Ok(FundamentalObservation {
            gvkey: EntityKey(gvkey),
            datadate,
            at: number(self.at, "at")?,
            ni: number(self.ni, "ni")?,
            prcc_c: number(self.prcc_c, "prcc_c")?,
            conm,
            fyear,
            signals,
        })
    }
}

fn parse_error(table: &str, line: u64, column: &str, reason: String) -> DataError {
    DataError::Parse {
        table: table.to_string(),
        line,
        reason: format!("column {column}: {reason}"),
    }
}
