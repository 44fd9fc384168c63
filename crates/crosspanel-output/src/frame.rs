//! Columnar layouts of panel, factor, ETF and daily-factor tables.

use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use crosspanel_data::{DailyFactorObservation, Period};
use crosspanel_panel::{EtfDailyRow, PanelRow};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Column names of the fixed panel prefix, in output order.
pub const PANEL_BASE_COLUMNS: [&str; 21] = [
    "permno", "ticker", "conm", "ldate", "daret", "retx", "vol", "shrout", "prc", "shrcd",
    "exchcd", "me", "me_lagged", "vwretd", "rf", "mktrf", "smb", "hml", "umd", "rmw", "cma",
];

/// Column names of the ESG group, in output order.
pub const ESG_COLUMNS: [&str; 5] = ["ESG_score", "E_score", "S_score", "G_score", "carbon_intensity"];

/// Column names of the factor table, in output order.
pub const FACTOR_COLUMNS: [&str; 8] = ["ldate", "rf", "mktrf", "smb", "hml", "umd", "rmw", "cma"];

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn date_series(name: &str, dates: impl Iterator<Item = Option<NaiveDate>>) -> Result<Column> {
    let days: Vec<Option<i32>> = dates.map(|d| d.map(days_since_epoch)).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?.into())
}

fn f64_column<T>(name: &str, rows: &[T], field: impl Fn(&T) -> Option<f64>) -> Column {
    let values: Vec<Option<f64>> = rows.iter().map(field).collect();
    Series::new(name.into(), values).into()
}

/// A signal field and the column it is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalColumn {
    /// Field name in the fundamentals
    pub source: String,
    /// Output column name
    pub name: String,
}

impl SignalColumn {
    /// Signal written under its own name.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            name,
        }
    }

    /// Signal written under another name.
    pub fn renamed(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

/// Optional column groups of the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelLayout {
    /// Write total assets
    pub include_at: bool,
    /// Signal columns, in output order
    pub signals: Vec<SignalColumn>,
    /// Write gross profitability
    pub include_profit_a: bool,
    /// Write the rolling beta
    pub include_beta: bool,
    /// Write the ESG and carbon columns
    pub include_esg: bool,
}

impl PanelLayout {
    /// Output column names in order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = PANEL_BASE_COLUMNS.iter().map(|s| s.to_string()).collect();
        if self.include_at {
            names.push("at".to_string());
        }
        names.extend(self.signals.iter().map(|s| s.name.clone()));
        if self.include_profit_a {
            names.push("profitA".to_string());
        }
        if self.include_beta {
            names.push("beta".to_string());
        }
        if self.include_esg {
            names.extend(ESG_COLUMNS.iter().map(|s| s.to_string()));
        }
        names
    }
}

/// Build the panel frame with the columns of `layout`.
pub fn panel_frame(rows: &[PanelRow], layout: &PanelLayout) -> Result<DataFrame> {
    let permno: Vec<i64> = rows.iter().map(|r| r.permno.0).collect();
    let ticker: Vec<Option<&str>> = rows.iter().map(|r| r.ticker.as_deref()).collect();
    let conm: Vec<Option<&str>> = rows.iter().map(|r| r.conm.as_deref()).collect();
    let shrcd: Vec<Option<i32>> = rows.iter().map(|r| r.shrcd).collect();
    let exchcd: Vec<Option<i32>> = rows.iter().map(|r| r.exchcd).collect();

    let mut columns: Vec<Column> = vec![
        Series::new("permno".into(), permno).into(),
        Series::new("ticker".into(), ticker).into(),
        Series::new("conm".into(), conm).into(),
        date_series("ldate", rows.iter().map(PanelRow::ldate))?,
        f64_column("daret", rows, |r| r.daret),
        f64_column("retx", rows, |r| r.retx),
        f64_column("vol", rows, |r| r.vol),
        f64_column("shrout", rows, |r| r.shrout),
        f64_column("prc", rows, |r| r.prc),
        Series::new("shrcd".into(), shrcd).into(),
        Series::new("exchcd".into(), exchcd).into(),
        f64_column("me", rows, |r| r.me),
        f64_column("me_lagged", rows, |r| r.me_lagged),
        f64_column("vwretd", rows, |r| r.vwretd),
        f64_column("rf", rows, |r| r.rf),
        f64_column("mktrf", rows, |r| r.mktrf),
        f64_column("smb", rows, |r| r.smb),
        f64_column("hml", rows, |r| r.hml),
        f64_column("umd", rows, |r| r.umd),
        f64_column("rmw", rows, |r| r.rmw),
        f64_column("cma", rows, |r| r.cma),
    ];

    if layout.include_at {
        columns.push(f64_column("at", rows, |r| r.at));
    }
    for signal in &layout.signals {
        columns.push(f64_column(&signal.name, rows, |r| r.signal(&signal.source)));
    }
    if layout.include_profit_a {
        columns.push(f64_column("profitA", rows, |r| r.profit_a));
    }
    if layout.include_beta {
        columns.push(f64_column("beta", rows, |r| r.beta));
    }
    if layout.include_esg {
        columns.extend([
            f64_column("ESG_score", rows, |r| r.esg_score),
            f64_column("E_score", rows, |r| r.e_score),
            f64_column("S_score", rows, |r| r.s_score),
            f64_column("G_score", rows, |r| r.g_score),
            f64_column("carbon_intensity", rows, |r| r.carbon_intensity),
        ]);
    }

    Ok(DataFrame::new(columns)?)
}

/// One month of the factor table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRow {
    /// Month
    pub period: Period,
    /// Risk-free rate
    pub rf: Option<f64>,
    /// Market excess return
    pub mktrf: Option<f64>,
    /// Size factor
    pub smb: Option<f64>,
    /// Value factor
    pub hml: Option<f64>,
    /// Momentum factor
    pub umd: Option<f64>,
    /// Profitability factor
    pub rmw: Option<f64>,
    /// Investment factor
    pub cma: Option<f64>,
}

impl FactorRow {
    const fn from_panel(row: &PanelRow) -> Self {
        Self {
            period: row.period,
            rf: row.rf,
            mktrf: row.mktrf,
            smb: row.smb,
            hml: row.hml,
            umd: row.umd,
            rmw: row.rmw,
            cma: row.cma,
        }
    }

    fn bits(&self) -> (Period, [Option<u64>; 7]) {
        let bits = |v: Option<f64>| v.map(f64::to_bits);
        (
            self.period,
            [
                bits(self.rf),
                bits(self.mktrf),
                bits(self.smb),
                bits(self.hml),
                bits(self.umd),
                bits(self.rmw),
                bits(self.cma),
            ],
        )
    }
}

/// Distinct factor rows of a panel, sorted by month.
///
/// Rows are compared on every field. The first occurrence is kept and the
/// sort is stable, so a month with conflicting factor values keeps them in
/// panel order.
pub fn factor_table(rows: &[PanelRow]) -> Vec<FactorRow> {
    let mut seen = HashSet::new();
    let mut factors: Vec<FactorRow> = rows
        .iter()
        .map(FactorRow::from_panel)
        .filter(|f| seen.insert(f.bits()))
        .collect();
    factors.sort_by_key(|f| f.period);
    factors
}

/// Build the factor frame.
pub fn factor_frame(factors: &[FactorRow]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        date_series("ldate", factors.iter().map(|f| f.period.first_day()))?,
        f64_column("rf", factors, |f| f.rf),
        f64_column("mktrf", factors, |f| f.mktrf),
        f64_column("smb", factors, |f| f.smb),
        f64_column("hml", factors, |f| f.hml),
        f64_column("umd", factors, |f| f.umd),
        f64_column("rmw", factors, |f| f.rmw),
        f64_column("cma", factors, |f| f.cma),
    ])?)
}

/// Build the daily ETF frame.
pub fn etf_frame(rows: &[EtfDailyRow]) -> Result<DataFrame> {
    let permno: Vec<i64> = rows.iter().map(|r| r.permno.0).collect();
    let ticker: Vec<Option<&str>> = rows.iter().map(|r| r.ticker.as_deref()).collect();
    Ok(DataFrame::new(vec![
        date_series("date", rows.iter().map(|r| Some(r.date)))?,
        date_series("ym", rows.iter().map(|r| r.period.first_day()))?,
        Series::new("permno".into(), permno).into(),
        f64_column("retd", rows, |r| r.retd),
        Series::new("ticker".into(), ticker).into(),
        f64_column("retM", rows, |r| r.ret_m),
        f64_column("mktrf", rows, |r| r.mktrf),
        f64_column("rf", rows, |r| r.rf),
    ])?)
}

/// Build the daily factor frame with a `YYYY-MM` month column.
pub fn daily_factor_frame(factors: &[DailyFactorObservation]) -> Result<DataFrame> {
    let ym: Vec<String> = factors.iter().map(|f| f.period().to_string()).collect();
    Ok(DataFrame::new(vec![
        date_series("date", factors.iter().map(|f| Some(f.date)))?,
        f64_column("mktrf", factors, |f| f.mktrf),
        f64_column("smb", factors, |f| f.smb),
        f64_column("hml", factors, |f| f.hml),
        f64_column("rf", factors, |f| f.rf),
        f64_column("umd", factors, |f| f.umd),
        f64_column("rmw", factors, |f| f.rmw),
        f64_column("cma", factors, |f| f.cma),
        Series::new("ym".into(), ym).into(),
    ])?)
}
