//! Writing panel and factor tables to disk

use crosspanel_data::{Period, SecurityKey};
use crosspanel_output::{
    ExportFormat, Exporter, PanelLayout, RunSummary, SignalColumn, TableFormat, factor_frame,
    factor_table, panel_frame, sibling_path, write_frame,
};
use crosspanel_panel::PanelRow;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("crosspanel-output-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn rows() -> Vec<PanelRow> {
    let start = Period::new(2005, 1).unwrap();
    (0..6)
        .map(|i| PanelRow {
            permno: SecurityKey(10_000 + i64::from(i % 2)),
            period: start + i / 2,
            ticker: Some("TST".to_string()),
            daret: Some(0.01 * f64::from(i)),
            me: Some(100.0 + f64::from(i)),
            rf: Some(0.001),
            mktrf: Some(0.004 * f64::from(i / 2)),
            signals: BTreeMap::from([("ceq".to_string(), Some(50.0))]),
            ..Default::default()
        })
        .collect()
}

fn layout() -> PanelLayout {
    PanelLayout {
        signals: vec![SignalColumn::renamed("ceq", "be")],
        ..PanelLayout::default()
    }
}

#[test]
fn test_parquet_round_trip() {
    let dir = scratch_dir("parquet");
    let path = dir.join("value.parquet");

    let mut df = panel_frame(&rows(), &layout()).unwrap();
    write_frame(&mut df, &path, TableFormat::Parquet).unwrap();

    let back = ParquetReader::new(File::open(&path).unwrap()).finish().unwrap();
    assert_eq!(back.shape(), (6, 22));
    assert!(back.equals_missing(&df));
}

#[test]
fn test_csv_output_is_deterministic() {
    let dir = scratch_dir("csv");
    let first = dir.join("first.csv");
    let second = dir.join("second.csv");

    for path in [&first, &second] {
        let mut df = panel_frame(&rows(), &layout()).unwrap();
        write_frame(&mut df, path, TableFormat::Csv).unwrap();
    }
    let a = fs::read(&first).unwrap();
    let b = fs::read(&second).unwrap();
    assert_eq!(a, b);

    let text = String::from_utf8(a).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("permno,ticker,conm,ldate,"));
    assert!(header.ends_with(",cma,be"));
    assert!(text.contains("2005-01-01"));
}

#[test]
fn test_factor_table_and_summary_next_to_panel() {
    let dir = scratch_dir("siblings");
    let panel = dir.join("nested").join("quality.parquet");

    let rows = rows();
    let factors = factor_table(&rows);
    assert_eq!(factors.len(), 3);

    let factor_path = sibling_path(&panel, "factors", TableFormat::Parquet.extension());
    write_frame(&mut factor_frame(&factors).unwrap(), &factor_path, TableFormat::Parquet).unwrap();
    assert!(factor_path.ends_with("quality_factors.parquet"));
    assert!(factor_path.exists());

    let summary = RunSummary {
        output_rows: rows.len(),
        factor_rows: factors.len(),
        ..RunSummary::default()
    };
    let summary_path = sibling_path(&panel, "summary", ExportFormat::PrettyJson.extension());
    summary.export_to_file(&summary_path, ExportFormat::PrettyJson).unwrap();

    let back: RunSummary = serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(back, summary);
}
