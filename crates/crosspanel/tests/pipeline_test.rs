//! Pipeline runs over in-memory tables

use approx::assert_relative_eq;
use chrono::NaiveDate;
use crosspanel::data::{
    CarbonRecord, EntityKey, EsgScoreRecord, FactorObservation, FundamentalObservation,
    InstitutionLink, LinkRecord, MarketIndexObservation, Period, ReturnObservation, SecurityKey,
};
use crosspanel::output::{PANEL_BASE_COLUMNS, TableFormat, panel_frame, write_frame};
use crosspanel::panel::{LinkPolicy, PanelError, PanelRow};
use crosspanel::{MemorySource, Pipeline, PipelineConfig, PipelineError, Strategy, Variant};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month_end(p: Period) -> NaiveDate {
    p.succ().first_day().unwrap().pred_opt().unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("crosspanel-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn start() -> Period {
    Period::new(2001, 6).unwrap()
}

fn fundamental(gvkey: i64, datadate: NaiveDate, at: f64) -> FundamentalObservation {
    FundamentalObservation {
        gvkey: EntityKey(gvkey),
        datadate,
        at: Some(at),
        ni: Some(5.0),
        prcc_c: Some(12.0),
        conm: Some(format!("FIRM {gvkey}")),
        fyear: None,
        signals: BTreeMap::from([
            ("ceq".to_string(), Some(at * 0.4)),
            ("revt".to_string(), Some(at * 0.9)),
            ("cogs".to_string(), Some(at * 0.6)),
        ]),
    }
}

fn market_x(i: i32) -> f64 {
    f64::from((i * 5) % 9) / 100.0 - 0.03
}

fn monthly_return(permno: i64, i: i32, slope: f64) -> ReturnObservation {
    ReturnObservation {
        permno: SecurityKey(permno),
        date: month_end(start() + i),
        ret: Some(0.001 + slope * market_x(i)),
        retx: Some(0.0),
        vol: Some(20_000.0),
        shrout: Some(5_000.0 + f64::from(i)),
        prc: Some(-25.0),
        shrcd: Some(11),
        exchcd: Some(1),
        ticker: Some(format!("T{permno}")),
        ..Default::default()
    }
}

fn links() -> Vec<LinkRecord> {
    vec![
        LinkRecord {
            gvkey: EntityKey(1),
            permno: SecurityKey(100),
            linkdt: date(1990, 1, 1),
            linkenddt: None,
        },
        LinkRecord {
            gvkey: EntityKey(2),
            permno: SecurityKey(200),
            linkdt: date(1990, 1, 1),
            linkenddt: None,
        },
    ]
}

fn source() -> MemorySource {
    let mut missing_income = fundamental(2, date(2001, 12, 31), 70.0);
    missing_income.ni = None;

    let mut returns: Vec<ReturnObservation> = (0..24)
        .map(|i| monthly_return(100, i, 1.2))
        .chain((0..24).map(|i| monthly_return(200, i, 0.7)))
        .collect();
    let mut preferred = monthly_return(300, 0, 1.0);
    preferred.shrcd = Some(31);
    returns.push(preferred);

    let factors = (0..24)
        .map(|i| FactorObservation {
            date: month_end(start() + i),
            mktrf: Some(market_x(i) + 0.0005),
            smb: Some(0.001),
            hml: Some(-0.002),
            rf: Some(0.001),
            umd: Some(0.003),
            rmw: Some(0.0),
            cma: Some(0.0),
        })
        .collect();
    let market = (0..24)
        .map(|i| MarketIndexObservation {
            date: month_end(start() + i),
            vwretd: Some(0.001 + market_x(i)),
        })
        .collect();

    MemorySource {
        fundamentals: vec![
            fundamental(1, date(2000, 12, 31), 100.0),
            fundamental(1, date(2001, 12, 31), 150.0),
            fundamental(2, date(2000, 12, 31), 80.0),
            missing_income,
            fundamental(1, date(1960, 12, 31), 10.0),
        ],
        links: links(),
        returns,
        factors,
        market,
        ..MemorySource::default()
    }
}

fn row(rows: &[PanelRow], permno: i64, p: Period) -> &PanelRow {
    rows.iter()
        .find(|r| r.permno == SecurityKey(permno) && r.period == p)
        .unwrap()
}

#[test]
fn test_quality_panel() {
    let config = PipelineConfig {
        strategy: Strategy::Quality,
        signals: vec!["revt".to_string(), "cogs".to_string()],
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config).unwrap();
    let output = pipeline.run(&source()).unwrap();
    let summary = &output.summary;

    assert_eq!(summary.fundamentals_read, 5);
    assert_eq!(summary.fundamentals_outside_window, 1);
    assert_eq!(summary.fundamentals_missing_required, 1);
    assert_eq!(summary.links.resolved, 3);
    assert_eq!(summary.returns_screened, 1);
    // permno 200 has fundamentals for the first twelve months only
    assert_eq!(summary.merge.unmatched_returns, 12);
    assert_eq!(output.panel.len(), 36);
    assert_eq!(summary.output_rows, 36);
    assert_eq!(output.factors.len(), 24);

    let beta = summary.beta.unwrap();
    assert_eq!(beta.entities, 2);
    assert_eq!(beta.entities_with_beta, 1);
    assert_eq!(beta.defined, 5);

    let first = row(&output.panel, 100, start());
    assert_eq!(first.me, Some(5.0 * 25.0));
    assert_eq!(first.me_lagged, None);
    assert_eq!(first.vol, Some(2.0));
    assert_eq!(first.beta, None);
    assert_eq!(row(&output.panel, 100, start() + 1).me_lagged, first.me);

    let later = row(&output.panel, 100, start() + 23);
    assert_relative_eq!(later.beta.unwrap(), 1.2, epsilon = 1e-9);
    assert_eq!(later.at, Some(150.0));
    assert_relative_eq!(later.profit_a.unwrap(), 0.3, epsilon = 1e-12);
    assert!(row(&output.panel, 200, start() + 11).beta.is_none());

    let names = pipeline.layout().column_names();
    assert_eq!(&names[21..], ["at", "revt", "cogs", "profitA", "beta"]);
}

#[test]
fn test_value_panel_renames_book_equity() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&source()).unwrap();
    assert!(output.summary.beta.is_none());
    assert!(output.panel.iter().all(|r| r.at.is_none() && r.beta.is_none()));

    let df = panel_frame(&output.panel, &pipeline.layout()).unwrap();
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    assert_eq!(&names[..21], PANEL_BASE_COLUMNS);
    assert_eq!(&names[21..], ["be"]);
}

fn esg_source() -> MemorySource {
    let score = |d: NaiveDate, aspect: &str, value: f64| EsgScoreRecord {
        scoredate: Some(d),
        scorevalue: Some(value),
        institutionid: 500,
        aspectname: aspect.to_string(),
    };
    MemorySource {
        esg_scores: vec![
            score(date(2001, 8, 15), "S&P Global ESG Score", 60.0),
            score(date(2001, 8, 15), "Environmental Dimension", 50.0),
            score(date(2002, 2, 10), "S&P Global ESG Score", 65.0),
            score(date(2002, 2, 10), "Board Structure", 1.0),
        ],
        carbon: vec![CarbonRecord {
            institutionid: 500,
            periodenddate: Some(date(2001, 12, 31)),
            carbon_intensity: Some(200.0),
        }],
        institutions: vec![InstitutionLink {
            gvkey: EntityKey(1),
            institutionid: 500,
        }],
        ..source()
    }
}

#[test]
fn test_full_panel_merges_esg() {
    let config = PipelineConfig {
        variant: Variant::Full,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config).unwrap();
    let output = pipeline.run(&esg_source()).unwrap();

    let esg = output.summary.esg.as_ref().unwrap();
    assert_eq!(esg.scores_other_aspect, 1);
    assert_eq!(esg.records, 7);
    assert_eq!(output.summary.merge.esg_matched, 7);

    let panel = &output.panel;
    assert_eq!(row(panel, 100, start() + 1).esg_score, None);
    assert_eq!(row(panel, 100, start() + 4).esg_score, Some(60.0));
    assert_eq!(row(panel, 100, start() + 4).e_score, Some(50.0));
    assert_eq!(row(panel, 100, start() + 6).carbon_intensity, Some(200.0));
    assert_eq!(row(panel, 100, start() + 8).esg_score, Some(65.0));
    assert_eq!(row(panel, 100, start() + 8).e_score, None);
    assert!(row(panel, 100, start() + 23).beta.is_some());

    let dir = scratch_dir("full");
    let files = output.write(&dir.join("full.parquet"), &pipeline.layout()).unwrap();
    assert!(files.panel.exists());
    assert!(files.factors.ends_with("full_factors.parquet"));
    assert!(files.summary.ends_with("full_summary.json"));
}

#[test]
fn test_identical_inputs_give_identical_bytes() {
    let dir = scratch_dir("determinism");
    let config = PipelineConfig {
        variant: Variant::Full,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config).unwrap();

    let mut written = Vec::new();
    for name in ["a.csv", "b.csv"] {
        let output = pipeline.run(&esg_source()).unwrap();
        let mut df = panel_frame(&output.panel, &pipeline.layout()).unwrap();
        let path = dir.join(name);
        write_frame(&mut df, &path, TableFormat::Csv).unwrap();
        written.push(fs::read(&path).unwrap());
    }
    assert_eq!(written[0], written[1]);
}

#[test]
fn test_overlapping_links_fail_strict_and_skip_otherwise() {
    let mut source = source();
    source.links.push(LinkRecord {
        gvkey: EntityKey(1),
        permno: SecurityKey(101),
        linkdt: date(2001, 1, 1),
        linkenddt: Some(date(2001, 12, 31)),
    });

    let strict = Pipeline::new(PipelineConfig::default()).unwrap();
    let err = strict.run(&source).unwrap_err();
    assert!(matches!(err, PipelineError::Panel(PanelError::AmbiguousLink { .. })));

    let skip = Pipeline::new(PipelineConfig {
        link_policy: LinkPolicy::Skip,
        ..PipelineConfig::default()
    })
    .unwrap();
    let output = skip.run(&source).unwrap();
    assert_eq!(output.summary.links.ambiguous.len(), 1);
    assert_eq!(output.summary.links.ambiguous[0].candidates.len(), 2);
}

#[test]
fn test_duplicate_factor_month_aborts() {
    let mut source = source();
    let mut duplicate = source.factors[3];
    duplicate.date = duplicate.date.pred_opt().unwrap();
    source.factors.push(duplicate);

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let err = pipeline.run(&source).unwrap_err();
    assert!(matches!(err, PipelineError::Panel(PanelError::Cardinality { .. })));
}
