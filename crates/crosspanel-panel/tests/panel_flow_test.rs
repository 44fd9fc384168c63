//! End-to-end panel construction from raw records

use approx::assert_relative_eq;
use chrono::NaiveDate;
use crosspanel_data::source::directory::RETURNS_FILE;
use crosspanel_data::{
    CsvSource, EntityKey, FactorObservation, FundamentalObservation, LinkRecord, MarketIndexObservation,
    Period, ReturnObservation, SecurityKey, TableSource,
};
use crosspanel_panel::{
    DelistingPolicy, LagConfig, LinkPolicy, LinkTable, ShareScreen, apply_lagged_market_cap,
    clean_returns, default_open_end, expand, merge_panel,
};
use std::collections::{BTreeMap, HashSet};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month_end(p: Period) -> NaiveDate {
    p.succ().first_day().unwrap().pred_opt().unwrap()
}

fn fundamental(gvkey: i64, datadate: NaiveDate, at: f64) -> FundamentalObservation {
    FundamentalObservation {
        gvkey: EntityKey(gvkey),
        datadate,
        at: Some(at),
        ni: Some(1.0),
        prcc_c: Some(10.0),
        conm: Some(format!("FIRM {gvkey}")),
        fyear: None,
        signals: BTreeMap::from([("ceq".to_string(), Some(at / 2.0))]),
    }
}

fn monthly_return(permno: i64, p: Period, shrout: f64) -> ReturnObservation {
    ReturnObservation {
        permno: SecurityKey(permno),
        date: month_end(p),
        ret: Some(0.01),
        retx: Some(0.01),
        vol: Some(10_000.0),
        shrout: Some(shrout),
        prc: Some(20.0),
        shrcd: Some(11),
        exchcd: Some(1),
        ..Default::default()
    }
}

#[test]
fn test_panel_from_raw_records() {
    let links = LinkTable::new(
        &[
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
                linkenddt: Some(date(2000, 6, 30)),
            },
        ],
        default_open_end(),
    );

    let fundamentals = vec![
        fundamental(1, date(2000, 12, 31), 100.0),
        fundamental(1, date(2001, 12, 31), 120.0),
        // outside gvkey 2's link window
        fundamental(2, date(2000, 12, 31), 50.0),
    ];
    let (linked, report) = links
        .resolve_all(fundamentals, |f| (f.gvkey, f.datadate), LinkPolicy::Strict)
        .unwrap();
    assert_eq!(report.unmapped, 1);

    let monthly = expand(linked, &LagConfig::default());
    assert_eq!(monthly.len(), 24);

    let start = Period::new(2001, 6).unwrap();
    let periods: Vec<Period> = (0..24).map(|i| start + i).collect();
    // skip one month to create a gap
    let returns: Vec<_> = periods
        .iter()
        .filter(|p| **p != start + 3)
        .map(|&p| monthly_return(100, p, 1_000.0 + (p - start) as f64))
        .collect();
    let (returns, dropped) = clean_returns(returns, &DelistingPolicy::default(), &ShareScreen::default());
    assert_eq!(dropped, 0);

    let factors: Vec<_> = periods
        .iter()
        .map(|&p| FactorObservation {
            date: month_end(p),
            mktrf: Some(0.005),
            smb: Some(0.0),
            hml: Some(0.0),
            rf: Some(0.001),
            umd: Some(0.0),
            rmw: Some(0.0),
            cma: Some(0.0),
        })
        .collect();
    let market: Vec<_> = periods
        .iter()
        .map(|&p| MarketIndexObservation {
            date: month_end(p),
            vwretd: Some(0.006),
        })
        .collect();

    let (rows, merge_report) = merge_panel(returns, monthly, &factors, &market, None).unwrap();
    assert_eq!(rows.len(), 23);
    assert_eq!(merge_report.unmatched_returns, 0);

    let rows = apply_lagged_market_cap(rows);
    let keys: HashSet<_> = rows.iter().map(|r| (r.permno, r.period)).collect();
    assert_eq!(keys.len(), rows.len());

    let row = |p: Period| rows.iter().find(|r| r.period == p).unwrap();
    assert_eq!(row(start).me_lagged, None);
    assert_eq!(row(start + 1).me_lagged, row(start).me);
    assert_eq!(row(start + 4).me_lagged, None);
    assert_eq!(row(start + 5).me_lagged, row(start + 4).me);

    // first report until 2002-05, second from 2002-06
    assert_eq!(row(start + 11).at, Some(100.0));
    assert_eq!(row(start + 12).at, Some(120.0));
    assert_eq!(row(start + 12).signal("ceq"), Some(60.0));
}

#[test]
fn test_nan_delisting_cells_leave_returns_unchanged() {
    let dir = std::env::temp_dir().join(format!("crosspanel-panel-nan-dlret-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(RETURNS_FILE),
        "permno,date,ret,retx,vol,shrout,prc,shrcd,exchcd,dlstcd,dlret\n\
         10001,1990-01-31,0.02,0.02,100,1000,5.0,11,1,,NaN\n\
         10002,1990-01-31,0.03,0.03,100,1000,5.0,11.0,3.0,NA,nan\n\
         10003,1990-01-31,-0.1,-0.1,100,1000,5.0,11,1,520.0,NaN\n",
    )
    .unwrap();

    let observations = CsvSource::new(&dir).returns().unwrap();
    let (cleaned, screened) =
        clean_returns(observations, &DelistingPolicy::default(), &ShareScreen::default());
    assert_eq!(screened, 0);
    assert_eq!(cleaned.len(), 3);
    assert_relative_eq!(cleaned[0].adjusted_return.unwrap(), 0.02);
    assert_relative_eq!(cleaned[1].adjusted_return.unwrap(), 0.03);
    // a performance delisting with no usable return gets the replacement
    assert_relative_eq!(cleaned[2].adjusted_return.unwrap(), -0.45, epsilon = 1e-12);

    std::fs::remove_dir_all(dir).ok();
}
