use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::AdapterError;
use crate::formats::{MultiLocationAdapter, StationLogAdapter, WideMonthAdapter};
use crate::registry::{convert_table, AdapterConfig, TemperatureAdapter};
use crate::table::RawTable;

const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

fn fixture(path: &str) -> RawTable {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    RawTable::from_path(&full_path, b',')
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn french_wide_month() -> WideMonthAdapter {
    WideMonthAdapter::new(2023).with_month_columns(FRENCH_MONTHS)
}

#[test]
fn wide_month_drops_impossible_days() {
    let table = fixture("tableau.csv");
    assert_eq!(table.height(), 31);

    let conversion = french_wide_month().convert(&table).expect("wide month conversion");

    assert_eq!(conversion.series.len(), 365);
    assert_eq!(conversion.counters.invalid_dates, 7);
    assert_eq!(conversion.counters.malformed_values, 0);
    assert!(conversion.series.ensure_unique_dates("wide_month").is_ok());

    let dates: Vec<NaiveDate> = conversion.series.readings.iter().map(|r| r.date).collect();
    assert!(dates.contains(&date(2023, 1, 31)));
    assert!(dates.contains(&date(2023, 2, 28)));
    assert!(!dates.iter().any(|d| *d > date(2023, 12, 31)));
    assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn wide_month_marks_malformed_cells_missing() {
    let table = fixture("tableau_erreur.csv");
    let conversion = french_wide_month().convert(&table).expect("wide month conversion");

    assert_eq!(conversion.series.len(), 365);
    assert_eq!(conversion.counters.malformed_values, 1);
    assert_eq!(conversion.series.missing_count(), 2);

    let jan_third = conversion
        .series
        .readings
        .iter()
        .find(|r| r.date == date(2023, 1, 3))
        .expect("January 3rd present");
    assert!(jan_third.temperature.is_none());

    let feb_fifth = conversion
        .series
        .readings
        .iter()
        .find(|r| r.date == date(2023, 2, 5))
        .expect("February 5th present");
    assert_eq!(feb_fifth.temperature, Some(999.0));
}

#[test]
fn wide_month_requires_every_month_column() {
    let table = fixture("tableau.csv");
    let err = WideMonthAdapter::default()
        .convert(&table)
        .expect_err("english headers should not match");
    assert!(matches!(err, AdapterError::MissingColumn { ref column, .. } if column == "January"));

    let err = WideMonthAdapter::new(2023)
        .with_month_columns(["janvier"])
        .convert(&table)
        .expect_err("one month column is not a configuration");
    assert!(matches!(err, AdapterError::Configuration { .. }));
}

#[test]
fn wide_month_leap_reference_year_keeps_february_29() {
    let table = fixture("tableau.csv");
    let adapter = WideMonthAdapter::new(2024).with_month_columns(FRENCH_MONTHS);
    let conversion = adapter.convert(&table).expect("wide month conversion");
    assert_eq!(conversion.series.len(), 366);
}

#[test]
fn station_log_builds_dates_from_parts() {
    let table = fixture("station_log.csv");
    let conversion = StationLogAdapter::default()
        .convert(&table)
        .expect("station log conversion");

    let series = conversion.series;
    assert_eq!(series.len(), 5);
    assert!(!series.has_locations());
    assert_eq!(series.readings[0].date, date(2023, 1, 1));
    assert_eq!(series.readings[0].temperature, Some(4.5));
    assert!(series.readings[2].temperature.is_none());
    assert_eq!(conversion.counters.malformed_values, 1);
}

#[test]
fn station_log_rejects_impossible_dates() {
    let table = fixture("station_log_bad_date.csv");
    let err = StationLogAdapter::default()
        .convert(&table)
        .expect_err("February 30th must be fatal");
    match err {
        AdapterError::InvalidField { line_index, .. } => assert_eq!(line_index, 3),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn station_log_requires_day_column() {
    let table = fixture("station_log_no_day.csv");
    let err = StationLogAdapter::default()
        .convert(&table)
        .expect_err("missing day column must be fatal");
    assert!(matches!(err, AdapterError::MissingColumn { ref column, .. } if column == "day"));
    assert!(err.source_id().unwrap().ends_with("station_log_no_day.csv"));
}

#[test]
fn station_log_rejects_repeated_dates() {
    let table = RawTable::from_text(
        "inline",
        "year,month,day,temperature\n2023,1,1,4.0\n2023,1,1,5.0\n",
    )
    .unwrap();
    let err = StationLogAdapter::default().convert(&table).unwrap_err();
    assert!(matches!(err, AdapterError::DuplicateDate { .. }));
}

#[test]
fn multi_location_filters_and_converts() {
    let table = fixture("city_temperature.csv");
    let adapter = MultiLocationAdapter::new("Europe", 2019);
    assert!(adapter.multi_location());

    let conversion = adapter.convert(&table).expect("multi location conversion");
    let series = conversion.series;

    assert_eq!(series.locations(), vec!["Paris", "Berlin"]);
    assert_eq!(series.len(), 6);
    assert_eq!(conversion.counters.out_of_scope, 2);
    assert_eq!(conversion.counters.invalid_dates, 1);
    assert_eq!(conversion.counters.duplicates, 1);

    let paris: Vec<Option<f64>> = series.readings_at("Paris").map(|r| r.temperature).collect();
    assert_eq!(paris, vec![Some(5.0), Some(6.0), None]);

    let berlin: Vec<Option<f64>> = series.readings_at("Berlin").map(|r| r.temperature).collect();
    assert_eq!(berlin, vec![Some(0.0), Some(1.0), Some(2.0)]);
}

#[test]
fn multi_location_without_matching_rows_is_empty() {
    let table = fixture("city_temperature.csv");
    let err = MultiLocationAdapter::new("Africa", 2019)
        .convert(&table)
        .expect_err("no rows in scope");
    assert!(matches!(err, AdapterError::EmptyData { .. }));
}

#[test]
fn adapter_config_reads_tagged_toml_shape() {
    let config: AdapterConfig = serde_json::from_str(
        r#"{"kind": "multi_location", "target_region": "Europe", "target_year": 2019}"#,
    )
    .expect("adapter config");
    assert_eq!(config.adapter().name(), "multi_location");

    let table = fixture("city_temperature.csv");
    let conversion = convert_table(&table, config.adapter()).expect("convert");
    assert_eq!(conversion.series.len(), 6);
}

#[test]
fn multi_location_sentinel_can_be_disabled() {
    let config: AdapterConfig = serde_json::from_str(
        r#"{"kind": "multi_location", "target_region": "Europe", "target_year": 2019, "missing_sentinel": false}"#,
    )
    .expect("adapter config");
    let AdapterConfig::MultiLocation(adapter) = &config else {
        panic!("expected multi_location adapter, got {config:?}");
    };
    assert_eq!(adapter.missing_sentinel, None);

    let table = fixture("city_temperature.csv");
    let conversion = convert_table(&table, config.adapter()).expect("convert");
    let paris: Vec<Option<f64>> = conversion
        .series
        .readings_at("Paris")
        .map(|r| r.temperature)
        .collect();
    assert_eq!(paris, vec![Some(5.0), Some(6.0), Some(-72.8)]);

    let custom: AdapterConfig = serde_json::from_str(
        r#"{"kind": "multi_location", "target_region": "Europe", "target_year": 2019, "missing_sentinel": -999.0}"#,
    )
    .expect("adapter config");
    assert_eq!(
        custom,
        AdapterConfig::MultiLocation(MultiLocationAdapter {
            missing_sentinel: Some(-999.0),
            ..MultiLocationAdapter::new("Europe", 2019)
        })
    );
}
