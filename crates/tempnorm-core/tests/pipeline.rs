use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempnorm_core::config::PipelineConfig;
use tempnorm_core::pipelines::{export_all, export_outcome, run_all, run_dataset, DatasetOutcome};
use tempnorm_core::records::{CsvSink, ParquetSink, RecordSink, TidyRecord, RECORD_COLUMNS};
use tempnorm_core::PipelineError;
use tempnorm_parser::{AdapterError, CanonicalSeries, ConversionCounters, Reading};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../tempnorm-parser/tests/data")
}

fn config_with_failure() -> PipelineConfig {
    let toml = r#"
[[dataset]]
name = "reference"
path = "tableau.csv"

[dataset.adapter]
kind = "wide_month"
reference_year = 2019
month_columns = ["janvier", "février", "mars", "avril", "mai", "juin",
                 "juillet", "août", "septembre", "octobre", "novembre", "décembre"]

[dataset.filter]
preset = "fill_only"

[[dataset]]
name = "erreurs"
path = "tableau_erreur.csv"

[dataset.adapter]
kind = "wide_month"
month_columns = ["janvier", "février", "mars", "avril", "mai", "juin",
                 "juillet", "août", "septembre", "octobre", "novembre", "décembre"]

[dataset.filter]
preset = "global"

[[dataset]]
name = "station"
path = "station_log_no_day.csv"

[dataset.adapter]
kind = "station_log"

[[dataset]]
name = "cities"
path = "city_temperature.csv"

[dataset.adapter]
kind = "multi_location"
target_region = "Europe"
target_year = 2019

[dataset.filter]
preset = "warm_climate"
fill = "linear"

[matching]
reference = "reference"
candidates = "cities"
"#;
    PipelineConfig::from_toml_str(toml, &fixture_dir()).unwrap()
}

#[test]
fn failing_dataset_does_not_stop_the_others() {
    let run = run_all(&config_with_failure());

    assert_eq!(run.results.len(), 4);
    assert_eq!(run.succeeded().count(), 3);

    let failed: Vec<_> = run.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "station");
    assert!(matches!(
        failed[0].1,
        PipelineError::Adapter(AdapterError::MissingColumn { .. })
    ));
    assert!(run.outcome("station").is_none());
}

#[test]
fn wide_month_outliers_and_gaps_are_repaired() {
    let run = run_all(&config_with_failure());

    let errors = run.outcome("erreurs").unwrap();
    assert_eq!(errors.series.len(), 365);
    assert_eq!(errors.counters.malformed_values, 1);
    let report = errors.filter_report.unwrap();
    assert_eq!(report.range_rejected, 1);
    // The 35.0 on March 15 and both of its neighbours.
    assert_eq!(report.jump_rejected, 3);
    assert_eq!(report.filled, 6);
    assert_eq!(report.unfilled, 0);
    assert_eq!(errors.series.missing_count(), 0);
    assert!(errors.series.values().all(|v| (-60.0..=50.0).contains(&v)));

    let dates: Vec<_> = errors.series.readings.iter().map(|r| r.date).collect();
    assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));

    let value_on = |month: u32, day: u32| {
        let date = NaiveDate::from_ymd_opt(2023, month, day).unwrap();
        errors
            .series
            .readings
            .iter()
            .find(|r| r.date == date)
            .and_then(|r| r.temperature)
            .unwrap()
    };

    // Mean fill gives every repaired day the same value.
    let fill = value_on(1, 3);
    assert!(fill > 8.0 && fill < 12.0, "fill value {fill}");
    for day in 14..=16 {
        assert_eq!(value_on(3, day), fill);
    }
    assert_eq!(value_on(2, 5), fill);
    assert_eq!(value_on(3, 10), fill);
    assert_eq!(value_on(3, 13), 4.3);
    assert_eq!(value_on(3, 17), 4.7);

    // January 31st and February 1st are neighbours and stay untouched.
    assert_eq!(value_on(1, 31), 3.1);
    assert_eq!(value_on(2, 1), 1.6);
}

#[test]
fn matching_runs_against_converted_cities() {
    let run = run_all(&config_with_failure());

    let cities = run.outcome("cities").unwrap();
    assert_eq!(cities.counters.out_of_scope, 2);
    assert_eq!(cities.counters.duplicates, 1);
    assert_eq!(cities.filter_report.unwrap().unfilled, 1);

    let matching = run.matching.as_ref().unwrap();
    let best = matching.best().unwrap();
    assert_eq!(best.location, "Berlin");
    assert_eq!(best.overlap_days, 3);
    assert!((best.deviation - 2.6).abs() < 1e-9);

    let paris = matching.score_for("Paris").unwrap();
    assert_eq!(paris.overlap_days, 2);
    assert!((paris.deviation - 10.7).abs() < 1e-9);
}

#[test]
fn split_export_writes_one_file_per_location_and_sink() {
    let config = config_with_failure();
    let cities = run_dataset(config.dataset("cities").unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let sinks: Vec<Box<dyn RecordSink>> = vec![
        Box::new(CsvSink::new(dir.path())),
        Box::new(ParquetSink::new(dir.path())),
    ];
    let written = export_outcome(&cities, &sinks, true).unwrap();

    assert_eq!(written.len(), 4);
    assert!(written.iter().all(|path| path.exists()));
    let paris_parquet = dir.path().join("cities_Paris.parquet");
    assert!(fs::metadata(&paris_parquet).unwrap().len() > 0);

    let paris_csv = fs::read_to_string(dir.path().join("cities_Paris.csv")).unwrap();
    let lines: Vec<&str> = paris_csv.lines().collect();
    assert_eq!(lines[0], RECORD_COLUMNS.join(","));
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("cities,Paris,2019-01-01,1,1,January,"));
}

#[test]
fn unsplit_export_keeps_a_single_file() {
    let config = config_with_failure();
    let reference = run_dataset(config.dataset("reference").unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let sinks: Vec<Box<dyn RecordSink>> = vec![Box::new(CsvSink::new(dir.path().join("csv")))];
    let written = export_outcome(&reference, &sinks, false).unwrap();

    assert_eq!(written, vec![dir.path().join("csv").join("reference.csv")]);
    let content = fs::read_to_string(&written[0]).unwrap();
    assert_eq!(content.lines().count(), 366);
}

#[test]
fn locations_sharing_a_file_name_keep_separate_files() {
    let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let outcome = DatasetOutcome {
        name: "cities".to_string(),
        content_hash: String::new(),
        series: CanonicalSeries::new(
            "cities",
            vec![
                Reading::at(date, Some(1.0), "St. Louis"),
                Reading::at(date, Some(2.0), "St_ Louis"),
            ],
        ),
        counters: ConversionCounters::default(),
        filter_report: None,
    };

    let dir = tempfile::tempdir().unwrap();
    let sinks: Vec<Box<dyn RecordSink>> = vec![Box::new(CsvSink::new(dir.path()))];
    let written = export_outcome(&outcome, &sinks, true).unwrap();

    assert_eq!(
        written,
        vec![
            dir.path().join("cities_St__Louis.csv"),
            dir.path().join("cities_St__Louis_2.csv"),
        ]
    );
    let first = fs::read_to_string(&written[0]).unwrap();
    let second = fs::read_to_string(&written[1]).unwrap();
    assert!(first.contains("cities,St. Louis,2019-01-01"));
    assert!(!first.contains("St_ Louis"));
    assert!(second.contains("cities,St_ Louis,2019-01-01"));
}

/// Refuses one dataset's records and writes everything else as CSV.
struct RefusingSink {
    refused: &'static str,
    inner: CsvSink,
}

impl RecordSink for RefusingSink {
    fn name(&self) -> &'static str {
        "refusing"
    }

    fn accept(&self, file_stem: &str, records: &[TidyRecord]) -> tempnorm_core::Result<PathBuf> {
        if file_stem.starts_with(self.refused) {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "output not writable",
            )));
        }
        self.inner.accept(file_stem, records)
    }
}

#[test]
fn failed_export_does_not_stop_other_datasets() {
    let run = run_all(&config_with_failure());

    let dir = tempfile::tempdir().unwrap();
    let sinks: Vec<Box<dyn RecordSink>> = vec![Box::new(RefusingSink {
        refused: "erreurs",
        inner: CsvSink::new(dir.path()),
    })];
    let summary = export_all(&run, &sinks, false);

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, "erreurs");
    assert!(matches!(summary.failures[0].1, PipelineError::Io(_)));

    assert_eq!(
        summary.written,
        vec![dir.path().join("reference.csv"), dir.path().join("cities.csv")]
    );
    assert!(summary.written.iter().all(|path| path.exists()));
    assert!(!dir.path().join("erreurs.csv").exists());
}
