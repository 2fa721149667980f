use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tempnorm_parser::{CanonicalSeries, MonthLabel};

use crate::error::{PipelineError, Result};

/// One long-form row handed to renderers and exporters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRecord {
    pub source: String,
    pub location: Option<String>,
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub day_of_year: u32,
    pub month: MonthLabel,
    pub temperature: Option<f64>,
}

pub const RECORD_COLUMNS: [&str; 7] = [
    "source",
    "location",
    "date",
    "day_of_month",
    "day_of_year",
    "month",
    "temperature_c",
];

pub fn tidy_records(series: &CanonicalSeries, source_tag: &str) -> Vec<TidyRecord> {
    series
        .readings
        .iter()
        .map(|reading| TidyRecord {
            source: source_tag.to_string(),
            location: reading.location.clone(),
            date: reading.date,
            day_of_month: reading.date.day(),
            day_of_year: reading.date.ordinal(),
            month: MonthLabel::from_date(reading.date),
            temperature: reading.temperature,
        })
        .collect()
}

/// Records grouped per location in first-seen order. A series without
/// locations yields a single unnamed group.
pub fn tidy_records_by_location(
    series: &CanonicalSeries,
    source_tag: &str,
) -> Vec<(Option<String>, Vec<TidyRecord>)> {
    let records = tidy_records(series, source_tag);
    if !series.has_locations() {
        return vec![(None, records)];
    }

    series
        .locations()
        .into_iter()
        .map(|location| {
            let group = records
                .iter()
                .filter(|record| record.location.as_deref() == Some(location))
                .cloned()
                .collect();
            (Some(location.to_string()), group)
        })
        .collect()
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn records_to_dataframe(records: &[TidyRecord]) -> PolarsResult<DataFrame> {
    let source: Vec<&str> = records.iter().map(|r| r.source.as_str()).collect();
    let location: Vec<Option<&str>> = records.iter().map(|r| r.location.as_deref()).collect();
    let date_days: Vec<i32> = records
        .iter()
        .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let day_of_month: Vec<u32> = records.iter().map(|r| r.day_of_month).collect();
    let day_of_year: Vec<u32> = records.iter().map(|r| r.day_of_year).collect();
    let month: Vec<&str> = records.iter().map(|r| r.month.as_str()).collect();
    let temperature: Vec<Option<f64>> = records.iter().map(|r| r.temperature).collect();

    let date = Series::new(RECORD_COLUMNS[2].into(), date_days).cast(&DataType::Date)?;

    DataFrame::new(vec![
        Series::new(RECORD_COLUMNS[0].into(), source).into(),
        Series::new(RECORD_COLUMNS[1].into(), location).into(),
        date.into(),
        Series::new(RECORD_COLUMNS[3].into(), day_of_month).into(),
        Series::new(RECORD_COLUMNS[4].into(), day_of_year).into(),
        Series::new(RECORD_COLUMNS[5].into(), month).into(),
        Series::new(RECORD_COLUMNS[6].into(), temperature).into(),
    ])
}

/// Consumer of a record stream. Sinks only read the records they are given.
pub trait RecordSink {
    fn name(&self) -> &'static str;
    fn accept(&self, file_stem: &str, records: &[TidyRecord]) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn sink(&self, dir: impl Into<PathBuf>) -> Box<dyn RecordSink> {
        match self {
            ExportFormat::Csv => Box::new(CsvSink::new(dir)),
            ExportFormat::Parquet => Box::new(ParquetSink::new(dir)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RecordSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn accept(&self, file_stem: &str, records: &[TidyRecord]) -> Result<PathBuf> {
        let path = output_path(&self.dir, file_stem, "csv")?;
        let mut df = records_to_dataframe(records)?;
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct ParquetSink {
    dir: PathBuf,
}

impl ParquetSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RecordSink for ParquetSink {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn accept(&self, file_stem: &str, records: &[TidyRecord]) -> Result<PathBuf> {
        let path = output_path(&self.dir, file_stem, "parquet")?;
        let mut df = records_to_dataframe(records)?;
        let mut file = File::create(&path)?;
        ParquetWriter::new(&mut file)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut df)?;
        Ok(path)
    }
}

fn output_path(dir: &Path, file_stem: &str, extension: &str) -> Result<PathBuf> {
    let stem = sanitize_file_stem(file_stem);
    if stem.is_empty() {
        return Err(PipelineError::Config(format!(
            "cannot derive an output file name from '{file_stem}'"
        )));
    }
    fs::create_dir_all(dir)?;
    Ok(dir.join(format!("{stem}.{extension}")))
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_stem(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
