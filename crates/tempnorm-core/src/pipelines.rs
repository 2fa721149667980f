use std::collections::HashSet;
use std::path::PathBuf;

use tempnorm_parser::{convert_table, CanonicalSeries, ConversionCounters, RawTable};
use tracing::{info, warn};

use crate::config::{DatasetConfig, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::matcher::{match_locations, MatchResult};
use crate::records::{sanitize_file_stem, tidy_records, tidy_records_by_location, RecordSink};
use crate::standardize::{standardize, FilterReport};

/// Everything one dataset produced on a successful run.
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    pub name: String,
    pub content_hash: String,
    pub series: CanonicalSeries,
    pub counters: ConversionCounters,
    pub filter_report: Option<FilterReport>,
}

#[derive(Debug)]
pub struct DatasetResult {
    pub name: String,
    pub outcome: Result<DatasetOutcome>,
}

#[derive(Debug, Default)]
pub struct PipelineRun {
    pub results: Vec<DatasetResult>,
    pub matching: Option<MatchResult>,
}

impl PipelineRun {
    pub fn outcome(&self, name: &str) -> Option<&DatasetOutcome> {
        self.results
            .iter()
            .find(|result| result.name == name)
            .and_then(|result| result.outcome.as_ref().ok())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DatasetOutcome> {
        self.results
            .iter()
            .filter_map(|result| result.outcome.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.results.iter().filter_map(|result| match &result.outcome {
            Ok(_) => None,
            Err(err) => Some((result.name.as_str(), err)),
        })
    }
}

/// Reads, converts and (when configured) standardizes one dataset.
pub fn run_dataset(config: &DatasetConfig) -> Result<DatasetOutcome> {
    let adapter = config.adapter.adapter();
    info!(
        dataset = %config.name,
        path = %config.path.display(),
        adapter = adapter.name(),
        "loading dataset"
    );

    let table = RawTable::from_path(&config.path, config.delimiter_byte()?)?;
    let conversion = convert_table(&table, adapter)?;
    let mut series = conversion.series;
    if !adapter.multi_location() {
        series.ensure_unique_dates(adapter.name())?;
    }

    let filter_report = config.filter_config().map(|filter| {
        let report = standardize(&mut series, &filter);
        info!(
            dataset = %config.name,
            range_rejected = report.range_rejected,
            jump_rejected = report.jump_rejected,
            filled = report.filled,
            unfilled = report.unfilled,
            "filtered dataset"
        );
        report
    });
    if filter_report.is_none() {
        series.readings.sort_by_key(|reading| reading.date);
    }

    Ok(DatasetOutcome {
        name: config.name.clone(),
        content_hash: table.content_hash,
        series,
        counters: conversion.counters,
        filter_report,
    })
}

/// Runs every configured dataset. A failing dataset is recorded and the
/// others carry on.
pub fn run_all(config: &PipelineConfig) -> PipelineRun {
    let mut run = PipelineRun::default();

    for dataset in &config.datasets {
        let outcome = run_dataset(dataset);
        if let Err(err) = &outcome {
            warn!(dataset = %dataset.name, error = %err, "dataset failed");
        }
        run.results.push(DatasetResult {
            name: dataset.name.clone(),
            outcome,
        });
    }

    if let Some(matching) = &config.matching {
        let matched = match (
            run.outcome(&matching.reference),
            run.outcome(&matching.candidates),
        ) {
            (Some(reference), Some(candidates)) => {
                match match_locations(&reference.series, &candidates.series) {
                    Ok(result) => Some(result),
                    Err(err) => {
                        warn!(error = %err, "matching skipped");
                        None
                    }
                }
            }
            _ => {
                warn!(
                    reference = %matching.reference,
                    candidates = %matching.candidates,
                    "matching skipped: a dataset it needs failed"
                );
                None
            }
        };
        run.matching = matched;
    }

    run
}

/// Hands one outcome's records to every sink, split per location if asked.
///
/// Locations whose names reduce to the same file stem get a numeric suffix,
/// so every location keeps its own file.
pub fn export_outcome(
    outcome: &DatasetOutcome,
    sinks: &[Box<dyn RecordSink>],
    split_by_location: bool,
) -> Result<Vec<PathBuf>> {
    let groups = if split_by_location {
        tidy_records_by_location(&outcome.series, &outcome.name)
    } else {
        vec![(None, tidy_records(&outcome.series, &outcome.name))]
    };

    let mut taken: HashSet<String> = HashSet::new();
    let mut written = Vec::new();
    for (location, records) in &groups {
        let base = match location {
            Some(location) => sanitize_file_stem(&format!("{}_{}", outcome.name, location)),
            None => sanitize_file_stem(&outcome.name),
        };
        let mut file_stem = base.clone();
        let mut suffix = 2;
        while !taken.insert(file_stem.clone()) {
            file_stem = format!("{base}_{suffix}");
            suffix += 1;
        }
        if file_stem != base {
            warn!(
                dataset = %outcome.name,
                location = location.as_deref().unwrap_or_default(),
                file_stem = %file_stem,
                "file name already used by another location"
            );
        }

        for sink in sinks {
            let path = sink.accept(&file_stem, records)?;
            info!(dataset = %outcome.name, sink = sink.name(), path = %path.display(), "exported records");
            written.push(path);
        }
    }
    Ok(written)
}

/// Files written by [`export_all`] and the datasets whose export failed.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    pub failures: Vec<(String, PipelineError)>,
}

/// Exports every successful dataset. A dataset whose export fails is
/// recorded and the others are still written.
pub fn export_all(
    run: &PipelineRun,
    sinks: &[Box<dyn RecordSink>],
    split_by_location: bool,
) -> ExportSummary {
    let mut summary = ExportSummary::default();
    for outcome in run.succeeded() {
        match export_outcome(outcome, sinks, split_by_location) {
            Ok(paths) => summary.written.extend(paths),
            Err(err) => {
                warn!(dataset = %outcome.name, error = %err, "export failed");
                summary.failures.push((outcome.name.clone(), err));
            }
        }
    }
    summary
}
