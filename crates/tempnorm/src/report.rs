use std::path::PathBuf;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use serde::Serialize;
use tempnorm_core::matcher::MatchResult;
use tempnorm_core::pipelines::{DatasetOutcome, ExportSummary, PipelineRun};
use tempnorm_core::standardize::FilterReport;
use tempnorm_core::statistics::{
    annual_stats, location_stats, monthly_stats, LocationStats, MonthComparison, MonthlyStats,
    SummaryStats,
};
use tempnorm_parser::ConversionCounters;

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub content_hash: String,
    pub readings: usize,
    pub missing: usize,
    pub locations: usize,
    pub counters: ConversionCounters,
    pub filter: Option<FilterReport>,
}

impl DatasetSummary {
    fn new(outcome: &DatasetOutcome) -> Self {
        Self {
            name: outcome.name.clone(),
            content_hash: outcome.content_hash.clone(),
            readings: outcome.series.len(),
            missing: outcome.series.missing_count(),
            locations: outcome.series.locations().len(),
            counters: outcome.counters,
            filter: outcome.filter_report,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailureSummary {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    pub left: String,
    pub right: String,
    pub months: Vec<MonthComparison>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub datasets: Vec<DatasetSummary>,
    pub failures: Vec<FailureSummary>,
    pub matching: Option<MatchResult>,
    pub comparisons: Vec<ComparisonReport>,
    pub exported: Vec<PathBuf>,
}

impl RunReport {
    /// Export failures are listed after the datasets that failed to load.
    pub fn new(run: &PipelineRun, comparisons: Vec<ComparisonReport>, export: ExportSummary) -> Self {
        let mut failures: Vec<FailureSummary> = run
            .failed()
            .map(|(name, err)| FailureSummary {
                name: name.to_string(),
                error: err.to_string(),
            })
            .collect();
        failures.extend(export.failures.into_iter().map(|(name, err)| FailureSummary {
            name,
            error: format!("export failed: {err}"),
        }));

        Self {
            datasets: run.succeeded().map(DatasetSummary::new).collect(),
            failures,
            matching: run.matching.clone(),
            comparisons,
            exported: export.written,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatasetStatsReport {
    pub dataset: DatasetSummary,
    pub annual: Option<SummaryStats>,
    pub monthly: Vec<MonthlyStats>,
    pub locations: Vec<LocationStats>,
}

impl DatasetStatsReport {
    pub fn new(outcome: &DatasetOutcome) -> Self {
        Self {
            dataset: DatasetSummary::new(outcome),
            annual: annual_stats(&outcome.series),
            monthly: monthly_stats(&outcome.series),
            locations: location_stats(&outcome.series),
        }
    }
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn stats_cells(label: String, stats: &SummaryStats) -> Vec<Cell> {
    vec![
        Cell::new(label),
        Cell::new(stats.count),
        Cell::new(fmt_value(Some(stats.mean))),
        Cell::new(fmt_value(Some(stats.min))),
        Cell::new(fmt_value(Some(stats.max))),
        Cell::new(fmt_value(stats.std_dev)),
    ]
}

const STATS_HEADER: [&str; 6] = ["", "n", "mean", "min", "max", "std"];

pub fn print_run(report: &RunReport) {
    let mut datasets = new_table(vec![
        "dataset",
        "readings",
        "missing",
        "malformed",
        "invalid dates",
        "out of scope",
        "duplicates",
        "range rejected",
        "jump rejected",
        "filled",
    ]);
    for summary in &report.datasets {
        let filter = summary.filter.unwrap_or_default();
        datasets.add_row(vec![
            Cell::new(&summary.name),
            Cell::new(summary.readings),
            Cell::new(summary.missing),
            Cell::new(summary.counters.malformed_values),
            Cell::new(summary.counters.invalid_dates),
            Cell::new(summary.counters.out_of_scope),
            Cell::new(summary.counters.duplicates),
            Cell::new(filter.range_rejected),
            Cell::new(filter.jump_rejected),
            Cell::new(filter.filled),
        ]);
    }
    println!("{datasets}");

    if !report.failures.is_empty() {
        let mut failures = new_table(vec!["dataset", "error"]);
        for failure in &report.failures {
            failures.add_row(vec![&failure.name, &failure.error]);
        }
        println!("{failures}");
    }

    if let Some(matching) = &report.matching {
        print_match_table(matching);
    }

    for comparison in &report.comparisons {
        println!("{} vs {}", comparison.left, comparison.right);
        let mut table = new_table(vec![
            "month",
            comparison.left.as_str(),
            comparison.right.as_str(),
            "delta",
        ]);
        for month in &comparison.months {
            table.add_row(vec![
                month.month.to_string(),
                fmt_value(month.left_mean),
                fmt_value(month.right_mean),
                fmt_value(month.delta),
            ]);
        }
        println!("{table}");
    }

    if !report.exported.is_empty() {
        println!("Exported {} files:", report.exported.len());
        for path in &report.exported {
            println!("  {}", path.display());
        }
    }
}

pub fn print_stats(report: &DatasetStatsReport) {
    println!(
        "{}: {} readings, {} missing (blake3 {})",
        report.dataset.name, report.dataset.readings, report.dataset.missing, report.dataset.content_hash
    );

    let mut table = new_table(STATS_HEADER.to_vec());
    for monthly in &report.monthly {
        table.add_row(stats_cells(monthly.month.to_string(), &monthly.stats));
    }
    if let Some(annual) = &report.annual {
        table.add_row(stats_cells("year".to_string(), annual));
    }
    println!("{table}");

    if !report.locations.is_empty() {
        let mut table = new_table(STATS_HEADER.to_vec());
        for location in &report.locations {
            table.add_row(stats_cells(location.location.clone(), &location.stats));
        }
        println!("{table}");
    }
}

pub fn print_match(reference: &str, result: &MatchResult) {
    println!("Locations closest to {reference}:");
    print_match_table(result);
}

fn print_match_table(result: &MatchResult) {
    let mut table = new_table(vec!["rank", "location", "deviation", "days"]);
    for (rank, score) in result.scores.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&score.location),
            Cell::new(fmt_value(Some(score.deviation))),
            Cell::new(score.overlap_days),
        ]);
    }
    println!("{table}");

    if !result.unmatched.is_empty() {
        println!("No overlap with reference: {}", result.unmatched.join(", "));
    }
}
