mod report;

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tempnorm_core::config::PipelineConfig;
use tempnorm_core::matcher::match_locations;
use tempnorm_core::pipelines::{
    export_all, run_all, run_dataset, DatasetOutcome, ExportSummary, PipelineRun,
};
use tempnorm_core::records::RecordSink;
use tempnorm_core::statistics::compare_monthly;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use report::{ComparisonReport, DatasetStatsReport, RunReport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Temperature dataset normalization", long_about = None)]
struct Cli {
    /// Pipeline file; falls back to TEMPNORM_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print reports as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert, clean and export every configured dataset
    Run(RunArgs),
    /// Summary statistics for one dataset
    Stats(StatsArgs),
    /// Rank candidate locations against the reference dataset
    Match,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Skip writing record files
    #[arg(long)]
    no_export: bool,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Dataset name as configured
    dataset: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.clone())?;

    match cli.command {
        Command::Run(args) => handle_run(&config, args, cli.json),
        Command::Stats(args) => handle_stats(&config, args, cli.json),
        Command::Match => handle_match(&config, cli.json),
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let path = match explicit {
        Some(path) => path,
        None => env::var("TEMPNORM_CONFIG")
            .map(PathBuf::from)
            .context("pass --config or set TEMPNORM_CONFIG")?,
    };
    PipelineConfig::from_path(&path)
        .with_context(|| format!("failed to load pipeline config {}", path.display()))
}

fn handle_run(config: &PipelineConfig, args: RunArgs, json: bool) -> Result<()> {
    let run = run_all(config);

    let export = if args.no_export {
        ExportSummary::default()
    } else {
        let sinks: Vec<Box<dyn RecordSink>> = config
            .export
            .formats
            .iter()
            .map(|format| format.sink(&config.export.output_dir))
            .collect();
        let export = export_all(&run, &sinks, config.export.split_by_location);
        info!(
            files = export.written.len(),
            failed = export.failures.len(),
            dir = %config.export.output_dir.display(),
            "export finished"
        );
        export
    };

    let comparisons = comparisons(config, &run);
    let report = RunReport::new(&run, comparisons, export);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_run(&report);
    }

    if !report.failures.is_empty() {
        bail!(
            "{} of {} datasets failed",
            report.failures.len(),
            run.results.len()
        );
    }
    Ok(())
}

fn comparisons(config: &PipelineConfig, run: &PipelineRun) -> Vec<ComparisonReport> {
    config
        .comparisons
        .iter()
        .filter_map(|comparison| {
            match (run.outcome(&comparison.left), run.outcome(&comparison.right)) {
                (Some(left), Some(right)) => Some(ComparisonReport {
                    left: comparison.left.clone(),
                    right: comparison.right.clone(),
                    months: compare_monthly(&left.series, &right.series),
                }),
                _ => {
                    warn!(
                        left = %comparison.left,
                        right = %comparison.right,
                        "comparison skipped: a dataset it needs failed"
                    );
                    None
                }
            }
        })
        .collect()
}

fn load_dataset(config: &PipelineConfig, name: &str) -> Result<DatasetOutcome> {
    let dataset = config
        .dataset(name)
        .with_context(|| format!("no dataset named '{name}' in config"))?;
    run_dataset(dataset).with_context(|| format!("dataset '{name}' failed"))
}

fn handle_stats(config: &PipelineConfig, args: StatsArgs, json: bool) -> Result<()> {
    let outcome = load_dataset(config, &args.dataset)?;

    let report = DatasetStatsReport::new(&outcome);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_stats(&report);
    }
    Ok(())
}

fn handle_match(config: &PipelineConfig, json: bool) -> Result<()> {
    let matching = config
        .matching
        .as_ref()
        .context("no [matching] section in config")?;

    let reference = load_dataset(config, &matching.reference)?;
    let candidates = load_dataset(config, &matching.candidates)?;

    let result = match_locations(&reference.series, &candidates.series)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report::print_match(&reference.name, &result);
    }
    Ok(())
}
