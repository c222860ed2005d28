//! Subcommand execution

use crate::{CompareArgs, OutputFormat, RunArgs, SummarizeArgs};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use synteval::reporter::write_csv;
use synteval::statistics::{CactusPoint, virtual_best, virtual_best_cactus};
use synteval::{
    AggregateError, Aggregator, AggregatorConfig, Comparison, Dataset, Reporter, ReporterConfig,
    ReporterError, StatisticsError, Tool, cactus_data,
};
use thiserror::Error;
use tracing::info;

/// Errors surfaced to the user
#[derive(Error, Debug)]
pub enum CliError {
    /// Batch aggregation failed
    #[error("{0}")]
    Aggregate(#[from] AggregateError),
    /// Datasets could not be combined
    #[error("{0}")]
    Statistics(#[from] StatisticsError),
    /// Report could not be written
    #[error("{0}")]
    Report(#[from] ReporterError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Configuration file could not be parsed
    #[error("Invalid configuration file {}: {source}", .path.display())]
    Config {
        /// Configuration file path
        path: PathBuf,
        /// YAML error
        #[source]
        source: serde_yaml::Error,
    },
    /// No benchmark directory on the command line or in the config
    #[error("No benchmarks path given (use --benchmarks-path or the config file)")]
    MissingBenchmarks,
}

/// Result type for subcommands
pub type CliResult<T> = Result<T, CliError>;

fn aggregate(tool: Tool, results: &Path, run: &RunArgs) -> CliResult<Dataset> {
    let benchmarks = run
        .benchmarks_path
        .as_ref()
        .ok_or(CliError::MissingBenchmarks)?;

    let config = AggregatorConfig::new(tool, results, benchmarks)
        .with_strict(!run.lenient)
        .with_num_threads(run.threads.unwrap_or(0));
    Ok(Aggregator::new(config).run()?)
}

/// Open the output file, or stdout when none is given
fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

/// Run the `summarize` subcommand
pub fn run_summarize(args: &SummarizeArgs) -> CliResult<()> {
    let tool = Tool::from(args.tool);
    let dataset = aggregate(tool, &args.results_path, &args.run)?;

    let format = args.format.unwrap_or(OutputFormat::Csv);
    let reporter = Reporter::new(ReporterConfig::new(format.into()));

    match &args.output {
        Some(path) => {
            reporter.write_to_file(&dataset, path)?;
            info!("Wrote {} rows to {}", dataset.len(), path.display());
        }
        None => {
            let mut out = open_output(None)?;
            reporter.write_report(&dataset, &mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct CactusReport {
    tools: BTreeMap<Tool, Vec<CactusPoint>>,
    virtual_best: Vec<CactusPoint>,
}

/// Run the `compare` subcommand
pub fn run_compare(args: &CompareArgs) -> CliResult<()> {
    let mut seen = BTreeSet::new();
    if let Some((tool, _)) = args.runs.iter().find(|(tool, _)| !seen.insert(*tool)) {
        return Err(StatisticsError::DuplicateTool(*tool).into());
    }

    let datasets = args
        .runs
        .iter()
        .map(|(tool, dir)| aggregate(*tool, dir, &args.run))
        .collect::<CliResult<Vec<_>>>()?;

    let comparison = Comparison::from_datasets(&datasets)?;
    if comparison.rows().is_empty() {
        return Err(ReporterError::EmptyDataset.into());
    }
    for (tool, solved) in comparison.solved_counts() {
        info!("{}: {} solved", tool, solved);
    }

    let mut out = open_output(args.output.as_deref())?;
    write_csv(comparison.rows(), &mut out)?;
    out.flush()?;

    if let Some(path) = &args.cactus {
        let vbs = virtual_best(&datasets);
        let report = CactusReport {
            tools: datasets.iter().map(|d| (d.tool, cactus_data(d))).collect(),
            virtual_best: virtual_best_cactus(&vbs),
        };
        let mut file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut file, &report)?;
        file.flush()?;
        info!("Wrote cactus data to {}", path.display());
    }

    Ok(())
}
