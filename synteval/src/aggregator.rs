//! Batch aggregation over a results directory
//!
//! Pairs every benchmark descriptor with the `<id>.out` / `<id>.err` artifacts
//! of one tool, classifies and parses each run in parallel and collects the
//! records in discovery order. A missing artifact is a corpus-integrity error
//! and aborts the batch before any run is parsed.

use crate::loader::{BenchmarkDescriptor, Loader, LoaderConfig, LoaderError};
use crate::outcome::{Outcome, Tool, ToolOutput, classify, matching_signature};
use crate::parser::{ParseError, ParseResult, parse_success};
use crate::record::{Realizability, ResultRecord};
use crate::summary::{SummaryRow, project};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error type for aggregation
#[derive(Error, Debug)]
pub enum AggregateError {
    /// Input directory does not exist
    #[error("Directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    /// No descriptor was discovered
    #[error("No benchmarks found in {}", .0.display())]
    NoBenchmarks(PathBuf),
    /// A stdout or stderr artifact is missing for a benchmark
    #[error("Missing artifact for benchmark '{id}': {}", .path.display())]
    MissingArtifact {
        /// Benchmark identifier
        id: String,
        /// Expected artifact path
        path: PathBuf,
    },
    /// IO error when reading artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Descriptor loading error
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
    /// Success payload could not be parsed
    #[error("Malformed payload for benchmark '{id}': {source}")]
    MalformedPayload {
        /// Benchmark identifier
        id: String,
        /// Underlying parse error
        #[source]
        source: ParseError,
    },
    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl AggregateError {
    /// Whether the error concerns a single row and may be skipped in lenient mode
    #[must_use]
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload { .. } | Self::Loader(LoaderError::DescriptorMismatch { .. })
        )
    }
}

/// Result type for aggregation
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Directory holding `<id>.out` / `<id>.err` artifacts
    pub results_dir: PathBuf,
    /// Directory holding benchmark descriptors
    pub benchmarks_dir: PathBuf,
    /// Tool that produced the artifacts
    pub tool: Tool,
    /// Abort on the first row error instead of recording it
    pub strict: bool,
    /// Number of worker threads (0 = rayon default)
    pub num_threads: usize,
    /// Descriptor file extension
    pub descriptor_extension: String,
    /// Captured stdout extension
    pub stdout_extension: String,
    /// Captured stderr extension
    pub stderr_extension: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            benchmarks_dir: PathBuf::from("benchmarks"),
            tool: Tool::FindDeps,
            strict: true,
            num_threads: 0,
            descriptor_extension: "txt".to_string(),
            stdout_extension: "out".to_string(),
            stderr_extension: "err".to_string(),
        }
    }
}

impl AggregatorConfig {
    /// Create a config for one tool's results
    #[must_use]
    pub fn new(
        tool: Tool,
        results_dir: impl Into<PathBuf>,
        benchmarks_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool,
            results_dir: results_dir.into(),
            benchmarks_dir: benchmarks_dir.into(),
            ..Default::default()
        }
    }

    /// Set strict mode
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the number of threads
    #[must_use]
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    /// Set the descriptor extension
    #[must_use]
    pub fn with_descriptor_extension(mut self, ext: impl Into<String>) -> Self {
        self.descriptor_extension = ext.into();
        self
    }

    /// Set the captured-stream extensions
    #[must_use]
    pub fn with_stream_extensions(
        mut self,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.stdout_extension = stdout.into().trim_start_matches('.').to_string();
        self.stderr_extension = stderr.into().trim_start_matches('.').to_string();
        self
    }

    fn artifact_path(&self, id: &str, ext: &str) -> PathBuf {
        self.results_dir.join(format!("{id}.{ext}"))
    }
}

/// Files belonging to one benchmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Benchmark identifier
    pub id: String,
    /// Descriptor path
    pub descriptor: PathBuf,
    /// Captured stdout path
    pub stdout: PathBuf,
    /// Captured stderr path
    pub stderr: PathBuf,
}

impl Artifacts {
    fn read_output(&self) -> std::io::Result<ToolOutput> {
        Ok(ToolOutput::new(read_lossy(&self.stdout)?, read_lossy(&self.stderr)?))
    }
}

fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// A row dropped in lenient mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// Benchmark identifier
    pub id: String,
    /// Rendered error
    pub error: String,
}

/// Outcome counts of one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of records
    pub total: usize,
    /// Successful runs
    pub success: usize,
    /// Timed-out runs
    pub timeout: usize,
    /// Runs killed for memory
    pub out_of_memory: usize,
    /// Runs ending in a tool error
    pub error: usize,
    /// Benchmarks without a meaningful partition
    pub irrelevant: usize,
    /// Successful runs with a realizable verdict
    pub realizable: usize,
    /// Successful runs with an unrealizable verdict
    pub unrealizable: usize,
    /// Rows dropped in lenient mode
    pub failed_rows: usize,
    /// Sum of reported success durations (ms)
    pub total_success_duration: f64,
    /// Mean of reported success durations (ms)
    pub avg_success_duration: Option<f64>,
}

impl RunSummary {
    /// Summarize a list of records
    #[must_use]
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Default::default()
        };
        let mut timed = 0usize;

        for record in records {
            match record.outcome {
                Outcome::Success => summary.success += 1,
                Outcome::Timeout => summary.timeout += 1,
                Outcome::OutOfMemory => summary.out_of_memory += 1,
                Outcome::Error(_) => summary.error += 1,
                Outcome::Irrelevant => summary.irrelevant += 1,
            }

            match record.realizability() {
                Some(Realizability::Realizable) => summary.realizable += 1,
                Some(Realizability::Unrealizable) => summary.unrealizable += 1,
                _ => {}
            }

            if record.outcome.is_success()
                && let Some(duration) = record.total_duration
            {
                summary.total_success_duration += duration;
                timed += 1;
            }
        }

        if timed > 0 {
            summary.avg_success_duration = Some(summary.total_success_duration / timed as f64);
        }

        summary
    }

    /// Percentage of successful runs
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }
}

/// Records of one tool over one corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Tool that produced the artifacts
    pub tool: Tool,
    /// One record per benchmark, in discovery order
    pub records: Vec<ResultRecord>,
    /// Rows dropped in lenient mode
    pub failures: Vec<RowFailure>,
}

impl Dataset {
    /// Create a dataset from records
    #[must_use]
    pub fn new(tool: Tool, records: Vec<ResultRecord>) -> Self {
        Self {
            tool,
            records,
            failures: Vec::new(),
        }
    }

    /// Flattened rows, in record order
    #[must_use]
    pub fn rows(&self) -> Vec<SummaryRow> {
        self.records.iter().map(project).collect()
    }

    /// Outcome counts
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            failed_rows: self.failures.len(),
            ..RunSummary::from_records(&self.records)
        }
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no record
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record of a benchmark, by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResultRecord> {
        self.records.iter().find(|r| r.benchmark.id == id)
    }
}

/// Classify one run and, on success, parse its payload
pub fn evaluate(
    benchmark: Arc<BenchmarkDescriptor>,
    tool: Tool,
    output: &ToolOutput,
) -> ParseResult<ResultRecord> {
    let outcome = classify(tool, output);
    if !outcome.is_success() {
        debug!(
            "{} on {}: {} ({})",
            tool,
            benchmark.id,
            outcome,
            matching_signature(tool, output).unwrap_or("-")
        );
        return Ok(ResultRecord::terminal(benchmark, tool, outcome));
    }

    let parsed = parse_success(tool, output)?;
    Ok(ResultRecord::success(
        benchmark,
        tool,
        parsed.total_duration,
        parsed.metrics,
    ))
}

/// Batch aggregator for one tool's results
pub struct Aggregator {
    config: AggregatorConfig,
    loader: Loader,
}

impl Aggregator {
    /// Create an aggregator
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        let loader = Loader::new(
            LoaderConfig::new(config.benchmarks_dir.clone())
                .with_extension(config.descriptor_extension.as_str()),
        );
        Self { config, loader }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Pair every descriptor with its artifacts, failing on the first missing one
    pub fn collect_artifacts(&self) -> AggregateResult<Vec<Artifacts>> {
        for dir in [&self.config.benchmarks_dir, &self.config.results_dir] {
            if !dir.is_dir() {
                return Err(AggregateError::MissingDirectory(dir.clone()));
            }
        }

        let descriptors = self.loader.discover()?;
        if descriptors.is_empty() {
            return Err(AggregateError::NoBenchmarks(
                self.config.benchmarks_dir.clone(),
            ));
        }
        info!("Found {} benchmarks", descriptors.len());

        let mut artifacts = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let id = Loader::id_from_path(&descriptor)?;
            let stdout = self.config.artifact_path(&id, &self.config.stdout_extension);
            let stderr = self.config.artifact_path(&id, &self.config.stderr_extension);

            for path in [&stdout, &stderr] {
                if !path.is_file() {
                    return Err(AggregateError::MissingArtifact {
                        id,
                        path: path.clone(),
                    });
                }
            }

            artifacts.push(Artifacts {
                id,
                descriptor,
                stdout,
                stderr,
            });
        }

        Ok(artifacts)
    }

    /// Run the batch
    pub fn run(&self) -> AggregateResult<Dataset> {
        let start = Instant::now();
        let artifacts = self.collect_artifacts()?;

        let pool = if self.config.num_threads > 0 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.num_threads)
                    .build()?,
            )
        } else {
            None
        };

        let process_all = || {
            artifacts
                .par_iter()
                .map(|a| self.process(a))
                .collect::<Vec<_>>()
        };
        let results = match pool {
            Some(pool) => pool.install(process_all),
            None => process_all(),
        };

        let mut dataset = Dataset::new(self.config.tool, Vec::with_capacity(results.len()));
        for (artifact, result) in artifacts.iter().zip(results) {
            match result {
                Ok(record) => dataset.records.push(record),
                Err(e) if !self.config.strict && e.is_row_error() => {
                    warn!("Skipping benchmark {}: {}", artifact.id, e);
                    dataset.failures.push(RowFailure {
                        id: artifact.id.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Summarized {} {} results in {:.2?} ({} skipped)",
            dataset.len(),
            self.config.tool,
            start.elapsed(),
            dataset.failures.len()
        );

        Ok(dataset)
    }

    fn process(&self, artifacts: &Artifacts) -> AggregateResult<ResultRecord> {
        let descriptor = self
            .loader
            .load_with_id(&artifacts.descriptor, &artifacts.id)?;
        let output = artifacts.read_output()?;

        evaluate(Arc::new(descriptor), self.config.tool, &output).map_err(|source| {
            AggregateError::MalformedPayload {
                id: artifacts.id.clone(),
                source,
            }
        })
    }
}
