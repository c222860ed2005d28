//! Synteval - Reactive Synthesis Result Summarization
//!
//! This crate turns the captured output of reactive-synthesis and dependency
//! analysis tools into uniform tabular records, one row per benchmark.
//!
//! # Features
//!
//! - Benchmark descriptor discovery and loading
//! - Priority-ordered outcome classification of captured stdout/stderr
//! - Tool-specific payload parsing (JSON and text)
//! - Flattening of nested metrics into stable column sets
//! - Parallel batch aggregation using rayon
//! - CSV, JSON and text reports
//! - Cross-tool comparison, cactus data and virtual best tool
//!
//! # Examples
//!
//! ## Summarizing a Results Directory
//!
//! ```no_run
//! use synteval::{Aggregator, AggregatorConfig, Reporter, Tool};
//!
//! let config = AggregatorConfig::new(Tool::FindDeps, "/path/to/results", "/path/to/benchmarks")
//!     .with_num_threads(4);
//! let dataset = Aggregator::new(config).run().expect("Failed to summarize results");
//!
//! Reporter::csv()
//!     .write_to_file(&dataset, "summary.csv")
//!     .expect("Failed to write summary");
//! ```
//!
//! ## Classifying a Single Run
//!
//! ```
//! use synteval::{Outcome, Tool, ToolOutput, classify};
//!
//! let output = ToolOutput::new("", "slurmstepd: error: Detected 1 oom-kill event(s)");
//! assert_eq!(classify(Tool::DepSynt, &output), Outcome::OutOfMemory);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod loader;
pub mod outcome;
pub mod parser;
pub mod record;
pub mod reporter;
pub mod statistics;
pub mod summary;

pub use aggregator::{
    AggregateError, AggregateResult, Aggregator, AggregatorConfig, Dataset, RowFailure, RunSummary,
    evaluate,
};
pub use loader::{BenchmarkDescriptor, Loader, LoaderConfig, LoaderError};
pub use outcome::{Outcome, Tool, ToolFamily, ToolOutput, classify};
pub use parser::{ParseError, ParsedPayload, parse_success};
pub use record::{
    AutomatonMetrics, BddSummary, DependencyMetrics, GeneralSynthesisMetrics, Metrics,
    Realizability, ResultRecord, SynthesisMetrics,
};
pub use reporter::{ReportFormat, Reporter, ReporterConfig, ReporterError};
pub use statistics::{
    CactusPoint, Comparison, StatisticsError, VirtualBestResult, cactus_data, virtual_best,
};
pub use summary::{FieldValue, SummaryRow, project};
