//! Synteval CLI - Command-line interface for benchmark result summarization

mod commands;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use synteval::{ReportFormat, Tool};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{CliError, run_compare, run_summarize};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CliConfig {
    /// Default verbosity level
    #[serde(default)]
    verbosity: Option<String>,
    /// Default report format
    #[serde(default)]
    format: Option<String>,
    /// Default number of threads
    #[serde(default)]
    threads: Option<usize>,
    /// Record malformed rows instead of aborting
    #[serde(default)]
    lenient: Option<bool>,
    /// Default benchmark descriptor directory
    #[serde(default)]
    benchmarks_path: Option<PathBuf>,
}

impl CliConfig {
    /// Default configuration file location
    fn default_path() -> Option<PathBuf> {
        dirs::home_dir()
            .map(|mut p| {
                p.push(".syntevalrc");
                p
            })
            .filter(|p| p.exists())
            .or_else(|| {
                dirs::config_dir().map(|mut p| {
                    p.push("synteval");
                    p.push("config.yaml");
                    p
                })
            })
    }

    /// Load configuration from an explicit file, or from the default location
    ///
    /// A broken explicit file is an error; a broken default file is ignored.
    fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = explicit {
            let contents = fs::read_to_string(path)?;
            return serde_yaml::from_str(&contents).map_err(|source| CliError::Config {
                path: path.to_path_buf(),
                source,
            });
        }

        if let Some(path) = Self::default_path()
            && path.exists()
            && let Ok(contents) = fs::read_to_string(&path)
            && let Ok(config) = serde_yaml::from_str(&contents)
        {
            return Ok(config);
        }

        Ok(Self::default())
    }

    /// Merge configuration with command-line arguments
    fn merge_with_args(&self, args: &mut Args) {
        // Only apply config if arg is not explicitly set
        if args.verbosity == Verbosity::Normal
            && let Some(ref v) = self.verbosity
            && let Ok(level) = Verbosity::from_str(v, true)
        {
            args.verbosity = level;
        }

        let run = match &mut args.command {
            Command::Summarize(cmd) => {
                if cmd.format.is_none()
                    && let Some(ref f) = self.format
                {
                    cmd.format = OutputFormat::from_str(f, true).ok();
                }
                &mut cmd.run
            }
            Command::Compare(cmd) => &mut cmd.run,
        };

        if run.benchmarks_path.is_none() {
            run.benchmarks_path.clone_from(&self.benchmarks_path);
        }
        if run.threads.is_none() {
            run.threads = self.threads;
        }
        if !run.lenient {
            run.lenient = self.lenient.unwrap_or(false);
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    /// Comma-separated table (default)
    Csv,
    /// JSON document with summary
    Json,
    /// Human-readable summary
    Text,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ReportFormat::Csv,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Text => ReportFormat::Text,
        }
    }
}

/// Tool that produced the results
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ToolArg {
    /// Standalone dependency finder
    #[value(name = "find-deps")]
    FindDeps,
    /// Dependency-aware synthesizer
    #[value(name = "depsynt")]
    DepSynt,
    /// Spot's ltlsynt
    Ltlsynt,
    /// Strix
    Strix,
}

impl From<ToolArg> for Tool {
    fn from(tool: ToolArg) -> Self {
        match tool {
            ToolArg::FindDeps => Tool::FindDeps,
            ToolArg::DepSynt => Tool::DepSynt,
            ToolArg::Ltlsynt => Tool::Ltlsynt,
            ToolArg::Strix => Tool::Strix,
        }
    }
}

/// Verbosity level
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings and errors
    Normal,
    /// Progress information
    Verbose,
    /// Debug output
    Debug,
    /// Trace output
    Trace,
}

impl Verbosity {
    fn level(self) -> Level {
        match self {
            Verbosity::Quiet => Level::ERROR,
            Verbosity::Normal => Level::WARN,
            Verbosity::Verbose => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Trace => Level::TRACE,
        }
    }
}

/// Synteval - Reactive Synthesis Benchmark Result Summarizer
#[derive(Parser, Debug, Clone)]
#[command(name = "synteval")]
#[command(version)]
#[command(about = "Classify and summarize reactive synthesis benchmark results")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (YAML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, value_enum, default_value = "normal", global = true)]
    verbosity: Verbosity,

    /// Suppress everything but errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Summarize one tool's results into a table
    Summarize(SummarizeArgs),
    /// Combine several tools' results over the same corpus
    Compare(CompareArgs),
}

/// Options shared by every batch run
#[derive(ClapArgs, Debug, Clone)]
struct RunArgs {
    /// Directory of benchmark descriptors (`<id>.txt`)
    #[arg(short, long, value_name = "DIR")]
    benchmarks_path: Option<PathBuf>,

    /// Record malformed rows and continue instead of aborting
    #[arg(long)]
    lenient: bool,

    /// Number of worker threads (0 = all cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

#[derive(ClapArgs, Debug, Clone)]
struct SummarizeArgs {
    /// Tool that produced the results
    #[arg(short, long, value_enum)]
    tool: ToolArg,

    /// Directory of `<id>.out` / `<id>.err` artifacts
    #[arg(short, long, value_name = "DIR", alias = "result-path")]
    results_path: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "FILE", alias = "summary-output")]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct CompareArgs {
    /// Results of one tool, as TOOL=DIR (repeatable)
    #[arg(long = "run", value_name = "TOOL=DIR", required = true, value_parser = parse_run)]
    runs: Vec<(Tool, PathBuf)>,

    /// Output file for the combined table (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write cactus plot data (JSON) to this file
    #[arg(long, value_name = "FILE")]
    cactus: Option<PathBuf>,

    #[command(flatten)]
    run: RunArgs,
}

/// Parse a `TOOL=DIR` pair
fn parse_run(s: &str) -> Result<(Tool, PathBuf), String> {
    let (tool, dir) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TOOL=DIR, got '{s}'"))?;
    if dir.is_empty() {
        return Err(format!("missing directory in '{s}'"));
    }
    Ok((tool.parse()?, PathBuf::from(dir)))
}

fn main() {
    let mut args = Args::parse();

    // Load configuration file and merge with args
    let config = match CliConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&mut args);

    // Determine verbosity level
    let verbosity = if args.quiet {
        Verbosity::Quiet
    } else {
        args.verbosity
    };

    // Set up logging; stdout is reserved for reports
    let subscriber = FmtSubscriber::builder()
        .with_max_level(verbosity.level())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    let result = match &args.command {
        Command::Summarize(cmd) => run_summarize(cmd),
        Command::Compare(cmd) => run_compare(cmd),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
