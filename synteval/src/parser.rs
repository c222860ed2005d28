//! Tool-specific success payload parsers
//!
//! Parsers only run once a run has been classified as
//! [`Outcome::Success`](crate::outcome::Outcome::Success). The dependency
//! finder and the dependency-aware synthesizer print a JSON measures document;
//! general synthesizers are scraped from text (verdict token on stdout,
//! `time`-style `real` line on stderr). A success run whose payload does not
//! have the expected shape is a [`ParseError`], never a different outcome.

use crate::outcome::{Tool, ToolFamily, ToolOutput};
use crate::record::{
    AutomatonMetrics, BddSummary, DependencyMetrics, GeneralSynthesisMetrics, Metrics,
    Realizability, SynthesisMetrics,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Error type for payload parsing
#[derive(Error, Debug)]
pub enum ParseError {
    /// Payload is not valid JSON or misses required keys
    #[error("invalid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    /// Stdout holds no payload at all
    #[error("stdout is empty")]
    EmptyPayload,
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Reported by the synthesizer when the dependent phase did not run
pub const SKIPPED_PHASE_DURATION: f64 = -1.0;

/// Outcome-independent part of a parsed success payload
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPayload {
    /// Total run time in milliseconds, when the tool reported it
    pub total_duration: Option<f64>,
    /// Tool-specific metrics
    pub metrics: Metrics,
}

#[derive(Debug, Deserialize)]
struct TestedDependency {
    name: String,
    is_dependent: bool,
}

#[derive(Debug, Deserialize)]
struct DependencySection {
    tested_dependencies: Vec<TestedDependency>,
    total_pair_state: Option<i64>,
    search_pair_state_duration: Option<f64>,
    total_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AutomatonSection {
    is_built: bool,
    build_duration: Option<f64>,
    total_states: Option<i64>,
    total_edges: Option<i64>,
    state_based_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DependencyPayload {
    total_time: f64,
    dependency: DependencySection,
    automaton: AutomatonSection,
}

#[derive(Debug, Deserialize)]
struct IndependentStrategy {
    realizability: String,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct DependentStrategy {
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct SynthesisSection {
    independent_strategy: IndependentStrategy,
    dependent_strategy: DependentStrategy,
    merge_strategies_duration: Option<f64>,
    model_checking_status: Option<String>,
    model_checking_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BddPayload {
    avg_bdd_size: f64,
    max_bdd_size: i64,
    min_bdd_size: i64,
    total_bdds: i64,
    total_bdds_size_not_repeated: i64,
    total_bdds_size_repeated: i64,
}

#[derive(Debug, Default, Deserialize)]
struct BddSection {
    origin_nba: Option<BddPayload>,
    projected_nba: Option<BddPayload>,
}

#[derive(Debug, Deserialize)]
struct SynthesisPayload {
    total_time: f64,
    dependency: DependencySection,
    automaton: AutomatonSection,
    synthesis: SynthesisSection,
    #[serde(default)]
    bdd_summary: BddSection,
}

impl From<BddPayload> for BddSummary {
    fn from(bdd: BddPayload) -> Self {
        Self {
            avg_size: bdd.avg_bdd_size,
            max_size: bdd.max_bdd_size,
            min_size: bdd.min_bdd_size,
            instance_count: bdd.total_bdds,
            total_size_deduplicated: bdd.total_bdds_size_not_repeated,
            total_size_with_duplicates: bdd.total_bdds_size_repeated,
        }
    }
}

impl From<AutomatonSection> for AutomatonMetrics {
    fn from(aut: AutomatonSection) -> Self {
        // Detail fields of an automaton that was never built are meaningless
        let built = aut.is_built;
        Self {
            is_built: built,
            build_duration: aut.build_duration,
            total_states: aut.total_states.filter(|_| built),
            total_edges: aut.total_edges.filter(|_| built),
            state_based_status: aut.state_based_status.filter(|_| built),
        }
    }
}

/// Partition tested outputs by their dependency flag.
///
/// Source order is kept within each side; a name tested twice keeps its
/// first verdict so the two sides stay disjoint.
fn partition(tested: Vec<TestedDependency>) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut dependent = Vec::new();
    let mut independent = Vec::new();

    for var in tested {
        if !seen.insert(var.name.clone()) {
            debug!("Ignoring repeated dependency verdict for '{}'", var.name);
            continue;
        }
        if var.is_dependent {
            dependent.push(var.name);
        } else {
            independent.push(var.name);
        }
    }

    (dependent, independent)
}

fn dependency_metrics(
    dependency: DependencySection,
    automaton: AutomatonSection,
) -> DependencyMetrics {
    let (dependent_variables, independent_variables) = partition(dependency.tested_dependencies);
    DependencyMetrics {
        dependent_variables,
        independent_variables,
        automaton: automaton.into(),
        total_pair_states: dependency.total_pair_state,
        search_pair_states_duration: dependency.search_pair_state_duration,
        find_dependency_duration: dependency.total_duration,
    }
}

/// Map the skipped-phase sentinel to zero
#[must_use]
pub fn normalize_phase_duration(duration: f64) -> f64 {
    if duration == SKIPPED_PHASE_DURATION {
        0.0
    } else {
        duration
    }
}

/// Parse a dependency finder measures document
pub fn parse_dependency(payload: &str) -> ParseResult<ParsedPayload> {
    let doc: DependencyPayload = serde_json::from_str(payload)?;
    Ok(ParsedPayload {
        total_duration: Some(doc.total_time),
        metrics: Metrics::Dependency(dependency_metrics(doc.dependency, doc.automaton)),
    })
}

/// Parse a dependency-aware synthesizer measures document
pub fn parse_dependency_synthesis(payload: &str) -> ParseResult<ParsedPayload> {
    let doc: SynthesisPayload = serde_json::from_str(payload)?;
    let synthesis = doc.synthesis;

    let metrics = SynthesisMetrics {
        dependency: dependency_metrics(doc.dependency, doc.automaton),
        realizability: Realizability::parse(&synthesis.independent_strategy.realizability),
        independent_synthesis_duration: synthesis.independent_strategy.duration,
        dependent_synthesis_duration: normalize_phase_duration(
            synthesis.dependent_strategy.duration,
        ),
        merge_duration: synthesis.merge_strategies_duration,
        model_checking_status: synthesis.model_checking_status,
        model_checking_duration: synthesis.model_checking_duration,
        origin_bdd: doc.bdd_summary.origin_nba.map(BddSummary::from),
        projected_bdd: doc.bdd_summary.projected_nba.map(BddSummary::from),
    };

    Ok(ParsedPayload {
        total_duration: Some(doc.total_time),
        metrics: Metrics::Synthesis(metrics),
    })
}

static REALIZABILITY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"UNREALIZABLE|REALIZABLE").expect("valid regex"));

static WALL_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\breal\s+(\d+)m(\d+(?:\.\d+)?)s").expect("valid regex")
});

/// First realizability verdict token anywhere in `text`
#[must_use]
pub fn find_realizability(text: &str) -> Realizability {
    REALIZABILITY_TOKEN
        .find(text)
        .map_or(Realizability::Unknown, |m| Realizability::parse(m.as_str()))
}

/// Wall-clock time in milliseconds from a `real <m>m<s>s` line
#[must_use]
pub fn parse_wall_clock(text: &str) -> Option<f64> {
    let caps = WALL_CLOCK.captures(text)?;
    let minutes: f64 = caps[1].parse().ok()?;
    let seconds: f64 = caps[2].parse().ok()?;
    Some((minutes * 60.0 + seconds) * 1000.0)
}

/// Scrape a general synthesizer's output; never fails
#[must_use]
pub fn parse_general_synthesis(output: &ToolOutput) -> ParsedPayload {
    let total_duration = parse_wall_clock(&output.stderr);
    if total_duration.is_none() {
        debug!("No wall-clock line in stderr, duration not reported");
    }

    ParsedPayload {
        total_duration,
        metrics: Metrics::General(GeneralSynthesisMetrics {
            realizability: find_realizability(&output.stdout),
        }),
    }
}

/// Locate the JSON document in a tool's stdout.
///
/// The dependency finder prints only the document. The synthesizer logs
/// progress first and prints the document as its last non-blank line.
pub fn extract_payload(tool: Tool, stdout: &str) -> ParseResult<&str> {
    let payload = match tool.family() {
        ToolFamily::DependencySynthesis => stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default(),
        _ => stdout.trim(),
    };

    if payload.is_empty() {
        Err(ParseError::EmptyPayload)
    } else {
        Ok(payload)
    }
}

/// Parse the success payload of `tool`
pub fn parse_success(tool: Tool, output: &ToolOutput) -> ParseResult<ParsedPayload> {
    match tool.family() {
        ToolFamily::Dependency => parse_dependency(extract_payload(tool, &output.stdout)?),
        ToolFamily::DependencySynthesis => {
            parse_dependency_synthesis(extract_payload(tool, &output.stdout)?)
        }
        ToolFamily::GeneralSynthesis => Ok(parse_general_synthesis(output)),
    }
}
