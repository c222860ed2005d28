//! Typed result records
//!
//! One [`ResultRecord`] exists per (benchmark, tool) pair. Tool-specific
//! metrics are only present on successful runs and come in exactly one of
//! three shapes, chosen by the tool's [`ToolFamily`]. Values a tool did not
//! report stay `None` so that "not reported" never reads as zero.

use crate::loader::BenchmarkDescriptor;
use crate::outcome::{Outcome, Tool, ToolFamily};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Whether a winning strategy exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Realizability {
    /// A strategy exists
    Realizable,
    /// No strategy exists
    Unrealizable,
    /// Tool gave no verdict
    #[default]
    Unknown,
}

impl Realizability {
    /// Parse the tools' verdict token; anything unrecognized is `Unknown`
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "REALIZABLE" => Self::Realizable,
            "UNREALIZABLE" => Self::Unrealizable,
            _ => Self::Unknown,
        }
    }

    /// Verdict token as printed by the tools
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realizable => "REALIZABLE",
            Self::Unrealizable => "UNREALIZABLE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Realizability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Automaton construction metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomatonMetrics {
    /// Whether the automaton was built before the run ended
    pub is_built: bool,
    /// Construction time in milliseconds
    pub build_duration: Option<f64>,
    /// Number of states, only when built
    pub total_states: Option<i64>,
    /// Number of edges, only when built
    pub total_edges: Option<i64>,
    /// State-based acceptance status ("true", "false", "maybe"), only when built
    pub state_based_status: Option<String>,
}

/// Metrics of the dependency search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyMetrics {
    /// Outputs proven functionally dependent on the others
    pub dependent_variables: Vec<String>,
    /// Tested outputs that are not dependent
    pub independent_variables: Vec<String>,
    /// Automaton construction metrics
    pub automaton: AutomatonMetrics,
    /// Number of explored state pairs
    pub total_pair_states: Option<i64>,
    /// Time spent searching state pairs (ms)
    pub search_pair_states_duration: Option<f64>,
    /// Total time of the dependency search (ms)
    pub find_dependency_duration: Option<f64>,
}

/// BDD size statistics of one automaton
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BddSummary {
    /// Average BDD size
    pub avg_size: f64,
    /// Largest BDD
    pub max_size: i64,
    /// Smallest BDD
    pub min_size: i64,
    /// Number of BDD instances
    pub instance_count: i64,
    /// Total size counting shared nodes once
    pub total_size_deduplicated: i64,
    /// Total size counting shared nodes per use
    pub total_size_with_duplicates: i64,
}

/// Metrics of the dependency-aware synthesizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisMetrics {
    /// Dependency search metrics of the same run
    pub dependency: DependencyMetrics,
    /// Realizability of the independent-variable game
    pub realizability: Realizability,
    /// Independent-strategy synthesis time (ms)
    pub independent_synthesis_duration: f64,
    /// Dependent-strategy synthesis time (ms), `0` when the phase was skipped
    pub dependent_synthesis_duration: f64,
    /// Strategy merge time (ms)
    pub merge_duration: Option<f64>,
    /// Model checking verdict of the final strategy
    pub model_checking_status: Option<String>,
    /// Model checking time (ms)
    pub model_checking_duration: Option<f64>,
    /// BDD statistics of the original NBA
    pub origin_bdd: Option<BddSummary>,
    /// BDD statistics of the projected NBA
    pub projected_bdd: Option<BddSummary>,
}

impl SynthesisMetrics {
    /// Independent plus (normalized) dependent synthesis time
    #[must_use]
    pub fn total_synthesis_duration(&self) -> f64 {
        self.independent_synthesis_duration + self.dependent_synthesis_duration
    }
}

/// Metrics of a general (dependency-unaware) synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSynthesisMetrics {
    /// Verdict found in the tool's output
    pub realizability: Realizability,
}

/// Tool-specific metrics of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metrics {
    /// Dependency finder
    Dependency(DependencyMetrics),
    /// Dependency-aware synthesizer
    Synthesis(SynthesisMetrics),
    /// General synthesizer
    General(GeneralSynthesisMetrics),
}

impl Metrics {
    /// Family this metrics shape belongs to
    #[must_use]
    pub fn family(&self) -> ToolFamily {
        match self {
            Self::Dependency(_) => ToolFamily::Dependency,
            Self::Synthesis(_) => ToolFamily::DependencySynthesis,
            Self::General(_) => ToolFamily::GeneralSynthesis,
        }
    }

    /// Dependency metrics, for the families that carry them
    #[must_use]
    pub fn dependency(&self) -> Option<&DependencyMetrics> {
        match self {
            Self::Dependency(dep) => Some(dep),
            Self::Synthesis(synt) => Some(&synt.dependency),
            Self::General(_) => None,
        }
    }

    /// Realizability verdict, for the synthesis families
    #[must_use]
    pub fn realizability(&self) -> Option<Realizability> {
        match self {
            Self::Dependency(_) => None,
            Self::Synthesis(synt) => Some(synt.realizability),
            Self::General(general) => Some(general.realizability),
        }
    }
}

/// Result of one tool on one benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Benchmark the tool ran on
    pub benchmark: Arc<BenchmarkDescriptor>,
    /// Tool that produced the artifacts
    pub tool: Tool,
    /// Terminal classification
    pub outcome: Outcome,
    /// Total run time in milliseconds, only on success and only when reported
    pub total_duration: Option<f64>,
    /// Tool-specific metrics, only on success
    pub metrics: Option<Metrics>,
}

impl ResultRecord {
    /// Record for a run that ended in a terminal non-success outcome
    #[must_use]
    pub fn terminal(benchmark: Arc<BenchmarkDescriptor>, tool: Tool, outcome: Outcome) -> Self {
        debug_assert!(!outcome.is_success());
        Self {
            benchmark,
            tool,
            outcome,
            total_duration: None,
            metrics: None,
        }
    }

    /// Record for a successful run
    #[must_use]
    pub fn success(
        benchmark: Arc<BenchmarkDescriptor>,
        tool: Tool,
        total_duration: Option<f64>,
        metrics: Metrics,
    ) -> Self {
        debug_assert_eq!(tool.family(), metrics.family());
        Self {
            benchmark,
            tool,
            outcome: Outcome::Success,
            total_duration,
            metrics: Some(metrics),
        }
    }

    /// Error description, only when the outcome is an error
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.outcome.error_message()
    }

    /// Dependency metrics, when the run succeeded with a dependency-bearing tool
    #[must_use]
    pub fn dependency(&self) -> Option<&DependencyMetrics> {
        self.metrics.as_ref().and_then(Metrics::dependency)
    }

    /// Realizability verdict, when the run succeeded with a synthesis tool
    #[must_use]
    pub fn realizability(&self) -> Option<Realizability> {
        self.metrics.as_ref().and_then(Metrics::realizability)
    }
}
