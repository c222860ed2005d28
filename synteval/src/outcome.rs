//! Outcome classification of captured tool output
//!
//! Every (benchmark, tool) run receives exactly one [`Outcome`] before any
//! payload parsing happens. Classification walks an ordered signature table
//! and stops at the first match. The markers are not mutually exclusive in
//! raw text, so the order of [`SIGNATURES`] is significant: irrelevance and
//! malformed invocations come first, then resource exhaustion, then the
//! external timeout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tools whose run artifacts can be summarized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// Standalone dependency finder
    FindDeps,
    /// Dependency-aware synthesizer
    DepSynt,
    /// Spot's general LTL synthesizer
    Ltlsynt,
    /// Game-based synthesizer
    Strix,
}

/// Payload family of a tool, selecting parser and column set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolFamily {
    /// JSON payload with dependency and automaton metrics
    Dependency,
    /// Dependency payload extended with synthesis phases and BDD statistics
    DependencySynthesis,
    /// Text payload: realizability verdict and wall-clock timing
    GeneralSynthesis,
}

impl Tool {
    /// All supported tools
    pub const ALL: [Tool; 4] = [Tool::FindDeps, Tool::DepSynt, Tool::Ltlsynt, Tool::Strix];

    /// Command-line name of the tool
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindDeps => "find-deps",
            Self::DepSynt => "depsynt",
            Self::Ltlsynt => "ltlsynt",
            Self::Strix => "strix",
        }
    }

    /// Payload family of this tool
    #[must_use]
    pub fn family(&self) -> ToolFamily {
        match self {
            Self::FindDeps => ToolFamily::Dependency,
            Self::DepSynt => ToolFamily::DependencySynthesis,
            Self::Ltlsynt | Self::Strix => ToolFamily::GeneralSynthesis,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tool '{s}'"))
    }
}

/// Captured standard streams of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Create from both streams
    #[must_use]
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether either stream contains `marker`
    #[must_use]
    pub fn contains(&self, marker: &str) -> bool {
        self.stderr.contains(marker) || self.stdout.contains(marker)
    }
}

/// Terminal classification of one tool run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Tool finished and its payload should be parsed
    Success,
    /// External wall-clock limit fired
    Timeout,
    /// Killed by the scheduler or the runtime for memory
    OutOfMemory,
    /// Tool-specific failure, with a fixed description when known
    Error(Option<String>),
    /// Benchmark has no meaningful input/output partition
    Irrelevant,
}

impl Outcome {
    /// Label used in the `Status` column
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Timeout => "Timeout",
            Self::OutOfMemory => "Out-Of-Memory",
            Self::Error(_) => "Error",
            Self::Irrelevant => "Irrelevant",
        }
    }

    /// Whether this is the success outcome
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Error description, only for [`Outcome::Error`]
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => message.as_deref(),
            _ => None,
        }
    }

    fn error(message: &str) -> Self {
        Self::Error(Some(message.to_string()))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A text signature paired with the outcome it implies
pub struct Signature {
    /// Short name used in logs
    pub name: &'static str,
    /// Restricts the signature to these tools (`None` = every tool)
    pub tools: Option<&'static [Tool]>,
    matches: fn(&ToolOutput) -> bool,
    outcome: fn() -> Outcome,
}

impl Signature {
    /// Whether this signature is checked for `tool`
    #[must_use]
    pub fn applies_to(&self, tool: Tool) -> bool {
        self.tools.is_none_or(|tools| tools.contains(&tool))
    }

    /// Whether the captured output carries this signature
    #[must_use]
    pub fn matches(&self, output: &ToolOutput) -> bool {
        (self.matches)(output)
    }

    /// Outcome implied by this signature
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        (self.outcome)()
    }
}

const SPOT_TOOLS: &[Tool] = &[Tool::Ltlsynt];

/// Ordered signature table, first match wins
pub static SIGNATURES: &[Signature] = &[
    Signature {
        name: "empty-partition",
        tools: None,
        matches: |o| o.contains("should follow immediately after the equal sign"),
        outcome: || Outcome::Irrelevant,
    },
    Signature {
        name: "argument-list-too-long",
        tools: None,
        matches: |o| o.contains("Argument list too long"),
        outcome: || Outcome::error("Argument List Too Long"),
    },
    Signature {
        name: "scheduler-oom-kill",
        tools: None,
        matches: |o| {
            o.contains("Detected 1 oom-kill event")
                || (o.contains("slurmstepd: error") && o.contains("oom-kill"))
        },
        outcome: || Outcome::OutOfMemory,
    },
    Signature {
        name: "jvm-out-of-memory",
        tools: None,
        matches: |o| o.contains("java.lang.OutOfMemoryError"),
        outcome: || Outcome::OutOfMemory,
    },
    Signature {
        name: "spot-acceptance-sets",
        tools: Some(SPOT_TOOLS),
        matches: |o| o.contains("ltlsynt: Too many acceptance sets used"),
        outcome: || Outcome::error("Spot Limited Accepting State"),
    },
    Signature {
        name: "spot-odd-cycle",
        tools: Some(SPOT_TOOLS),
        matches: |o| o.contains("ltlsynt: alternate_players(): Odd cycle detected."),
        outcome: || Outcome::error("Spot Odd Cycle Detected"),
    },
    Signature {
        name: "exit-code-124",
        tools: None,
        matches: |o| o.contains("Exited with exit code 124"),
        outcome: || Outcome::Timeout,
    },
];

/// Classify the captured output of `tool`.
///
/// Total over its input: falls through to [`Outcome::Success`].
#[must_use]
pub fn classify(tool: Tool, output: &ToolOutput) -> Outcome {
    SIGNATURES
        .iter()
        .filter(|sig| sig.applies_to(tool))
        .find(|sig| sig.matches(output))
        .map_or(Outcome::Success, Signature::outcome)
}

/// Name of the signature that decided the outcome, if any
#[must_use]
pub fn matching_signature(tool: Tool, output: &ToolOutput) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .filter(|sig| sig.applies_to(tool))
        .find(|sig| sig.matches(output))
        .map(|sig| sig.name)
}
