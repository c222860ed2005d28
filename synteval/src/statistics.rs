//! Cross-tool comparison
//!
//! Combines datasets of several tools over the same corpus into one table,
//! derives cactus-plot series and computes the virtual best tool.

use crate::aggregator::Dataset;
use crate::loader::compare_ids;
use crate::outcome::Tool;
use crate::record::ResultRecord;
use crate::summary::{FieldValue, SummaryRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Errors building a cross-tool comparison
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatisticsError {
    /// Two datasets belong to the same tool, so their columns would collide
    #[error("Tool '{0}' appears in more than one dataset")]
    DuplicateTool(Tool),
}

/// Result type for comparisons
pub type StatisticsResult<T> = Result<T, StatisticsError>;

/// Cactus plot data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CactusPoint {
    /// Number of benchmarks solved
    pub solved: usize,
    /// Time in seconds at which this many were solved
    pub time: f64,
}

/// Wall time of a successful run, in milliseconds
fn solved_time(record: &ResultRecord) -> Option<f64> {
    if record.outcome.is_success() {
        record.total_duration
    } else {
        None
    }
}

fn cactus_from_millis(mut times: Vec<f64>) -> Vec<CactusPoint> {
    times.sort_by(f64::total_cmp);
    times
        .into_iter()
        .enumerate()
        .map(|(i, ms)| CactusPoint {
            solved: i + 1,
            time: ms / 1000.0,
        })
        .collect()
}

/// Generate cactus plot data from a dataset
///
/// Successful runs without a reported duration are left out.
#[must_use]
pub fn cactus_data(dataset: &Dataset) -> Vec<CactusPoint> {
    cactus_from_millis(dataset.records.iter().filter_map(solved_time).collect())
}

/// Per-benchmark view across tools
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    tools: Vec<Tool>,
    rows: Vec<SummaryRow>,
}

impl Comparison {
    /// Build the combined table, one row per benchmark id
    ///
    /// Tools keep the order of `datasets`. A benchmark missing from a dataset
    /// gets null cells for that tool. Each tool may appear only once.
    pub fn from_datasets(datasets: &[Dataset]) -> StatisticsResult<Self> {
        let tools: Vec<Tool> = datasets.iter().map(|d| d.tool).collect();
        let mut seen = BTreeSet::new();
        if let Some(tool) = tools.iter().find(|t| !seen.insert(**t)) {
            return Err(StatisticsError::DuplicateTool(*tool));
        }

        let mut names: HashMap<&str, &str> = HashMap::new();
        for record in datasets.iter().flat_map(|d| &d.records) {
            names
                .entry(record.benchmark.id.as_str())
                .or_insert(record.benchmark.name.as_str());
        }
        let mut ids: Vec<&str> = names.keys().copied().collect();
        ids.sort_by(|a, b| compare_ids(a, b));

        let indexed: Vec<HashMap<&str, &ResultRecord>> = datasets
            .iter()
            .map(|d| {
                d.records
                    .iter()
                    .map(|r| (r.benchmark.id.as_str(), r))
                    .collect()
            })
            .collect();

        let rows = ids
            .into_iter()
            .map(|id| {
                let mut row = SummaryRow::new();
                row.push("Benchmark Id", id);
                row.push("Benchmark Name", names.get(id).copied());
                for (tool, records) in tools.iter().zip(&indexed) {
                    let record = records.get(id);
                    row.push(
                        format!("{tool}_status"),
                        record.map(|r| r.outcome.as_str()),
                    );
                    row.push(
                        format!("{tool}_duration"),
                        record.and_then(|r| solved_time(r)),
                    );
                }
                row
            })
            .collect();

        Ok(Self { tools, rows })
    }

    /// Tools in column order
    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Combined rows, ordered by benchmark id
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Number of benchmarks solved by each tool
    #[must_use]
    pub fn solved_counts(&self) -> BTreeMap<Tool, usize> {
        self.tools
            .iter()
            .map(|tool| {
                let key = format!("{tool}_status");
                let solved = self
                    .rows
                    .iter()
                    .filter(|row| row.get(&key).and_then(FieldValue::as_text) == Some("Success"))
                    .count();
                (*tool, solved)
            })
            .collect()
    }
}

/// Fastest successful tool on one benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualBestResult {
    /// Benchmark identifier
    pub id: String,
    /// Winning tool, `None` when no tool succeeded
    pub best_tool: Option<Tool>,
    /// Winning time in milliseconds
    pub duration: Option<f64>,
    /// Tools that succeeded on this benchmark
    pub solved_by: Vec<Tool>,
}

impl VirtualBestResult {
    /// Whether any tool succeeded
    #[must_use]
    pub fn is_solved(&self) -> bool {
        !self.solved_by.is_empty()
    }

    /// The single tool that succeeded, if exactly one did
    #[must_use]
    pub fn unique_solver(&self) -> Option<Tool> {
        match self.solved_by.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// Compute the virtual best tool per benchmark, ordered by benchmark id
///
/// A successful run without a reported duration counts as solved but only
/// wins when no timed run exists. Ties go to the earlier dataset.
#[must_use]
pub fn virtual_best(datasets: &[Dataset]) -> Vec<VirtualBestResult> {
    let mut by_id: BTreeMap<String, Vec<&ResultRecord>> = BTreeMap::new();
    for record in datasets.iter().flat_map(|d| &d.records) {
        by_id
            .entry(record.benchmark.id.clone())
            .or_default()
            .push(record);
    }

    let mut results: Vec<VirtualBestResult> = by_id
        .into_iter()
        .map(|(id, records)| {
            let solved: Vec<&ResultRecord> = records
                .into_iter()
                .filter(|r| r.outcome.is_success())
                .collect();

            let mut best: Option<&ResultRecord> = None;
            for &record in &solved {
                best = match (best, record.total_duration) {
                    (None, _) => Some(record),
                    (Some(current), Some(time))
                        if current.total_duration.is_none_or(|t| time < t) =>
                    {
                        Some(record)
                    }
                    (keep, _) => keep,
                };
            }

            VirtualBestResult {
                id,
                best_tool: best.map(|r| r.tool),
                duration: best.and_then(|r| r.total_duration),
                solved_by: solved.iter().map(|r| r.tool).collect(),
            }
        })
        .collect();

    results.sort_by(|a, b| compare_ids(&a.id, &b.id));
    results
}

/// Cactus plot data of the virtual best tool
#[must_use]
pub fn virtual_best_cactus(results: &[VirtualBestResult]) -> Vec<CactusPoint> {
    cactus_from_millis(results.iter().filter_map(|r| r.duration).collect())
}
