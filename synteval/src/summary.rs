//! Flattening of result records into tabular rows
//!
//! Each record becomes an ordered list of `(column, value)` pairs. The column
//! set depends only on the tool family, never on the outcome, so every row of
//! one dataset shares the same header. Columns that do not apply to a row
//! hold [`FieldValue::Null`], never a zero or an empty list.

use crate::outcome::ToolFamily;
use crate::record::{BddSummary, Metrics, ResultRecord, SynthesisMetrics};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Prefix of the original-NBA BDD columns
pub const ORIGIN_PREFIX: &str = "Origin ";
/// Prefix of the projected-NBA BDD columns
pub const PROJECTED_PREFIX: &str = "Projected ";

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Not applicable or not reported
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer count
    Int(i64),
    /// Measurement or ratio
    Float(f64),
    /// Free text
    Text(String),
    /// Variable list
    List(Vec<String>),
}

impl FieldValue {
    /// Whether this cell is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the cell, if it holds a number
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text view of the cell, if it holds text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Renders cells the way the downstream plotting scripts read them back
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{item}'")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// One flattened row, column order preserved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryRow {
    fields: Vec<(String, FieldValue)>,
}

impl SummaryRow {
    /// Create an empty row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Value of a column
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Column names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, v)| v)
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for SummaryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Flatten a record into one row
#[must_use]
pub fn project(record: &ResultRecord) -> SummaryRow {
    let mut row = SummaryRow::new();
    push_base(&mut row, record);

    let metrics = record.metrics.as_ref();
    match record.tool.family() {
        ToolFamily::Dependency => push_dependency(&mut row, record),
        ToolFamily::DependencySynthesis => {
            push_dependency(&mut row, record);
            let synthesis = match metrics {
                Some(Metrics::Synthesis(synt)) => Some(synt),
                _ => None,
            };
            push_synthesis(&mut row, synthesis);
        }
        ToolFamily::GeneralSynthesis => {
            row.push(
                "Realizability",
                record.realizability().map(|r| r.as_str()),
            );
        }
    }

    row
}

fn push_base(row: &mut SummaryRow, record: &ResultRecord) {
    let bench = &record.benchmark;

    row.push("Benchmark Id", bench.id.as_str());
    row.push("Benchmark Name", bench.name.as_str());
    row.push("Benchmark Family", bench.family.as_str());
    row.push("LTL Formula", bench.ltl_formula.as_str());
    row.push("Input Variables", bench.inputs_joined());
    row.push("Output Variables", bench.outputs_joined());
    row.push("Total Input Variables", bench.input_vars.len());
    row.push("Total Output Variables", bench.output_vars.len());

    row.push("Status", record.outcome.as_str());
    row.push("Error Message", record.error_message());
    row.push("Total Duration", record.total_duration);
}

/// Dependent variables that are declared outputs of the benchmark
///
/// Names a tool reports outside the declared outputs are left out, so the
/// list, its count and the ratio describe the same set.
#[must_use]
pub fn declared_dependents(record: &ResultRecord) -> Option<Vec<String>> {
    let dep = record.dependency()?;
    Some(
        dep.dependent_variables
            .iter()
            .filter(|v| record.benchmark.is_output(v))
            .cloned()
            .collect(),
    )
}

fn ratio_of(dependent: usize, outputs: usize) -> f64 {
    if outputs == 0 {
        0.0
    } else {
        dependent as f64 / outputs as f64
    }
}

/// Share of declared outputs found dependent; `0` without outputs
#[must_use]
pub fn dependency_ratio(record: &ResultRecord) -> Option<f64> {
    let dependent = declared_dependents(record)?;
    Some(ratio_of(dependent.len(), record.benchmark.output_vars.len()))
}

fn push_dependency(row: &mut SummaryRow, record: &ResultRecord) {
    let dep = record.dependency();
    let dependent = declared_dependents(record);
    let outputs = record.benchmark.output_vars.len();
    let ratio = dependent.as_ref().map(|d| ratio_of(d.len(), outputs));

    let total = dependent.as_ref().map(Vec::len);

    row.push("Dependent Variables", dependent);
    row.push("Total Dependent Variables", total);
    row.push(
        "Independent Variables",
        dep.map(|d| d.independent_variables.clone()),
    );
    row.push(
        "Total Independent Variables",
        dep.map(|d| d.independent_variables.len()),
    );
    row.push("Dependency Ratio", ratio);

    let aut = dep.map(|d| &d.automaton);
    row.push("Is Automaton Built", aut.map(|a| a.is_built));
    row.push("Automaton Build Duration", aut.and_then(|a| a.build_duration));
    row.push("Automaton Total States", aut.and_then(|a| a.total_states));
    row.push("Automaton Total Edges", aut.and_then(|a| a.total_edges));
    row.push(
        "Automaton State Based Status",
        aut.and_then(|a| a.state_based_status.clone()),
    );

    row.push("Total Pair States", dep.and_then(|d| d.total_pair_states));
    row.push(
        "Find Pair States Duration",
        dep.and_then(|d| d.search_pair_states_duration),
    );
    row.push(
        "Find Dependency Duration",
        dep.and_then(|d| d.find_dependency_duration),
    );
}

fn push_synthesis(row: &mut SummaryRow, synt: Option<&SynthesisMetrics>) {
    row.push("Realizability", synt.map(|s| s.realizability.as_str()));
    row.push(
        "Independent Synthesis Duration",
        synt.map(|s| s.independent_synthesis_duration),
    );
    row.push(
        "Dependent Synthesis Duration",
        synt.map(|s| s.dependent_synthesis_duration),
    );
    row.push(
        "Total Synthesis Duration",
        synt.map(SynthesisMetrics::total_synthesis_duration),
    );
    row.push("Merge Duration", synt.and_then(|s| s.merge_duration));
    row.push(
        "Model Checking Status",
        synt.and_then(|s| s.model_checking_status.clone()),
    );
    row.push(
        "Model Checking Duration",
        synt.and_then(|s| s.model_checking_duration),
    );

    push_bdd(row, ORIGIN_PREFIX, synt.and_then(|s| s.origin_bdd.as_ref()));
    push_bdd(row, PROJECTED_PREFIX, synt.and_then(|s| s.projected_bdd.as_ref()));
}

fn push_bdd(row: &mut SummaryRow, prefix: &str, bdd: Option<&BddSummary>) {
    row.push(format!("{prefix}Average BDD Size"), bdd.map(|b| b.avg_size));
    row.push(format!("{prefix}Max BDD Size"), bdd.map(|b| b.max_size));
    row.push(format!("{prefix}Min BDD Size"), bdd.map(|b| b.min_size));
    row.push(format!("{prefix}Total BDDs"), bdd.map(|b| b.instance_count));
    row.push(
        format!("{prefix}Total BDD Size Deduplicated"),
        bdd.map(|b| b.total_size_deduplicated),
    );
    row.push(
        format!("{prefix}Total BDD Size With Duplicates"),
        bdd.map(|b| b.total_size_with_duplicates),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::BenchmarkDescriptor;
    use crate::outcome::{Outcome, Tool};
    use crate::record::{DependencyMetrics, GeneralSynthesisMetrics, Realizability};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn descriptor(outputs: &[&str]) -> Arc<BenchmarkDescriptor> {
        Arc::new(BenchmarkDescriptor {
            id: "3".to_string(),
            name: "mux3".to_string(),
            family: "arbiter".to_string(),
            ltl_formula: "G(a -> F b)".to_string(),
            input_vars: vec!["a".to_string()],
            output_vars: outputs.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn dependency_record(outputs: &[&str], dependent: &[&str]) -> ResultRecord {
        let metrics = Metrics::Dependency(DependencyMetrics {
            dependent_variables: dependent.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        ResultRecord::success(descriptor(outputs), Tool::FindDeps, Some(5.0), metrics)
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Bool(false).to_string(), "False");
        assert_eq!(FieldValue::Float(1.0).to_string(), "1.0");
        assert_eq!(FieldValue::Float(0.25).to_string(), "0.25");
        assert_eq!(FieldValue::Int(7).to_string(), "7");
        assert_eq!(
            FieldValue::List(vec!["a".to_string(), "b".to_string()]).to_string(),
            "['a', 'b']"
        );
        assert_eq!(FieldValue::List(Vec::new()).to_string(), "[]");
    }

    #[test]
    fn test_ratio_zero_outputs() {
        let record = dependency_record(&[], &[]);
        assert_eq!(dependency_ratio(&record), Some(0.0));
        let row = project(&record);
        assert_eq!(row.get("Total Output Variables"), Some(&FieldValue::Int(0)));
        assert_eq!(row.get("Dependency Ratio"), Some(&FieldValue::Float(0.0)));
    }

    #[test]
    fn test_ratio_counts_declared_outputs_only() {
        let record = dependency_record(&["b", "c"], &["b", "zz"]);
        assert_eq!(dependency_ratio(&record), Some(0.5));

        let row = project(&record);
        assert_eq!(
            row.get("Dependent Variables"),
            Some(&FieldValue::List(vec!["b".to_string()]))
        );
        assert_eq!(row.get("Total Dependent Variables"), Some(&FieldValue::Int(1)));
        assert_eq!(row.get("Total Output Variables"), Some(&FieldValue::Int(2)));
        assert_eq!(row.get("Dependency Ratio"), Some(&FieldValue::Float(0.5)));
    }

    #[test]
    fn test_failed_run_has_null_success_fields() {
        let record = ResultRecord::terminal(descriptor(&["b"]), Tool::DepSynt, Outcome::Timeout);
        let row = project(&record);
        assert_eq!(row.get("Status"), Some(&FieldValue::Text("Timeout".to_string())));
        for key in [
            "Total Duration",
            "Error Message",
            "Dependent Variables",
            "Total Dependent Variables",
            "Dependency Ratio",
            "Is Automaton Built",
            "Realizability",
            "Dependent Synthesis Duration",
            "Origin Average BDD Size",
        ] {
            assert!(row.get(key).is_some_and(FieldValue::is_null), "{key} not null");
        }
    }

    #[test]
    fn test_column_set_independent_of_outcome() {
        let ok = ResultRecord::success(
            descriptor(&["b"]),
            Tool::DepSynt,
            Some(1.0),
            Metrics::Synthesis(SynthesisMetrics::default()),
        );
        let failed =
            ResultRecord::terminal(descriptor(&["b"]), Tool::DepSynt, Outcome::OutOfMemory);
        let a: Vec<_> = project(&ok).keys().map(str::to_string).collect();
        let b: Vec<_> = project(&failed).keys().map(str::to_string).collect();
        assert_eq!(a, b);
        let unique: HashSet<_> = a.iter().collect();
        assert_eq!(unique.len(), a.len());
    }

    #[test]
    fn test_bdd_prefixing() {
        let synt = SynthesisMetrics {
            origin_bdd: Some(BddSummary {
                avg_size: 4.5,
                ..Default::default()
            }),
            projected_bdd: Some(BddSummary {
                avg_size: 2.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = ResultRecord::success(
            descriptor(&["b"]),
            Tool::DepSynt,
            Some(1.0),
            Metrics::Synthesis(synt),
        );
        let row = project(&record);
        assert_eq!(
            row.get("Origin Average BDD Size"),
            Some(&FieldValue::Float(4.5))
        );
        assert_eq!(
            row.get("Projected Average BDD Size"),
            Some(&FieldValue::Float(2.0))
        );
    }

    #[test]
    fn test_general_synthesis_row() {
        let record = ResultRecord::success(
            descriptor(&["b"]),
            Tool::Strix,
            Some(123_500.0),
            Metrics::General(GeneralSynthesisMetrics {
                realizability: Realizability::Unrealizable,
            }),
        );
        let row = project(&record);
        assert_eq!(row.get("Realizability").and_then(FieldValue::as_text), Some("UNREALIZABLE"));
        assert_eq!(row.get("Total Duration").and_then(FieldValue::as_f64), Some(123_500.0));
        assert!(row.get("Dependency Ratio").is_none());
    }

    #[test]
    fn test_row_serializes_in_order() {
        let record = dependency_record(&["b"], &["b"]);
        let json = serde_json::to_string(&project(&record)).unwrap();
        assert!(json.starts_with("{\"Benchmark Id\":\"3\""));
        assert!(json.contains("\"Dependent Variables\":[\"b\"]"));
        assert!(json.contains("\"Automaton Total States\":null"));
    }
}
