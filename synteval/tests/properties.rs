//! Property-based tests for classification and projection
//!
//! Checks the invariants that downstream tables rely on:
//! - Classifier priority
//! - Disjoint dependency partitions
//! - Dependency ratio bounds
//! - Skipped-phase normalization

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use synteval::parser::{parse_dependency, parse_dependency_synthesis};
use synteval::summary::{FieldValue, dependency_ratio, project};
use synteval::{
    BenchmarkDescriptor, DependencyMetrics, Metrics, Outcome, ResultRecord, Tool, ToolOutput,
    classify,
};

const OOM_MARKERS: [&str; 3] = [
    "Detected 1 oom-kill event(s) in StepId=42.batch",
    "slurmstepd: error: task killed by oom-kill",
    "java.lang.OutOfMemoryError: GC overhead limit exceeded",
];

fn noise() -> impl Strategy<Value = String> {
    "[a-z \n]{0,40}"
}

fn var_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e][0-9]", 0..12)
}

fn tool() -> impl Strategy<Value = Tool> {
    prop::sample::select(Tool::ALL.to_vec())
}

fn descriptor(outputs: Vec<String>) -> Arc<BenchmarkDescriptor> {
    Arc::new(BenchmarkDescriptor {
        id: "1".to_string(),
        name: "prop".to_string(),
        family: "misc".to_string(),
        ltl_formula: "G a".to_string(),
        input_vars: Vec::new(),
        output_vars: outputs,
    })
}

fn tested_json(tested: &[(String, bool)]) -> String {
    let entries: Vec<String> = tested
        .iter()
        .map(|(name, dep)| format!(r#"{{"name": "{name}", "is_dependent": {dep}}}"#))
        .collect();
    format!(
        r#"{{"total_time": 1, "dependency": {{"tested_dependencies": [{}]}}, "automaton": {{"is_built": false}}}}"#,
        entries.join(", ")
    )
}

proptest! {
    /// Memory exhaustion always wins over the external timeout
    #[test]
    fn oom_beats_timeout(
        tool in tool(),
        marker in prop::sample::select(OOM_MARKERS.to_vec()),
        before in noise(),
        after in noise(),
        timeout_first in proptest::bool::ANY,
    ) {
        let timeout = "Exited with exit code 124";
        let stderr = if timeout_first {
            format!("{before}{timeout}\n{after}{marker}")
        } else {
            format!("{before}{marker}\n{after}{timeout}")
        };
        prop_assert_eq!(classify(tool, &ToolOutput::new("", stderr)), Outcome::OutOfMemory);
    }

    /// Irrelevance is decided before anything else
    #[test]
    fn irrelevant_beats_everything(tool in tool(), marker in prop::sample::select(OOM_MARKERS.to_vec())) {
        let stderr = format!(
            "{marker}\nArgument list too long\n--ins should follow immediately after the equal sign\nExited with exit code 124"
        );
        prop_assert_eq!(classify(tool, &ToolOutput::new("", stderr)), Outcome::Irrelevant);
    }

    /// Text without any marker is a success
    #[test]
    fn plain_text_is_success(tool in tool(), stdout in noise(), stderr in noise()) {
        prop_assert_eq!(classify(tool, &ToolOutput::new(stdout, stderr)), Outcome::Success);
    }

    /// Dependent and independent sides are disjoint and come from the tested list
    #[test]
    fn partition_is_disjoint(tested in prop::collection::vec(("[a-e][0-9]", proptest::bool::ANY), 0..16)) {
        let parsed = parse_dependency(&tested_json(&tested)).unwrap();
        let dep = parsed.metrics.dependency().unwrap();

        let dependent: HashSet<&String> = dep.dependent_variables.iter().collect();
        let independent: HashSet<&String> = dep.independent_variables.iter().collect();
        prop_assert_eq!(dependent.len(), dep.dependent_variables.len());
        prop_assert_eq!(independent.len(), dep.independent_variables.len());
        prop_assert!(dependent.is_disjoint(&independent));

        let names: HashSet<&String> = tested.iter().map(|(n, _)| n).collect();
        prop_assert_eq!(dependent.len() + independent.len(), names.len());
        prop_assert!(dependent.iter().chain(&independent).all(|v| names.contains(v)));
    }

    /// Ratio stays within [0, 1], and is exactly 0 without outputs
    #[test]
    fn ratio_is_bounded(outputs in var_names(), dependent in var_names()) {
        let mut seen = HashSet::new();
        let dependent: Vec<String> = dependent.into_iter().filter(|v| seen.insert(v.clone())).collect();
        let mut seen = HashSet::new();
        let outputs: Vec<String> = outputs.into_iter().filter(|v| seen.insert(v.clone())).collect();
        let no_outputs = outputs.is_empty();

        let record = ResultRecord::success(
            descriptor(outputs),
            Tool::FindDeps,
            Some(1.0),
            Metrics::Dependency(DependencyMetrics {
                dependent_variables: dependent,
                ..Default::default()
            }),
        );
        let ratio = dependency_ratio(&record).unwrap();
        prop_assert!((0.0..=1.0).contains(&ratio));
        if no_outputs {
            prop_assert_eq!(ratio, 0.0);
        }
    }

    /// A skipped dependent phase projects as zero and totals stay additive
    #[test]
    fn skipped_phase_is_zero(independent in 0u32..100_000, skipped in proptest::bool::ANY, dependent in 0u32..100_000) {
        let dependent_duration = if skipped { -1.0 } else { f64::from(dependent) };
        let doc = format!(
            r#"{{"total_time": 1, "dependency": {{"tested_dependencies": []}}, "automaton": {{"is_built": false}}, "synthesis": {{"independent_strategy": {{"realizability": "REALIZABLE", "duration": {independent}}}, "dependent_strategy": {{"duration": {dependent_duration}}}}}}}"#
        );
        let parsed = parse_dependency_synthesis(&doc).unwrap();
        let record = ResultRecord::success(descriptor(Vec::new()), Tool::DepSynt, parsed.total_duration, parsed.metrics);
        let row = project(&record);

        let expected_dependent = if skipped { 0.0 } else { f64::from(dependent) };
        prop_assert_eq!(
            row.get("Dependent Synthesis Duration"),
            Some(&FieldValue::Float(expected_dependent))
        );
        prop_assert_eq!(
            row.get("Total Synthesis Duration"),
            Some(&FieldValue::Float(f64::from(independent) + expected_dependent))
        );
    }
}
