//! Integration tests for the synteval CLI

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{TempDir, tempdir};

/// Get the path to the synteval binary
fn synteval_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_synteval"))
}

fn run(args: &[&str]) -> Output {
    Command::new(synteval_bin())
        .args(args)
        .env("HOME", env!("CARGO_TARGET_TMPDIR"))
        .env_remove("XDG_CONFIG_HOME")
        .output()
        .expect("Failed to execute synteval")
}

/// Create a corpus of two benchmarks with find-deps style results
fn create_corpus() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");
    let bench = dir.path().join("benchmarks");
    let results = dir.path().join("results");
    fs::create_dir(&bench).unwrap();
    fs::create_dir(&results).unwrap();

    fs::write(bench.join("3.txt"), "3\nmux3\narbiter\nG(a -> F b)\na\nb\n").unwrap();
    fs::write(bench.join("4.txt"), "4\nlift\nlift\nG(r -> F g)\nr\ng,h\n").unwrap();

    fs::write(
        results.join("3.out"),
        r#"{"total_time": 532, "dependency": {"tested_dependencies": [{"name":"b","is_dependent": true}]}, "automaton": {"is_built": false}}"#,
    )
    .unwrap();
    fs::write(results.join("3.err"), "").unwrap();
    fs::write(results.join("4.out"), "").unwrap();
    fs::write(results.join("4.err"), "Exited with exit code 124\n").unwrap();

    dir
}

fn path_str(p: &Path) -> &str {
    p.to_str().expect("non-UTF-8 temp path")
}

#[test]
fn test_cli_version() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("synteval"));
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("summarize"));
    assert!(stdout.contains("compare"));
}

#[test]
fn test_summarize_to_stdout() {
    let dir = create_corpus();
    let output = run(&[
        "summarize",
        "--tool",
        "find-deps",
        "--results-path",
        path_str(&dir.path().join("results")),
        "--benchmarks-path",
        path_str(&dir.path().join("benchmarks")),
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Benchmark Id,Benchmark Name"));
    assert!(lines[1].starts_with("3,mux3,"));
    assert!(lines[1].contains(",Success,"));
    assert!(lines[2].starts_with("4,lift,"));
    assert!(lines[2].contains(",Timeout,"));
}

#[test]
fn test_summarize_json_file() {
    let dir = create_corpus();
    let out = dir.path().join("summary.json");
    let output = run(&[
        "summarize",
        "-t",
        "find-deps",
        "-r",
        path_str(&dir.path().join("results")),
        "-b",
        path_str(&dir.path().join("benchmarks")),
        "-f",
        "json",
        "-o",
        path_str(&out),
    ]);

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["tool"], "find-deps");
    assert_eq!(value["summary"]["total"], 2);
    assert_eq!(value["rows"][1]["Dependency Ratio"], serde_json::Value::Null);
}

#[test]
fn test_missing_artifact_fails() {
    let dir = create_corpus();
    fs::remove_file(dir.path().join("results").join("4.err")).unwrap();

    let output = run(&[
        "summarize",
        "--tool",
        "find-deps",
        "--results-path",
        path_str(&dir.path().join("results")),
        "--benchmarks-path",
        path_str(&dir.path().join("benchmarks")),
    ]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing artifact for benchmark '4'"));
}

#[test]
fn test_missing_benchmarks_path() {
    let dir = create_corpus();
    let output = run(&[
        "summarize",
        "--tool",
        "strix",
        "--results-path",
        path_str(&dir.path().join("results")),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No benchmarks path"));
}

#[test]
fn test_config_file_supplies_defaults() {
    let dir = create_corpus();
    let config = dir.path().join("synteval.yaml");
    fs::write(
        &config,
        format!(
            "format: text\nbenchmarks_path: {}\n",
            path_str(&dir.path().join("benchmarks"))
        ),
    )
    .unwrap();

    let output = run(&[
        "--config",
        path_str(&config),
        "summarize",
        "--tool",
        "find-deps",
        "--results-path",
        path_str(&dir.path().join("results")),
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== find-deps Results ==="));
    assert!(stdout.contains("Timeout:          1"));
}

#[test]
fn test_compare_with_cactus() {
    let dir = create_corpus();
    let strix = dir.path().join("strix");
    fs::create_dir(&strix).unwrap();
    fs::write(strix.join("3.out"), "REALIZABLE\n").unwrap();
    fs::write(strix.join("3.err"), "real\t0m2.00s\n").unwrap();
    fs::write(strix.join("4.out"), "UNREALIZABLE\n").unwrap();
    fs::write(strix.join("4.err"), "real\t0m0.50s\n").unwrap();

    let cactus = dir.path().join("cactus.json");
    let output = run(&[
        "compare",
        "--run",
        &format!("find-deps={}", path_str(&dir.path().join("results"))),
        "--run",
        &format!("strix={}", path_str(&strix)),
        "--benchmarks-path",
        path_str(&dir.path().join("benchmarks")),
        "--cactus",
        path_str(&cactus),
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines[0],
        "Benchmark Id,Benchmark Name,find-deps_status,find-deps_duration,strix_status,strix_duration"
    );
    assert_eq!(lines[1], "3,mux3,Success,532.0,Success,2000.0");
    assert_eq!(lines[2], "4,lift,Timeout,,Success,500.0");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&cactus).unwrap()).unwrap();
    assert_eq!(value["tools"]["strix"][0]["time"], 0.5);
    assert_eq!(value["virtual_best"][1]["solved"], 2);
}

#[test]
fn test_compare_rejects_bad_run() {
    let output = run(&["compare", "--run", "z3=/tmp", "--benchmarks-path", "/tmp"]);
    assert!(!output.status.success());
}

#[test]
fn test_compare_rejects_repeated_tool() {
    let dir = create_corpus();
    let results_path = dir.path().join("results");
    let results = path_str(&results_path);
    let output = run(&[
        "compare",
        "--run",
        &format!("strix={results}"),
        "--run",
        &format!("strix={results}"),
        "--benchmarks-path",
        path_str(&dir.path().join("benchmarks")),
    ]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Tool 'strix' appears in more than one dataset"));
}
