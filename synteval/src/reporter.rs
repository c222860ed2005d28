//! Summary table reporting
//!
//! Writes a [`Dataset`] as CSV (the format the plotting scripts consume),
//! as a JSON document carrying the run summary, or as a plain text overview.

use crate::aggregator::{Dataset, RunSummary};
use crate::outcome::Tool;
use crate::summary::{FieldValue, SummaryRow};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Error type for reporter operations
#[derive(Error, Debug)]
pub enum ReporterError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Nothing to write
    #[error("Dataset has no rows")]
    EmptyDataset,
}

/// Result type for reporter operations
pub type ReporterResult<T> = Result<T, ReporterError>;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated table
    #[default]
    Csv,
    /// JSON document
    Json,
    /// Plain text summary
    Text,
}

/// Configuration for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Output format
    pub format: ReportFormat,
    /// Include per-benchmark lines in text reports
    pub include_details: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Csv,
            include_details: true,
        }
    }
}

impl ReporterConfig {
    /// Create a new config with the given format
    #[must_use]
    pub fn new(format: ReportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Set whether to include per-benchmark lines
    #[must_use]
    pub fn with_details(mut self, include: bool) -> Self {
        self.include_details = include;
        self
    }
}

/// JSON report document
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Tool that produced the results
    pub tool: Tool,
    /// Outcome counts
    pub summary: RunSummary,
    /// One row per benchmark
    pub rows: &'a [SummaryRow],
}

/// Report generator
pub struct Reporter {
    config: ReporterConfig,
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    /// Create a CSV reporter
    #[must_use]
    pub fn csv() -> Self {
        Self::new(ReporterConfig::new(ReportFormat::Csv))
    }

    /// Create a JSON reporter
    #[must_use]
    pub fn json() -> Self {
        Self::new(ReporterConfig::new(ReportFormat::Json))
    }

    /// Create a text reporter
    #[must_use]
    pub fn text() -> Self {
        Self::new(ReporterConfig::new(ReportFormat::Text))
    }

    /// Write report to a writer
    pub fn write_report<W: Write>(&self, dataset: &Dataset, writer: &mut W) -> ReporterResult<()> {
        match self.config.format {
            ReportFormat::Csv => write_csv(&dataset.rows(), writer),
            ReportFormat::Json => self.write_json(dataset, writer),
            ReportFormat::Text => self.write_text(dataset, writer),
        }
    }

    /// Write report to a file
    ///
    /// The dataset is checked before the file is created, so an empty
    /// dataset never leaves a truncated file behind.
    pub fn write_to_file(&self, dataset: &Dataset, path: impl AsRef<Path>) -> ReporterResult<()> {
        if dataset.is_empty() && self.config.format != ReportFormat::Text {
            return Err(ReporterError::EmptyDataset);
        }
        let mut file = io::BufWriter::new(std::fs::File::create(path)?);
        self.write_report(dataset, &mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Write report to a string
    pub fn to_string(&self, dataset: &Dataset) -> ReporterResult<String> {
        let mut buf = Vec::new();
        self.write_report(dataset, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    fn write_json<W: Write>(&self, dataset: &Dataset, writer: &mut W) -> ReporterResult<()> {
        if dataset.is_empty() {
            return Err(ReporterError::EmptyDataset);
        }
        let rows = dataset.rows();
        let report = Report {
            tool: dataset.tool,
            summary: dataset.summary(),
            rows: &rows,
        };
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_text<W: Write>(&self, dataset: &Dataset, writer: &mut W) -> ReporterResult<()> {
        let summary = dataset.summary();

        writeln!(writer, "=== {} Results ===", dataset.tool)?;
        writeln!(writer, "Total benchmarks: {}", summary.total)?;
        writeln!(
            writer,
            "Success:          {} ({:.1}%)",
            summary.success,
            summary.success_rate()
        )?;
        if summary.realizable + summary.unrealizable > 0 {
            writeln!(writer, "  Realizable:     {}", summary.realizable)?;
            writeln!(writer, "  Unrealizable:   {}", summary.unrealizable)?;
        }
        writeln!(writer, "Timeout:          {}", summary.timeout)?;
        writeln!(writer, "Out-Of-Memory:    {}", summary.out_of_memory)?;
        writeln!(writer, "Error:            {}", summary.error)?;
        writeln!(writer, "Irrelevant:       {}", summary.irrelevant)?;
        if summary.failed_rows > 0 {
            writeln!(writer, "Skipped rows:     {}", summary.failed_rows)?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "Total time:       {:.3}s",
            summary.total_success_duration / 1000.0
        )?;
        if let Some(avg) = summary.avg_success_duration {
            writeln!(writer, "Average time:     {:.3}s", avg / 1000.0)?;
        }

        if self.config.include_details && !dataset.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "=== Individual Results ===")?;
            for record in &dataset.records {
                let time = record
                    .total_duration
                    .map(|ms| format!("{:.3}s", ms / 1000.0))
                    .unwrap_or_else(|| "-".to_string());
                let detail = record
                    .error_message()
                    .map(|m| format!(" [{m}]"))
                    .or_else(|| record.realizability().map(|r| format!(" [{r}]")))
                    .unwrap_or_default();

                writeln!(
                    writer,
                    "{:8} {:40} {:14} {}{}",
                    record.benchmark.id,
                    record.benchmark.name,
                    record.outcome.as_str(),
                    time,
                    detail
                )?;
            }
        }

        if !dataset.failures.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "=== Skipped ===")?;
            for failure in &dataset.failures {
                writeln!(writer, "{:8} {}", failure.id, failure.error)?;
            }
        }

        Ok(())
    }
}

/// Write rows as CSV, header taken from the first row
pub fn write_csv<W: Write>(rows: &[SummaryRow], writer: &mut W) -> ReporterResult<()> {
    let first = rows.first().ok_or(ReporterError::EmptyDataset)?;

    let header: Vec<String> = first.keys().map(csv_escape).collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in rows {
        let cells: Vec<String> = row.values().map(csv_cell).collect();
        writeln!(writer, "{}", cells.join(","))?;
    }

    Ok(())
}

fn csv_cell(value: &FieldValue) -> String {
    csv_escape(&value.to_string())
}

/// Escape a string for CSV output
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
