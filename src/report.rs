//! # Report Module
//!
//! This module provides functionality for writing reports of a headercheck
//! run in JSON or CSV format.
//!
//! Every visited file appears once, with the action taken (or needed in check
//! mode) and any warning or error attached to it, followed by a summary of the
//! run.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::engine::{Action, FileResult, Mode};

/// A file result prepared for reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileReport {
  /// Path relative to the root, with forward slashes
  pub path: String,
  /// Action taken or needed
  pub action: Action,
  /// Non-fatal warning
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warning: Option<String>,
  /// Error message, including its causes
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl FileReport {
  /// Builds a report entry; `relative_path` is the path shown to users.
  pub fn from_result(result: &FileResult, relative_path: String) -> Self {
    Self {
      path: relative_path,
      action: result.action,
      warning: result.warning.clone(),
      error: result.error.as_ref().map(|e| format!("{e:#}")),
    }
  }
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  /// JSON format for machine readability
  Json,
  /// CSV format for spreadsheet compatibility
  Csv,
}

impl std::fmt::Display for ReportFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReportFormat::Json => write!(f, "JSON"),
      ReportFormat::Csv => write!(f, "CSV"),
    }
  }
}

/// Error returned when parsing a string into a ReportFormat fails
#[derive(Debug, thiserror::Error)]
#[error("Invalid report format: {0}")]
pub struct ParseReportFormatError(pub String);

impl std::str::FromStr for ReportFormat {
  type Err = ParseReportFormatError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "json" => Ok(ReportFormat::Json),
      "csv" => Ok(ReportFormat::Csv),
      _ => Err(ParseReportFormatError(s.to_string())),
    }
  }
}

/// Summary of the processing results
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
  /// Mode the run was made in
  pub mode: Mode,
  /// Total number of files visited
  pub total_files: usize,
  /// Files that needed no change
  pub files_unchanged: usize,
  /// Files where a header was (or would be) inserted
  pub headers_inserted: usize,
  /// Files where a header was (or would be) replaced
  pub headers_replaced: usize,
  /// Files that could not be processed
  pub files_with_errors: usize,
  /// Files with a warning attached
  pub files_with_warnings: usize,
  /// Total processing time
  #[serde(skip_serializing)]
  pub processing_time: Duration,
  /// Processing time in seconds for serialization
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
  /// Unix timestamp when the summary was created
  pub timestamp: i64,
}

impl ProcessingSummary {
  /// Create a new ProcessingSummary initialized to zero
  pub fn new(mode: Mode, processing_time: Duration) -> Self {
    Self {
      mode,
      total_files: 0,
      files_unchanged: 0,
      headers_inserted: 0,
      headers_replaced: 0,
      files_with_errors: 0,
      files_with_warnings: 0,
      processing_time,
      processing_time_secs: processing_time.as_secs_f64(),
      timestamp: Local::now().timestamp(),
    }
  }

  /// Create a ProcessingSummary from the results of a run
  pub fn from_results(results: &[FileResult], mode: Mode, processing_time: Duration) -> Self {
    let mut summary = Self::new(mode, processing_time);
    summary.total_files = results.len();

    for result in results {
      if result.is_error() {
        summary.files_with_errors += 1;
      }
      if result.warning.is_some() {
        summary.files_with_warnings += 1;
      }
      match result.action {
        Action::Insert => summary.headers_inserted += 1,
        Action::Replace => summary.headers_replaced += 1,
        Action::None if !result.is_error() => summary.files_unchanged += 1,
        _ => {}
      }
    }

    summary
  }

  /// Returns the number of files that need (or received) a header change.
  pub const fn files_needing_attention(&self) -> usize {
    self.headers_inserted + self.headers_replaced
  }
}

/// Report Generator for writing run reports
pub struct ReportGenerator<'a> {
  /// Format of the report to generate
  format: ReportFormat,
  /// Path where the report will be saved
  output_path: &'a Path,
}

impl<'a> ReportGenerator<'a> {
  /// Create a new report generator
  ///
  /// # Parameters
  ///
  /// * `format` - The format to use for the report
  /// * `output_path` - The path where the report will be saved
  pub const fn new(format: ReportFormat, output_path: &'a Path) -> Self {
    Self { format, output_path }
  }

  /// Renders the report and writes it to the output path.
  pub fn generate(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<()> {
    let content = self.render(files, summary)?;

    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write {} report to {}", self.format, self.output_path.display()))
  }

  /// Renders the report content without writing it.
  pub fn render(&self, files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
    match self.format {
      ReportFormat::Json => generate_json(files, summary),
      ReportFormat::Csv => Ok(generate_csv(files, summary)),
    }
  }
}

fn generate_json(files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
  let report = serde_json::json!({
      "summary": summary,
      "files": files,
  });

  serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")
}

fn generate_csv(files: &[FileReport], summary: &ProcessingSummary) -> String {
  let mut csv = String::new();

  csv.push_str("file_path,action,warning,error\n");

  for file in files {
    csv.push_str(&format!(
      "{},{},{},{}\n",
      escape_csv(&file.path),
      file.action,
      escape_csv(file.warning.as_deref().unwrap_or_default()),
      escape_csv(file.error.as_deref().unwrap_or_default()),
    ));
  }

  csv.push_str("\n# Summary\n");
  csv.push_str(&format!("Mode,{}\n", mode_name(summary.mode)));
  csv.push_str(&format!("Total files processed,{}\n", summary.total_files));
  csv.push_str(&format!("Files unchanged,{}\n", summary.files_unchanged));
  csv.push_str(&format!("Headers inserted,{}\n", summary.headers_inserted));
  csv.push_str(&format!("Headers replaced,{}\n", summary.headers_replaced));
  csv.push_str(&format!("Files with errors,{}\n", summary.files_with_errors));
  csv.push_str(&format!("Files with warnings,{}\n", summary.files_with_warnings));
  csv.push_str(&format!(
    "Processing time (seconds),{:.2}\n",
    summary.processing_time.as_secs_f64()
  ));
  csv.push_str(&format!("Generated on,{}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));

  csv
}

/// Commas and line breaks would break the column layout.
fn escape_csv(value: &str) -> String {
  value.replace(',', "%2C").replace('\n', " ").replace('\r', "")
}

const fn mode_name(mode: Mode) -> &'static str {
  match mode {
    Mode::Check => "check",
    Mode::Fix => "fix",
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use anyhow::anyhow;
  use tempfile::TempDir;

  use super::*;

  fn sample_results() -> Vec<FileResult> {
    let mut inserted = FileResult::none(PathBuf::from("/repo/main.go"));
    inserted.action = Action::Insert;

    let mut replaced = FileResult::none(PathBuf::from("/repo/lib,util.go"));
    replaced.action = Action::Replace;

    let mut binary = FileResult::none(PathBuf::from("/repo/logo.png"));
    binary.warning = Some("skipping non-UTF-8 file".to_string());

    vec![
      inserted,
      replaced,
      binary,
      FileResult::none(PathBuf::from("/repo/ok.go")),
      FileResult::failed(PathBuf::from("/repo/missing.go"), anyhow!("No such file")),
    ]
  }

  fn sample_reports(results: &[FileResult]) -> Vec<FileReport> {
    results
      .iter()
      .map(|r| {
        let rel = r.path.strip_prefix("/repo").expect("under root").to_string_lossy().to_string();
        FileReport::from_result(r, rel)
      })
      .collect()
  }

  #[test]
  fn test_summary_counts() {
    let results = sample_results();
    let summary = ProcessingSummary::from_results(&results, Mode::Check, Duration::from_millis(1500));

    assert_eq!(summary.total_files, 5);
    assert_eq!(summary.headers_inserted, 1);
    assert_eq!(summary.headers_replaced, 1);
    assert_eq!(summary.files_unchanged, 2);
    assert_eq!(summary.files_with_errors, 1);
    assert_eq!(summary.files_with_warnings, 1);
    assert_eq!(summary.files_needing_attention(), 2);
    assert!((summary.processing_time_secs - 1.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_json_report() {
    let results = sample_results();
    let reports = sample_reports(&results);
    let summary = ProcessingSummary::from_results(&results, Mode::Fix, Duration::from_secs(1));

    let content = ReportGenerator::new(ReportFormat::Json, Path::new("unused.json"))
      .render(&reports, &summary)
      .expect("render json");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid json");

    assert_eq!(parsed["summary"]["mode"], "fix");
    assert_eq!(parsed["summary"]["headers_inserted"], 1);
    assert_eq!(parsed["files"][0]["path"], "main.go");
    assert_eq!(parsed["files"][0]["action"], "insert");
    assert!(parsed["files"][0].get("error").is_none());
    assert_eq!(parsed["files"][2]["warning"], "skipping non-UTF-8 file");
    assert_eq!(parsed["files"][4]["error"], "No such file");
  }

  #[test]
  fn test_csv_report() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let output = temp_dir.path().join("report.csv");
    let results = sample_results();
    let reports = sample_reports(&results);
    let summary = ProcessingSummary::from_results(&results, Mode::Check, Duration::from_secs(2));

    ReportGenerator::new(ReportFormat::Csv, &output)
      .generate(&reports, &summary)
      .expect("write csv");
    let content = fs::read_to_string(&output).expect("read csv");

    assert!(content.starts_with("file_path,action,warning,error\n"));
    assert!(content.contains("main.go,insert,,\n"));
    assert!(content.contains("lib%2Cutil.go,replace,,\n"));
    assert!(content.contains("missing.go,none,,No such file\n"));
    assert!(content.contains("# Summary\nMode,check\nTotal files processed,5\n"));
    assert!(content.contains("Processing time (seconds),2.00\n"));
    assert!(content.contains("Generated on,"));
  }

  #[test]
  fn test_report_format_from_str() {
    assert_eq!("JSON".parse::<ReportFormat>().expect("json"), ReportFormat::Json);
    assert_eq!("csv".parse::<ReportFormat>().expect("csv"), ReportFormat::Csv);
    assert!("html".parse::<ReportFormat>().is_err());
  }
}
