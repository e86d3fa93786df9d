//! # Output Module
//!
//! This module centralizes all user-facing output for headercheck.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! Check-mode findings use the `<path>:1: <message>` form understood by
//! editors and CI annotators, and are printed even in quiet mode. Everything
//! else respects `-q`, with more detail under `-v`.

use owo_colors::{OwoColorize, Stream};

use crate::engine::{Action, Mode};
use crate::logging::{is_quiet, is_verbose};
use crate::report::{FileReport, ProcessingSummary};

/// Symbols used in output
pub mod symbols {
  /// Success/conforming header
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Needs attention/failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Header replaced
  pub const UPDATED: &str = "\u{21bb}"; // ↻
  /// Warning
  pub const WARNING: &str = "!";
}

/// Message attached to every check-mode finding.
pub const FINDING_MESSAGE: &str = "missing or incorrect header";

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Print the initial "Checking N files..." or "Fixing N files..." message.
pub fn print_start_message(file_count: usize, mode: Mode) {
  if is_quiet() {
    return;
  }

  let verb = match mode {
    Mode::Check => "Checking",
    Mode::Fix => "Fixing",
  };
  println!("{} {} {}...", verb, file_count, plural(file_count));
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Formats a check-mode finding, e.g. `src/main.go:1: missing or incorrect header (insert)`.
pub fn finding_line(file: &FileReport) -> String {
  format!("{}:1: {} ({})", file.path, FINDING_MESSAGE, file.action)
}

/// Print one finding line per file needing attention, sorted by path.
pub fn print_findings(files: &[&FileReport]) {
  let mut sorted_files = files.to_vec();
  sorted_files.sort_by(|a, b| a.path.cmp(&b.path));

  for file in sorted_files {
    println!("{}", finding_line(file));
  }
}

/// Print the files that were rewritten in fix mode.
pub fn print_fixed_files(files: &[&FileReport], action: Action) {
  if is_quiet() || files.is_empty() {
    return;
  }

  let count = files.len();
  let header = match action {
    Action::Replace => format!(
      "{} Replaced header in {} {}:",
      symbols::UPDATED.if_supports_color(Stream::Stdout, |s| s.yellow()),
      count,
      plural(count)
    ),
    _ => format!(
      "{} Inserted header in {} {}:",
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
      count,
      plural(count)
    ),
  };
  println!("{}", header);
  print_file_list(files);
}

/// Print per-file errors to stderr. Errors are never silenced.
pub fn print_errors(files: &[&FileReport]) {
  for file in files {
    if let Some(ref error) = file.error {
      eprintln!(
        "{} {}: {}",
        symbols::FAILURE.if_supports_color(Stream::Stderr, |s| s.red()),
        file.path,
        error
      );
    }
  }
}

/// Print per-file warnings to stderr.
pub fn print_warnings(files: &[&FileReport]) {
  if is_quiet() {
    return;
  }

  for file in files {
    if let Some(ref warning) = file.warning {
      eprintln!(
        "{} {}: {}",
        symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
        file.path,
        warning
      );
    }
  }
}

/// Print the success message when every file conforms.
pub fn print_all_files_ok() {
  if is_quiet() {
    return;
  }

  println!(
    "{} All files have correct headers.",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())
  );
}

/// Print the processing summary.
///
/// Format: "Summary: X OK, Y insert, Z replace, N errors"
/// In verbose mode, also shows timing.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }

  let attention = |count: usize| {
    if count > 0 {
      count.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
    } else {
      count.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string()
    }
  };

  let mut summary_line = format!(
    "Summary: {} OK, {} insert, {} replace, {} {}",
    summary.files_unchanged.if_supports_color(Stream::Stdout, |s| s.cyan()),
    attention(summary.headers_inserted),
    attention(summary.headers_replaced),
    attention(summary.files_with_errors),
    if summary.files_with_errors == 1 { "error" } else { "errors" }
  );

  if summary.files_with_warnings > 0 {
    summary_line.push_str(&format!(
      ", {} {}",
      summary.files_with_warnings,
      if summary.files_with_warnings == 1 {
        "warning"
      } else {
        "warnings"
      }
    ));
  }

  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", summary.processing_time.as_secs_f64()));
  }

  println!("{}", summary_line);
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

/// File reports grouped for output.
pub struct CategorizedReports<'a> {
  /// Files where a header was (or would be) inserted
  pub inserted: Vec<&'a FileReport>,
  /// Files where a header was (or would be) replaced
  pub replaced: Vec<&'a FileReport>,
  /// Files that failed to process
  pub errors: Vec<&'a FileReport>,
  /// Files with a warning attached
  pub warnings: Vec<&'a FileReport>,
}

impl<'a> CategorizedReports<'a> {
  /// Categorize a slice of file reports.
  pub fn from_reports(reports: &'a [FileReport]) -> Self {
    let mut inserted = Vec::new();
    let mut replaced = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for report in reports {
      if report.error.is_some() {
        errors.push(report);
      }
      if report.warning.is_some() {
        warnings.push(report);
      }
      match report.action {
        Action::Insert => inserted.push(report),
        Action::Replace => replaced.push(report),
        Action::None | Action::Remove => {}
      }
    }

    Self {
      inserted,
      replaced,
      errors,
      warnings,
    }
  }

  /// Files needing attention, in input order.
  pub fn needing_attention(&self) -> Vec<&'a FileReport> {
    self.inserted.iter().chain(self.replaced.iter()).copied().collect()
  }
}

fn print_file_list(files: &[&FileReport]) {
  let count = files.len();
  let limit = if is_verbose() { count } else { DEFAULT_FILE_LIST_LIMIT };

  for file in files.iter().take(limit) {
    println!("  {}", file.path);
  }

  if count > limit {
    println!(
      "  {} more (use -v to see all)",
      format!("... and {}", count - limit).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}

const fn plural(count: usize) -> &'static str {
  if count == 1 { "file" } else { "files" }
}
