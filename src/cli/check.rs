//! # Check Command
//!
//! This module implements the check/fix run: it resolves templates, picks the
//! git metadata provider, processes the requested paths and reports results.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::{debug, warn};

use crate::config::{CliTemplates, resolve_template_defs};
use crate::diff::DiffManager;
use crate::engine::{Action, Engine, EngineError, EngineOptions, FileCollector, Mode, absolutize_path};
use crate::git::{GitOptions, disable_owner_validation, metadata_provider};
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{
  CategorizedReports, print_all_files_ok, print_blank_line, print_errors, print_findings, print_fixed_files, print_hint,
  print_start_message, print_summary, print_warnings,
};
use crate::report::{FileReport, ProcessingSummary, ReportFormat, ReportGenerator};
use crate::templates::TemplateSet;

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
  /// Files, directories or glob patterns to process (default: the root).
  /// Directories are processed recursively.
  #[arg(required = false, value_name = "PATHS")]
  pub paths: Vec<PathBuf>,

  /// Insert or replace headers in place (default: check only)
  #[arg(long)]
  pub fix: bool,

  /// Config file to load (repeatable; default: discovered in the root)
  #[arg(long, value_name = "FILE")]
  pub config: Vec<PathBuf>,

  /// Ignore config files even if present
  #[arg(long, conflicts_with = "config")]
  pub no_config: bool,

  /// Header template to use (repeatable, comma separated)
  #[arg(long, value_name = "FILE", value_delimiter = ',')]
  pub template: Vec<String>,

  /// Only apply --template entries to paths matching this regex
  #[arg(long, value_name = "REGEX")]
  pub include: Option<String>,

  /// Skip paths matching this regex for --template entries
  #[arg(long, value_name = "REGEX")]
  pub exclude: Option<String>,

  /// Root directory that templates, configs and patterns are relative to
  /// (default: current directory)
  #[arg(long, value_name = "DIR")]
  pub root: Option<PathBuf>,

  /// Report files skipped as non-UTF-8 with a warning
  #[arg(long)]
  pub force: bool,

  /// Refresh stale dates and authors even in files without local changes
  #[arg(long)]
  pub update_untouched: bool,

  /// Treat files changed since this git revision as touched
  #[arg(long, value_name = "REV")]
  pub reference: Option<String>,

  /// Do not read git history (author and dates are left empty)
  #[arg(long, conflicts_with = "reference")]
  pub no_git: bool,

  /// Skip git repository ownership check. Useful when running in Docker or
  /// other containerized environments where the repository may be owned by a
  /// different user.
  #[arg(long)]
  pub skip_git_owner_check: bool,

  /// Show diff of changes in check mode
  #[arg(long)]
  pub show_diff: bool,

  /// Save diff of changes to a file in check mode
  #[arg(long, value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// Generate a JSON report of every visited file and save to the specified
  /// path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Generate a CSV report of every visited file and save to the specified
  /// path
  #[arg(long, value_name = "OUTPUT")]
  pub report_csv: Option<PathBuf>,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except findings and errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

impl CheckArgs {
  const fn mode(&self) -> Mode {
    if self.fix { Mode::Fix } else { Mode::Check }
  }

  fn cli_templates(&self) -> CliTemplates {
    CliTemplates {
      paths: self
        .template
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
        .collect(),
      include: self.include.clone(),
      exclude: self.exclude.clone(),
    }
  }
}

/// Outcome of a run, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
  /// Every file conforms, or fixes were applied
  Clean = 0,
  /// Check mode found files needing attention
  NeedsAttention = 1,
  /// Configuration, template, I/O failure or interruption
  Error = 2,
}

impl CheckStatus {
  /// Errors take precedence over findings.
  pub const fn from_summary(summary: &ProcessingSummary) -> Self {
    if summary.files_with_errors > 0 {
      CheckStatus::Error
    } else if matches!(summary.mode, Mode::Check) && summary.files_needing_attention() > 0 {
      CheckStatus::NeedsAttention
    } else {
      CheckStatus::Clean
    }
  }
}

impl From<CheckStatus> for ExitCode {
  fn from(status: CheckStatus) -> Self {
    ExitCode::from(status as u8)
  }
}

/// Run the check command with the given arguments
///
/// # Errors
///
/// Returns an error for failures that prevent processing from starting:
/// unreadable configuration or templates, invalid patterns, an unusable
/// root or an unresolvable git reference.
pub fn run_check(args: CheckArgs) -> Result<CheckStatus> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  if args.skip_git_owner_check {
    disable_owner_validation();
  }

  let mode = args.mode();
  let root = absolutize_path(args.root.as_deref().unwrap_or_else(|| std::path::Path::new(".")))?;
  if !root.is_dir() {
    bail!("Root is not a directory: {}", root.display());
  }
  debug!("Using root: {}", root.display());

  let defs = resolve_template_defs(&root, &args.config, args.no_config, &args.cli_templates())?;
  let templates = TemplateSet::load(&defs)?;

  let git = metadata_provider(
    &root,
    &GitOptions {
      enabled: !args.no_git,
      reference: args.reference.clone(),
    },
  )?;

  let stop_signal = Arc::new(AtomicBool::new(false));
  let handler_signal = Arc::clone(&stop_signal);
  if let Err(e) = ctrlc::set_handler(move || handler_signal.store(true, Ordering::SeqCst)) {
    warn!("Failed to install interrupt handler: {}", e);
  }

  let mut engine = Engine::new(EngineOptions {
    force: args.force,
    respect_touched: !args.update_untouched,
    ..EngineOptions::new(&root, templates, git)
  })?
  .with_stop_signal(stop_signal);

  let diff_manager = DiffManager::new(args.show_diff, args.save_diff.clone());
  if diff_manager.is_enabled() {
    if mode == Mode::Fix {
      warn!("--show-diff and --save-diff only apply in check mode");
    } else {
      diff_manager.init()?;
      engine = engine.with_diff(diff_manager);
    }
  }

  let paths = if args.paths.is_empty() {
    vec![root.clone()]
  } else {
    args.paths.clone()
  };

  let targets = FileCollector::collect(&paths);
  print_start_message(targets.len(), mode);

  let start_time = Instant::now();
  let results = match engine.process_targets(targets, mode) {
    Ok(results) => results,
    Err(EngineError::Stopped { results }) => {
      eprintln!("ERROR: Interrupted after {} files", results.len());
      return Ok(CheckStatus::Error);
    }
  };
  let elapsed = start_time.elapsed();

  let file_reports: Vec<FileReport> = results
    .iter()
    .map(|result| FileReport::from_result(result, engine.relative_path(&result.path)))
    .collect();
  let summary = ProcessingSummary::from_results(&results, mode, elapsed);
  let categorized = CategorizedReports::from_reports(&file_reports);

  print_blank_line();
  match mode {
    Mode::Check => {
      let attention = categorized.needing_attention();
      if !attention.is_empty() {
        print_findings(&attention);
      } else if categorized.errors.is_empty() {
        print_all_files_ok();
      }
    }
    Mode::Fix => {
      let inserted = written(&categorized.inserted);
      let replaced = written(&categorized.replaced);

      print_fixed_files(&inserted, Action::Insert);
      print_fixed_files(&replaced, Action::Replace);
      if inserted.is_empty() && replaced.is_empty() && categorized.errors.is_empty() {
        print_all_files_ok();
      }
    }
  }

  print_warnings(&categorized.warnings);
  print_errors(&categorized.errors);

  print_blank_line();
  print_summary(&summary);

  let status = CheckStatus::from_summary(&summary);
  if status == CheckStatus::NeedsAttention {
    print_blank_line();
    print_hint("Run with --fix to insert or replace the headers.");
  }

  for (format, output_path) in [
    (ReportFormat::Json, args.report_json.as_ref()),
    (ReportFormat::Csv, args.report_csv.as_ref()),
  ] {
    let Some(output_path) = output_path else {
      continue;
    };
    ReportGenerator::new(format, output_path)
      .generate(&file_reports, &summary)
      .with_context(|| format!("Error generating {} report", format))?;
    info_log!("Generated {} report at {}", format, output_path.display());
  }

  Ok(status)
}

/// Drops files whose rewrite failed.
fn written<'a>(files: &[&'a FileReport]) -> Vec<&'a FileReport> {
  files.iter().copied().filter(|f| f.error.is_none()).collect()
}
