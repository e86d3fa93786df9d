//! # Engine Module
//!
//! This module contains the header reconciliation engine: for every file it
//! locates the existing header, compares it with the rendered templates that
//! apply to the file, and either reports the file or rewrites it.
//!
//! The module is organized into several submodules:
//! - [`locator`] - Shebang, directive and header block detection
//! - [`matcher`] - Exact, structural and variable-masked header comparison
//! - [`planner`] - Computing the rewritten file content
//! - [`file_collector`] - Expanding path arguments into files
//! - [`file_io`] - File reading and writing operations
//!
//! The [`Engine`] struct is the main entry point, applying the decision
//! policy to each file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use headercheck::engine::{Engine, EngineOptions, Mode};
//! use headercheck::git::DisabledGit;
//! use headercheck::templates::{TemplateDef, TemplateSet};
//!
//! # fn main() -> anyhow::Result<()> {
//! let templates = TemplateSet::load(&[TemplateDef::new(".header.txt")])?;
//! let engine = Engine::new(EngineOptions::new(".", templates, Box::new(DisabledGit)))?;
//!
//! for result in engine.process(&[".".into()], Mode::Check)? {
//!   if result.needs_attention() {
//!     println!("{}: {}", result.path.display(), result.action);
//!   }
//! }
//! # Ok(())
//! # }
//! ```

pub mod file_collector;
pub mod file_io;
pub mod locator;
pub mod matcher;
pub mod planner;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
pub use file_collector::{FileCollector, Target, absolutize_path};
pub use file_io::FileIO;
pub use locator::{HeaderRegion, locate};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use self::file_collector::{normalize_relative_path, to_slash_path};
use self::matcher::{HeaderMatch, find_match, structurally_equal};
use self::planner::Displaced;
use crate::diff::DiffManager;
use crate::git::GitMetadata;
use crate::templates::{HeaderVars, TemplateSet};

/// Whether files are only inspected or also rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  /// Report files needing attention without writing
  Check,
  /// Rewrite files needing attention
  Fix,
}

/// Outcome kind for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  /// Nothing to do
  None,
  /// A header is (or would be) inserted
  Insert,
  /// The existing header is (or would be) replaced
  Replace,
  /// Reserved; never produced
  Remove,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Action::None => "none",
      Action::Insert => "insert",
      Action::Replace => "replace",
      Action::Remove => "remove",
    };
    f.write_str(name)
  }
}

/// Outcome for one visited file.
#[derive(Debug)]
pub struct FileResult {
  /// Absolute path of the file
  pub path: PathBuf,
  /// What was (or would be) done
  pub action: Action,
  /// Read or write failure for this file
  pub error: Option<anyhow::Error>,
  /// Non-fatal note, such as a skipped non-UTF-8 file
  pub warning: Option<String>,
}

impl FileResult {
  /// A result with no action.
  pub const fn none(path: PathBuf) -> Self {
    Self {
      path,
      action: Action::None,
      error: None,
      warning: None,
    }
  }

  /// A result carrying an error.
  pub const fn failed(path: PathBuf, error: anyhow::Error) -> Self {
    Self {
      path,
      action: Action::None,
      error: Some(error),
      warning: None,
    }
  }

  /// Returns `true` if the file needs (or received) a header change.
  pub fn needs_attention(&self) -> bool {
    self.action != Action::None
  }

  /// Returns `true` if processing this file failed.
  pub const fn is_error(&self) -> bool {
    self.error.is_some()
  }
}

/// Error type for engine runs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The stop signal was raised between two files.
  #[error("Processing stopped after {} files", .results.len())]
  Stopped {
    /// Results for the files processed before stopping
    results: Vec<FileResult>,
  },
}

/// What the engine would do with a file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
  /// The planned action
  pub action: Action,
  /// Content after the planned rewrite, present for insert and replace
  pub fixed: Option<String>,
  /// Non-fatal note, such as a skipped non-UTF-8 file
  pub warning: Option<String>,
}

impl Diagnosis {
  const fn none() -> Self {
    Self {
      action: Action::None,
      fixed: None,
      warning: None,
    }
  }

  const fn change(action: Action, fixed: String) -> Self {
    Self {
      action,
      fixed: Some(fixed),
      warning: None,
    }
  }

  /// Returns `true` if the content needs a header change.
  pub fn needs_fix(&self) -> bool {
    self.action != Action::None
  }
}

/// Configuration for creating an Engine instance.
pub struct EngineOptions {
  /// Directory include and exclude patterns are evaluated against
  pub root: PathBuf,
  /// Ordered template rules
  pub templates: TemplateSet,
  /// Emit a warning for files skipped as non-UTF-8
  pub force: bool,
  /// Skip refreshing variable-only differences in untouched files
  pub respect_touched: bool,
  /// Source of author and date values
  pub git: Box<dyn GitMetadata>,
}

impl EngineOptions {
  /// Creates options with required fields and defaults for the flags.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// EngineOptions {
  ///     force: true,
  ///     ..EngineOptions::new(root, templates, git)
  /// }
  /// ```
  pub fn new(root: impl Into<PathBuf>, templates: TemplateSet, git: Box<dyn GitMetadata>) -> Self {
    Self {
      root: root.into(),
      templates,
      force: false,
      respect_touched: true,
      git,
    }
  }
}

/// The header reconciliation engine.
///
/// The rule set is read-only once the engine is built. Files are processed
/// sequentially; the stop signal is checked between files.
pub struct Engine {
  root: PathBuf,
  templates: TemplateSet,
  template_sources: HashSet<PathBuf>,
  force: bool,
  respect_touched: bool,
  git: Box<dyn GitMetadata>,
  diff_manager: Option<DiffManager>,
  stop_signal: Option<Arc<AtomicBool>>,
}

impl Engine {
  /// Creates a new engine with the specified configuration.
  ///
  /// # Errors
  ///
  /// Returns an error if the root cannot be made absolute.
  pub fn new(options: EngineOptions) -> Result<Self> {
    let root = absolutize_path(&options.root)?;
    let template_sources = options
      .templates
      .rules()
      .iter()
      .map(|rule| absolutize_path(rule.path()))
      .collect::<Result<HashSet<_>>>()?;

    debug!(
      "Engine rooted at {} with {} templates",
      root.display(),
      options.templates.len()
    );

    Ok(Self {
      root,
      templates: options.templates,
      template_sources,
      force: options.force,
      respect_touched: options.respect_touched,
      git: options.git,
      diff_manager: None,
      stop_signal: None,
    })
  }

  /// Shows or saves a diff of each planned rewrite in check mode.
  pub fn with_diff(mut self, diff_manager: DiffManager) -> Self {
    self.diff_manager = Some(diff_manager);
    self
  }

  /// Stops processing between files once `signal` is set.
  pub fn with_stop_signal(mut self, signal: Arc<AtomicBool>) -> Self {
    self.stop_signal = Some(signal);
    self
  }

  /// The absolute root directory.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path of `path` relative to the root, with forward slashes.
  pub fn relative_path(&self, path: &Path) -> String {
    to_slash_path(&normalize_relative_path(&self.absolute(path), &self.root))
  }

  /// Returns `true` if at least one template applies to the path.
  pub fn accepts_path(&self, path: &Path) -> bool {
    self.accepts_relative(&self.relative_path(path))
  }

  /// Renders every template that applies to the path, in priority order.
  pub fn render_for(&self, path: &Path) -> Vec<String> {
    let abs = self.absolute(path);
    let rel = self.relative_path(&abs);
    self.render_applicable(&abs, &rel)
  }

  /// Plans the change for `content` as if it were the content of `path`,
  /// without reading or writing the file.
  ///
  /// The action follows check mode: a header that only differs in variable
  /// values is considered conforming.
  pub fn diagnose(&self, path: &Path, content: &[u8]) -> Diagnosis {
    let abs = self.absolute(path);
    if self.is_template_source(&abs) {
      return Diagnosis::none();
    }
    let rel = self.relative_path(&abs);
    if !self.accepts_relative(&rel) {
      return Diagnosis::none();
    }
    self.plan(&abs, &rel, content, Mode::Check)
  }

  /// Processes files, directories and glob patterns.
  ///
  /// Every visited regular file yields exactly one result. Arguments that
  /// cannot be read yield a result carrying the error.
  ///
  /// # Errors
  ///
  /// Returns [`EngineError::Stopped`] with the results gathered so far if the
  /// stop signal is raised.
  pub fn process(&self, paths: &[PathBuf], mode: Mode) -> Result<Vec<FileResult>, EngineError> {
    self.process_targets(FileCollector::collect(paths), mode)
  }

  /// Processes targets gathered with [`FileCollector::collect`].
  ///
  /// # Errors
  ///
  /// Returns [`EngineError::Stopped`] with the results gathered so far if the
  /// stop signal is raised.
  pub fn process_targets(&self, targets: Vec<Target>, mode: Mode) -> Result<Vec<FileResult>, EngineError> {
    let start_time = std::time::Instant::now();
    let mut results = Vec::with_capacity(targets.len());

    for target in targets {
      if self.stop_requested() {
        warn!("Stop requested after {} files", results.len());
        return Err(EngineError::Stopped { results });
      }

      let result = match target {
        Target::File(path) => self.process_file(&path, mode),
        Target::Unreadable { path, error } => FileResult::failed(path, error),
      };
      results.push(result);
    }

    debug!(
      "Processed {} files in {}ms",
      results.len(),
      start_time.elapsed().as_millis()
    );
    Ok(results)
  }

  /// Processes a single file.
  pub fn process_file(&self, path: &Path, mode: Mode) -> FileResult {
    let path = self.absolute(path);

    if self.is_template_source(&path) {
      trace!("Skipping: {} (template source)", path.display());
      return FileResult::none(path);
    }

    let rel = self.relative_path(&path);
    if !self.accepts_relative(&rel) {
      trace!("Skipping: {} (no applicable template)", rel);
      return FileResult::none(path);
    }

    let bytes = match FileIO::read_bytes(&path) {
      Ok(bytes) => bytes,
      Err(e) => return FileResult::failed(path, e),
    };

    let plan = self.plan(&path, &rel, &bytes, mode);
    let mut result = FileResult {
      path,
      action: plan.action,
      error: None,
      warning: plan.warning,
    };

    let Some(fixed) = plan.fixed else {
      return result;
    };

    match mode {
      Mode::Fix => match FileIO::write_file(&result.path, &fixed) {
        Ok(()) => debug!("{}: header {}", rel, result.action),
        Err(e) => result.error = Some(e),
      },
      Mode::Check => {
        if let Some(diff_manager) = &self.diff_manager
          && let Ok(original) = std::str::from_utf8(&bytes)
          && let Err(e) = diff_manager.display_diff(Path::new(&rel), original, &fixed)
        {
          warn!("Failed to display diff for {}: {:#}", rel, e);
        }
      }
    }

    result
  }

  fn plan(&self, path: &Path, rel: &str, bytes: &[u8], mode: Mode) -> Diagnosis {
    let Ok(content) = std::str::from_utf8(bytes) else {
      trace!("Skipping: {} (not valid UTF-8)", rel);
      return Diagnosis {
        warning: self.force.then(|| format!("skipped non-UTF-8 file: {}", rel)),
        ..Diagnosis::none()
      };
    };

    let rendered = self.render_applicable(path, rel);
    let Some(first) = rendered.first() else {
      return Diagnosis::none();
    };

    let region = locate(content);
    match find_match(&region, rendered.as_slice()) {
      Some(found) => self.plan_matched(path, rel, content, &found, &rendered[found.index], mode),
      None if region.is_empty() => Diagnosis::change(Action::Insert, planner::insert(content, first)),
      None => Diagnosis::change(
        Action::Replace,
        planner::replace(content, &region, first, Displaced::Demote),
      ),
    }
  }

  fn plan_matched(
    &self,
    path: &Path,
    rel: &str,
    content: &str,
    found: &HeaderMatch<'_>,
    header: &str,
    mode: Mode,
  ) -> Diagnosis {
    if mode == Mode::Check {
      return Diagnosis::none();
    }

    let existing = found.window.text;
    if existing == header || structurally_equal(existing, header) {
      trace!("{}: header up to date", rel);
      return Diagnosis::none();
    }

    if self.respect_touched && !self.git.touched(path) {
      debug!("{}: header variables are stale but the file is untouched", rel);
      return Diagnosis::none();
    }

    Diagnosis::change(
      Action::Replace,
      planner::replace(content, &found.window, header, Displaced::Discard),
    )
  }

  fn render_applicable(&self, path: &Path, rel: &str) -> Vec<String> {
    let rules: Vec<_> = self.templates.applicable(rel).collect();
    if rules.is_empty() {
      return Vec::new();
    }
    let vars = HeaderVars::resolve(&*self.git, path);
    rules.iter().map(|rule| rule.render(&vars)).collect()
  }

  fn accepts_relative(&self, rel: &str) -> bool {
    self.templates.applicable(rel).next().is_some()
  }

  fn is_template_source(&self, abs: &Path) -> bool {
    self.template_sources.contains(abs)
  }

  fn absolute(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      file_collector::normalize_lexically(path)
    } else {
      absolutize_path(path).unwrap_or_else(|_| self.root.join(path))
    }
  }

  fn stop_requested(&self) -> bool {
    self
      .stop_signal
      .as_ref()
      .is_some_and(|signal| signal.load(Ordering::Relaxed))
  }
}
