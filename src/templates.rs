//! # Templates Module
//!
//! This module provides functionality for loading header templates, deciding
//! which templates apply to a file, and rendering them with per-file values.
//!
//! The module includes:
//! - [`TemplateDef`] for describing where a template lives and which files it
//!   targets
//! - [`TemplateRule`] for a loaded template with compiled path matchers
//! - [`TemplateSet`] for the ordered, immutable list of rules
//! - [`HeaderVars`] for providing data to fill in templates
//!
//! ## Placeholders
//!
//! Templates may reference three placeholders, replaced literally:
//! - `%author%` - author of the first commit touching the file (`unknown` if
//!   not available)
//! - `%creation_date%` - date of the first commit touching the file
//! - `%last_update_date%` - date of the most recent commit touching the file
//!
//! ## Example
//!
//! ```rust
//! use headercheck::templates::{HeaderVars, TemplateRule};
//!
//! # fn main() -> anyhow::Result<()> {
//! let rule = TemplateRule::new(".header.txt", "// Author: %author%\n", None, None)?;
//! assert!(rule.applies_to("cmd/main.go"));
//!
//! let vars = HeaderVars {
//!   author: "Alice".to_string(),
//!   ..HeaderVars::default()
//! };
//! assert_eq!(rule.render(&vars), "// Author: Alice\n");
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::engine::locator::{is_comment_line, is_directive};
use crate::git::GitMetadata;

/// Include pattern used when a template does not configure one.
///
/// Matches the extensions of common source languages, case-insensitively.
pub const DEFAULT_INCLUDE_PATTERN: &str = r"(?i)\.(go|c|h|hpp|hh|cc|cpp|cxx|cs|java|kt|ts|tsx|js|jsx|mjs|cjs|rb|py|rs|php|swift|m|mm|scala|sh|bash|zsh|fish|pl|pm|r|jl|sql|proto|make|mk|cmake|dockerfile|gradle|sbt|groovy|hs|erl|ex|exs|clj|cljs|edn|fs|fsi|fsx|ps1|psm1|vb|vbs|lua|coffee|dart|nim|zig)$";

/// Placeholder for the file's author.
pub const AUTHOR_PLACEHOLDER: &str = "%author%";
/// Placeholder for the file's creation date.
pub const CREATION_DATE_PLACEHOLDER: &str = "%creation_date%";
/// Placeholder for the file's last update date.
pub const LAST_UPDATE_DATE_PLACEHOLDER: &str = "%last_update_date%";

/// Author substituted when none is known.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Error type for template operations.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
  /// The template file could not be read.
  #[error("Failed to read template '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The template has no content.
  #[error("Template '{path}' is empty")]
  Empty { path: PathBuf },

  /// A template line would not be recognized as part of a header comment.
  #[error("Template '{path}' line {line} is not a header comment: {text}")]
  NotAComment { path: PathBuf, line: usize, text: String },

  /// An include or exclude pattern is not a valid regular expression.
  #[error("Invalid {kind} pattern '{pattern}' for template '{path}': {source}")]
  InvalidPattern {
    path: PathBuf,
    kind: &'static str,
    pattern: String,
    source: regex::Error,
  },
}

/// Where a template lives and which files it targets, before loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDef {
  /// Path of the template file
  pub path: PathBuf,
  /// Regular expression a root-relative path must match; the default source
  /// extension pattern when absent
  pub include: Option<String>,
  /// Regular expression that excludes a root-relative path when it matches
  pub exclude: Option<String>,
}

impl TemplateDef {
  /// Creates a definition for `path` with default matchers.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      include: None,
      exclude: None,
    }
  }
}

/// Per-file values substituted into templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderVars {
  /// Author identity, typically `Name <email>`
  pub author: String,
  /// Creation date, `YYYY-MM-DD` or empty
  pub creation_date: String,
  /// Last update date, `YYYY-MM-DD` or empty
  pub last_update_date: String,
}

impl HeaderVars {
  /// Looks up the values for `path` through the git metadata provider.
  pub fn resolve(git: &dyn GitMetadata, path: &Path) -> Self {
    Self {
      author: git.author(path),
      creation_date: git.creation_date(path),
      last_update_date: git.last_update_date(path),
    }
  }
}

/// A loaded header template with its path matchers.
///
/// Rules are immutable once built. Rendering produces a new string and never
/// changes the stored content.
#[derive(Debug, Clone)]
pub struct TemplateRule {
  path: PathBuf,
  include: Regex,
  exclude: Option<Regex>,
  content: String,
}

impl TemplateRule {
  /// Builds a rule from template content already in memory.
  ///
  /// Line endings are normalized to LF. An empty or blank `include` falls back
  /// to [`DEFAULT_INCLUDE_PATTERN`]; an empty or blank `exclude` is ignored.
  ///
  /// # Errors
  ///
  /// Returns an error if the content is blank, a line is not a comment (or
  /// is a shebang or directive), or a pattern does not compile.
  pub fn new(
    path: impl Into<PathBuf>,
    content: &str,
    include: Option<&str>,
    exclude: Option<&str>,
  ) -> Result<Self, TemplateError> {
    let path = path.into();
    let content = normalize_newlines(content);
    if content.trim().is_empty() {
      return Err(TemplateError::Empty { path });
    }
    if let Some((index, text)) = content.lines().enumerate().find(|(_, line)| !is_header_line(line)) {
      return Err(TemplateError::NotAComment {
        path,
        line: index + 1,
        text: text.trim().to_string(),
      });
    }

    let include_pattern = include.filter(|p| !p.trim().is_empty()).unwrap_or(DEFAULT_INCLUDE_PATTERN);
    let include = compile(&path, "include", include_pattern)?;
    let exclude = match exclude.filter(|p| !p.trim().is_empty()) {
      Some(pattern) => Some(compile(&path, "exclude", pattern)?),
      None => None,
    };

    Ok(Self {
      path,
      include,
      exclude,
      content,
    })
  }

  /// Reads the template file named by `def` and builds its rule.
  pub fn load(def: &TemplateDef) -> Result<Self, TemplateError> {
    debug!("Loading template: {}", def.path.display());
    let content = fs::read_to_string(&def.path).map_err(|source| TemplateError::ReadError {
      path: def.path.clone(),
      source,
    })?;
    Self::new(
      def.path.clone(),
      &content,
      def.include.as_deref(),
      def.exclude.as_deref(),
    )
  }

  /// Path the template was loaded from.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// The template body with LF line endings and placeholders intact.
  pub fn content(&self) -> &str {
    &self.content
  }

  /// Returns `true` if the rule targets the given root-relative path.
  pub fn applies_to(&self, rel_path: &str) -> bool {
    self.include.is_match(rel_path) && !self.exclude.as_ref().is_some_and(|re| re.is_match(rel_path))
  }

  /// Substitutes the placeholders with `vars`.
  pub fn render(&self, vars: &HeaderVars) -> String {
    let author = if vars.author.is_empty() {
      UNKNOWN_AUTHOR
    } else {
      vars.author.as_str()
    };
    self
      .content
      .replace(AUTHOR_PLACEHOLDER, author)
      .replace(CREATION_DATE_PLACEHOLDER, &vars.creation_date)
      .replace(LAST_UPDATE_DATE_PLACEHOLDER, &vars.last_update_date)
  }
}

/// The ordered list of rules an engine works with.
///
/// When several rules apply to one file, configured order decides priority.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
  rules: Vec<TemplateRule>,
}

impl TemplateSet {
  /// Loads every definition, in order.
  ///
  /// # Errors
  ///
  /// Fails on the first template that cannot be read or is rejected by
  /// [`TemplateRule::new`].
  pub fn load(defs: &[TemplateDef]) -> Result<Self, TemplateError> {
    let rules = defs.iter().map(TemplateRule::load).collect::<Result<Vec<_>, _>>()?;
    debug!("Loaded {} templates", rules.len());
    Ok(Self { rules })
  }

  /// Wraps rules that were built in memory.
  pub const fn from_rules(rules: Vec<TemplateRule>) -> Self {
    Self { rules }
  }

  /// All rules, in priority order.
  pub fn rules(&self) -> &[TemplateRule] {
    &self.rules
  }

  /// Rules that target the given root-relative path, in priority order.
  pub fn applicable<'a>(&'a self, rel_path: &'a str) -> impl Iterator<Item = &'a TemplateRule> + 'a {
    self.rules.iter().filter(move |rule| rule.applies_to(rel_path))
  }

  /// Number of rules.
  pub fn len(&self) -> usize {
    self.rules.len()
  }

  /// Returns `true` if no rules are configured.
  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

/// Converts CRLF line endings to LF.
pub fn normalize_newlines(text: &str) -> String {
  text.replace("\r\n", "\n")
}

/// Lines the header locator collects into a header block.
fn is_header_line(line: &str) -> bool {
  is_comment_line(line) && !is_directive(line) && !line.trim_start().starts_with("#!")
}

fn compile(path: &Path, kind: &'static str, pattern: &str) -> Result<Regex, TemplateError> {
  Regex::new(pattern).map_err(|source| TemplateError::InvalidPattern {
    path: path.to_path_buf(),
    kind,
    pattern: pattern.to_string(),
    source,
  })
}
