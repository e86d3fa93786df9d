//! # Diff Module
//!
//! This module contains functionality for creating and rendering diffs between original and rewritten content.
//! It's used in check mode to preview what a fix would change in each file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use similar::{ChangeTag, TextDiff};

/// Manages diff creation and rendering for header changes.
///
/// This struct handles:
/// - Generating diffs between original and rewritten content
/// - Displaying diffs to stderr with colorization
/// - Appending diffs to a file
#[derive(Debug, Clone, Default)]
pub struct DiffManager {
  /// Whether to print diffs to stderr
  pub show_diff: bool,

  /// Path of the file diffs are appended to
  pub save_diff_path: Option<PathBuf>,
}

impl DiffManager {
  /// Creates a new DiffManager with the specified configuration.
  pub const fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Self {
    Self {
      show_diff,
      save_diff_path,
    }
  }

  /// Returns `true` if diffs are shown or saved.
  pub const fn is_enabled(&self) -> bool {
    self.show_diff || self.save_diff_path.is_some()
  }

  /// Truncates the diff file so that a run starts from an empty file.
  pub fn init(&self) -> Result<()> {
    if let Some(ref diff_path) = self.save_diff_path {
      std::fs::write(diff_path, "").with_context(|| format!("Failed to create diff file: {}", diff_path.display()))?;
    }
    Ok(())
  }

  /// Displays and/or saves a diff between the original and new content.
  ///
  /// Multiple diffs from different files are appended to the same file,
  /// creating a single consolidated diff file.
  ///
  /// # Parameters
  ///
  /// * `path` - Path of the file as shown to the user
  /// * `original` - Original file content
  /// * `new` - Content after the planned rewrite
  pub fn display_diff(&self, path: &Path, original: &str, new: &str) -> Result<()> {
    if !self.is_enabled() {
      return Ok(());
    }

    let diff_content = render_diff(path, original, new);

    if self.show_diff {
      for line in diff_content.lines() {
        if line.starts_with('+') {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.green()));
        } else if line.starts_with('-') {
          eprintln!("{}", line.if_supports_color(Stream::Stderr, |l| l.red()));
        } else {
          eprintln!("{}", line);
        }
      }
    }

    if let Some(ref diff_path) = self.save_diff_path {
      let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(diff_path)
        .with_context(|| format!("Failed to open diff file: {}", diff_path.display()))?;
      file
        .write_all(diff_content.as_bytes())
        .with_context(|| format!("Failed to write diff file: {}", diff_path.display()))?;
    }

    Ok(())
  }
}

/// Renders a line diff with a `Diff for <path>:` heading, one sign character
/// per line and a trailing blank line.
pub fn render_diff(path: &Path, original: &str, new: &str) -> String {
  let diff = TextDiff::from_lines(original, new);

  let mut diff_content = format!("Diff for {}:\n", path.display());
  for change in diff.iter_all_changes() {
    let sign = match change.tag() {
      ChangeTag::Delete => "-",
      ChangeTag::Insert => "+",
      ChangeTag::Equal => " ",
    };
    diff_content.push_str(sign);
    diff_content.push_str(change.value());
    if change.missing_newline() {
      diff_content.push('\n');
    }
  }
  diff_content.push('\n');
  diff_content
}
