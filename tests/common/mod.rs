#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use headercheck::engine::{Engine, EngineOptions};
use headercheck::git::GitMetadata;
use headercheck::templates::{TemplateDef, TemplateSet};

/// Checks if git is available on the system.
pub fn is_git_available() -> bool {
  Command::new("git").arg("--version").status().is_ok()
}

/// Runs a git command in the given directory, returning an error with stderr on
/// failure.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
  let output = Command::new("git")
    .args(args)
    .current_dir(dir)
    .output()
    .with_context(|| format!("Failed to execute git {:?}", args))?;

  if !output.status.success() {
    anyhow::bail!("git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
  }
  Ok(())
}

/// Initializes a git repository in the given directory with deterministic
/// settings.
///
/// Configures:
/// - Default branch name set to `main`
/// - User name and email for commits
/// - Disables commit signing for test isolation
pub fn init_git_repo(dir: &Path) -> Result<()> {
  run_git(dir, &["init"])?;
  run_git(dir, &["config", "init.defaultBranch", "main"])?;
  run_git(dir, &["branch", "-M", "main"])?;
  run_git(dir, &["config", "user.name", "Test User"])?;
  run_git(dir, &["config", "user.email", "test@example.com"])?;
  // Disable commit signing for test isolation
  run_git(dir, &["config", "commit.gpgsign", "false"])?;
  Ok(())
}

/// Creates a commit with all staged changes.
pub fn git_commit(dir: &Path, message: &str) -> Result<()> {
  run_git(dir, &["commit", "-m", message])
}

/// Stages a file and creates a commit.
pub fn git_add_and_commit(dir: &Path, file: &str, message: &str) -> Result<()> {
  run_git(dir, &["add", file])?;
  git_commit(dir, message)
}

/// Stages a file and creates a commit with a fixed author date.
pub fn git_add_and_commit_at(dir: &Path, file: &str, message: &str, date: &str) -> Result<()> {
  run_git(dir, &["add", file])?;
  let output = Command::new("git")
    .args(["commit", "-m", message])
    .env("GIT_AUTHOR_DATE", date)
    .env("GIT_COMMITTER_DATE", date)
    .current_dir(dir)
    .output()
    .context("Failed to execute git commit")?;

  if !output.status.success() {
    anyhow::bail!("git commit failed: {}", String::from_utf8_lossy(&output.stderr));
  }
  Ok(())
}

/// Git metadata with fixed values for every path.
#[derive(Debug, Clone)]
pub struct FakeGit {
  pub author: String,
  pub creation_date: String,
  pub last_update_date: String,
  pub touched: bool,
}

impl Default for FakeGit {
  fn default() -> Self {
    Self {
      author: "Alice".to_string(),
      creation_date: "2020-01-01".to_string(),
      last_update_date: "2024-02-02".to_string(),
      touched: true,
    }
  }
}

impl GitMetadata for FakeGit {
  fn author(&self, _path: &Path) -> String {
    self.author.clone()
  }

  fn creation_date(&self, _path: &Path) -> String {
    self.creation_date.clone()
  }

  fn last_update_date(&self, _path: &Path) -> String {
    self.last_update_date.clone()
  }

  fn touched(&self, _path: &Path) -> bool {
    self.touched
  }
}

/// Writes a template into `root` and returns its definition.
pub fn write_template(root: &Path, name: &str, content: &str) -> Result<TemplateDef> {
  let path = root.join(name);
  fs::write(&path, content).with_context(|| format!("Failed to write template {}", path.display()))?;
  Ok(TemplateDef::new(path))
}

/// Builds an engine rooted at `root` with the given templates and git values.
pub fn engine_with(
  root: &Path,
  defs: &[TemplateDef],
  git: FakeGit,
  configure: impl FnOnce(&mut EngineOptions),
) -> Result<Engine> {
  let templates = TemplateSet::load(defs)?;
  let mut options = EngineOptions::new(root, templates, Box::new(git));
  configure(&mut options);
  Engine::new(options)
}

/// Writes a source file into `root` and returns its path.
pub fn write_source(root: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
  let path = root.join(name);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(path)
}

/// Makes a file read-only.
///
/// Returns `false` if the file is still writable afterwards, which happens
/// when running as root.
#[cfg(unix)]
pub fn make_read_only(path: &Path) -> Result<bool> {
  use std::os::unix::fs::PermissionsExt;

  let mut perms = fs::metadata(path)?.permissions();
  perms.set_mode(0o444);
  fs::set_permissions(path, perms)?;
  Ok(fs::OpenOptions::new().write(true).open(path).is_err())
}

/// Restores owner write permission on a file.
#[cfg(unix)]
pub fn make_writable(path: &Path) -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let mut perms = fs::metadata(path)?.permissions();
  perms.set_mode(0o644);
  fs::set_permissions(path, perms)?;
  Ok(())
}
