//! # Git Module
//!
//! This module provides the git-derived values used to render headers: who
//! created a file, when it was created and last updated, and whether it has
//! been touched relative to a reference.
//!
//! The engine only sees the [`GitMetadata`] trait. Two implementations exist:
//! - [`GitRepository`] reads history and status from a repository with
//!   `git2`
//! - [`DisabledGit`] returns empty values and reports every file as touched

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset};
use git2::{Commit, Oid, Repository, Sort, Status, StatusOptions};
use tracing::{debug, trace, warn};

use crate::verbose_log;

/// Source of per-file git metadata.
///
/// Paths are absolute. Lookups never fail: missing values are returned as
/// empty strings.
pub trait GitMetadata: Send + Sync {
  /// `Name <email>` of the author of the first commit touching the file.
  fn author(&self, path: &Path) -> String;

  /// Author date of the first commit touching the file, as `YYYY-MM-DD`.
  fn creation_date(&self, path: &Path) -> String;

  /// Author date of the most recent commit touching the file, as
  /// `YYYY-MM-DD`.
  fn last_update_date(&self, path: &Path) -> String;

  /// Whether the file has changes that are not part of the reference.
  fn touched(&self, path: &Path) -> bool;
}

/// Metadata provider used when git is unavailable or turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGit;

impl GitMetadata for DisabledGit {
  fn author(&self, _path: &Path) -> String {
    String::new()
  }

  fn creation_date(&self, _path: &Path) -> String {
    String::new()
  }

  fn last_update_date(&self, _path: &Path) -> String {
    String::new()
  }

  fn touched(&self, _path: &Path) -> bool {
    true
  }
}

/// Options controlling how the metadata provider is chosen.
#[derive(Debug, Clone, Default)]
pub struct GitOptions {
  /// Use the repository at all
  pub enabled: bool,
  /// Revision that "touched" is measured against instead of HEAD
  pub reference: Option<String>,
}

/// Picks the metadata provider for `root`.
///
/// Falls back to [`DisabledGit`] when `root` is not inside a repository,
/// unless a reference revision was requested.
///
/// # Errors
///
/// Returns an error if a reference revision is configured and the repository
/// or revision cannot be resolved.
pub fn metadata_provider(root: &Path, options: &GitOptions) -> Result<Box<dyn GitMetadata>> {
  if !options.enabled {
    debug!("Git metadata disabled");
    return Ok(Box::new(DisabledGit));
  }

  match GitRepository::open(root, options.reference.as_deref()) {
    Ok(repo) => Ok(Box::new(repo)),
    Err(e) if options.reference.is_none() => {
      verbose_log!("No git repository found at {}, git metadata disabled", root.display());
      debug!("Git discovery failed: {:#}", e);
      Ok(Box::new(DisabledGit))
    }
    Err(e) => Err(e),
  }
}

/// Turns off libgit2's repository ownership validation.
///
/// Useful in containers where the checkout belongs to another user. Must be
/// called before any repository is opened.
pub fn disable_owner_validation() {
  debug!("Disabling git repository ownership check");
  // SAFETY: called during startup, before any repository operation is in
  // progress.
  unsafe {
    if let Err(e) = git2::opts::set_verify_owner_validation(false) {
      warn!("Failed to disable git ownership check: {}", e);
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileHistory {
  author: String,
  created: String,
  updated: String,
}

/// Metadata provider backed by a git repository.
///
/// History is computed once per path and cached for the lifetime of the
/// provider.
pub struct GitRepository {
  repo: Mutex<Repository>,
  workdir: PathBuf,
  reference_changes: Option<HashSet<PathBuf>>,
  history: Mutex<HashMap<PathBuf, Option<FileHistory>>>,
}

impl std::fmt::Debug for GitRepository {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GitRepository")
      .field("workdir", &self.workdir)
      .field("reference", &self.reference_changes.as_ref().map(HashSet::len))
      .finish_non_exhaustive()
  }
}

impl GitRepository {
  /// Discovers the repository containing `root`.
  ///
  /// With a `reference`, the set of files changed since that revision is
  /// computed up front.
  ///
  /// # Errors
  ///
  /// Returns an error if no repository contains `root`, the repository is
  /// bare, or the reference cannot be resolved.
  pub fn open(root: &Path, reference: Option<&str>) -> Result<Self> {
    let repo = Repository::discover(root)
      .with_context(|| format!("Failed to find git repository for {}", root.display()))?;

    let workdir = repo
      .workdir()
      .ok_or_else(|| anyhow!("Git repository at {} has no working tree", repo.path().display()))?;
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    debug!("Using git repository at {}", workdir.display());

    let reference_changes = reference
      .map(|reference| changed_since(&repo, reference))
      .transpose()?;

    Ok(Self {
      repo: Mutex::new(repo),
      workdir,
      reference_changes,
      history: Mutex::new(HashMap::new()),
    })
  }

  fn relative(&self, path: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(&self.workdir) {
      return Some(rel.to_path_buf());
    }
    let canonical = path.canonicalize().ok()?;
    canonical.strip_prefix(&self.workdir).ok().map(Path::to_path_buf)
  }

  fn history(&self, path: &Path) -> Option<FileHistory> {
    let rel = self.relative(path)?;

    if let Ok(cache) = self.history.lock()
      && let Some(cached) = cache.get(&rel)
    {
      return cached.clone();
    }

    let computed = match self.compute_history(&rel) {
      Ok(history) => history,
      Err(e) => {
        debug!("Git history lookup failed for {}: {:#}", rel.display(), e);
        None
      }
    };

    if let Ok(mut cache) = self.history.lock() {
      cache.insert(rel, computed.clone());
    }
    computed
  }

  fn compute_history(&self, rel: &Path) -> Result<Option<FileHistory>> {
    let repo = self.repo.lock().map_err(|e| anyhow!("Git repository lock poisoned: {e}"))?;

    let mut revwalk = repo.revwalk().context("Failed to create revwalk")?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME).context("Failed to sort revwalk")?;
    if revwalk.push_head().is_err() {
      trace!("No HEAD commit, no history for {}", rel.display());
      return Ok(None);
    }

    let mut newest: Option<(String, String)> = None;
    let mut oldest: Option<(String, String)> = None;
    for oid in revwalk {
      let commit = repo.find_commit(oid.context("Failed to walk history")?)?;
      if !commit_touches(&commit, rel) {
        continue;
      }
      let author = commit.author();
      let summary = (format_signature(&author), format_date(&author.when()));
      if newest.is_none() {
        newest = Some(summary.clone());
      }
      oldest = Some(summary);
    }

    let (Some((_, updated)), Some((author, created))) = (newest, oldest) else {
      trace!("No commits touch {}", rel.display());
      return Ok(None);
    };

    Ok(Some(FileHistory {
      author,
      created,
      updated,
    }))
  }

  fn has_local_changes(&self, rel: &Path) -> Result<bool> {
    let repo = self.repo.lock().map_err(|e| anyhow!("Git repository lock poisoned: {e}"))?;
    let status = repo
      .status_file(rel)
      .with_context(|| format!("Failed to get git status for {}", rel.display()))?;
    Ok(!status.is_empty() && !status.contains(Status::IGNORED))
  }
}

impl GitMetadata for GitRepository {
  fn author(&self, path: &Path) -> String {
    self.history(path).map(|h| h.author).unwrap_or_default()
  }

  fn creation_date(&self, path: &Path) -> String {
    self.history(path).map(|h| h.created).unwrap_or_default()
  }

  fn last_update_date(&self, path: &Path) -> String {
    self.history(path).map(|h| h.updated).unwrap_or_default()
  }

  fn touched(&self, path: &Path) -> bool {
    let Some(rel) = self.relative(path) else {
      return false;
    };

    if let Some(changes) = &self.reference_changes {
      return changes.contains(&rel);
    }

    match self.has_local_changes(&rel) {
      Ok(touched) => touched,
      Err(e) => {
        debug!("Treating {} as untouched: {:#}", rel.display(), e);
        false
      }
    }
  }
}

/// Returns `true` if the commit changes the blob at `rel` compared to every
/// parent (or adds it, for a root commit).
fn commit_touches(commit: &Commit<'_>, rel: &Path) -> bool {
  let current = entry_id(commit, rel);
  if commit.parent_count() == 0 {
    return current.is_some();
  }
  commit.parents().all(|parent| entry_id(&parent, rel) != current)
}

fn entry_id(commit: &Commit<'_>, rel: &Path) -> Option<Oid> {
  commit.tree().ok()?.get_path(rel).ok().map(|entry| entry.id())
}

fn format_signature(signature: &git2::Signature<'_>) -> String {
  format!(
    "{} <{}>",
    signature.name().unwrap_or_default(),
    signature.email().unwrap_or_default()
  )
}

/// Formats a git timestamp as `YYYY-MM-DD` in the author's own timezone.
fn format_date(time: &git2::Time) -> String {
  let Some(offset) = FixedOffset::east_opt(time.offset_minutes() * 60) else {
    return String::new();
  };
  DateTime::from_timestamp(time.seconds(), 0)
    .map(|utc| utc.with_timezone(&offset).format("%Y-%m-%d").to_string())
    .unwrap_or_default()
}

/// Collects the files that differ between `reference` and the working tree.
///
/// This covers files committed since the reference as well as staged,
/// unstaged and untracked changes.
fn changed_since(repo: &Repository, reference: &str) -> Result<HashSet<PathBuf>> {
  verbose_log!("Getting changed files relative to: {}", reference);

  let reference_tree = repo
    .revparse_single(reference)
    .with_context(|| format!("Failed to find git reference: {}", reference))?
    .peel_to_tree()
    .with_context(|| format!("Failed to get tree for reference: {}", reference))?;

  let mut changed_files = HashSet::new();

  let mut status_opts = StatusOptions::new();
  status_opts.include_untracked(true).recurse_untracked_dirs(true);
  let statuses = repo
    .statuses(Some(&mut status_opts))
    .with_context(|| "Failed to get git status")?;

  for entry in statuses.iter() {
    let status = entry.status();
    if status.is_ignored() {
      continue;
    }
    if let Some(path) = entry.path() {
      trace!("Changed file: {}", path);
      changed_files.insert(PathBuf::from(path));
    }
  }

  if let Ok(head_tree) = repo.head().and_then(|head| head.peel_to_tree()) {
    let diff = repo
      .diff_tree_to_tree(Some(&reference_tree), Some(&head_tree), None)
      .with_context(|| "Failed to create diff between reference and HEAD")?;

    for delta in diff.deltas() {
      if let Some(path) = delta.new_file().path() {
        trace!("Changed file (in diff): {}", path.display());
        changed_files.insert(path.to_path_buf());
      }
    }
  }

  verbose_log!("Found {} changed files", changed_files.len());
  Ok(changed_files)
}
