//! # File Collector Module
//!
//! This module turns user-provided path arguments (files, directories and glob
//! patterns) into the list of regular files the engine visits, and provides
//! the path normalization helpers the engine uses to compute root-relative
//! paths.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Directory names that are never descended into.
pub const SKIPPED_DIRS: [&str; 5] = [".git", "vendor", ".idea", ".vscode", "node_modules"];

/// A file selected for processing, or an argument that could not be expanded.
#[derive(Debug)]
pub enum Target {
  /// A regular file, as an absolute normalized path
  File(PathBuf),
  /// An argument or directory entry that could not be read
  Unreadable { path: PathBuf, error: anyhow::Error },
}

/// File collector for path arguments and directory traversal.
///
/// The `FileCollector` handles:
/// - Expanding glob patterns
/// - Walking directories while skipping VCS, vendor and editor directories
/// - Skipping symlinks and deduplicating overlapping arguments
#[derive(Debug, Default)]
pub struct FileCollector {
  seen: HashSet<PathBuf>,
  targets: Vec<Target>,
}

impl FileCollector {
  /// Creates an empty collector.
  pub fn new() -> Self {
    Self::default()
  }

  /// Collects the targets for every argument, in argument order.
  pub fn collect(args: &[PathBuf]) -> Vec<Target> {
    let mut collector = Self::new();
    for arg in args {
      collector.add_arg(arg);
    }
    debug!("Collected {} targets from {} arguments", collector.targets.len(), args.len());
    collector.targets
  }

  /// Adds a single path argument.
  pub fn add_arg(&mut self, arg: &Path) {
    match std::fs::symlink_metadata(arg) {
      Ok(metadata) if metadata.is_dir() => self.walk_directory(arg),
      Ok(metadata) if metadata.is_file() => self.push_file(arg),
      Ok(_) => trace!("Skipping: {} (not a regular file)", arg.display()),
      Err(_) if looks_like_glob(arg) => self.expand_glob(arg),
      Err(e) => self.push_error(arg, anyhow!(e).context(format!("Failed to access path: {}", arg.display()))),
    }
  }

  /// Walks a directory recursively and adds every regular file found.
  ///
  /// The skip-list only applies below `dir`, so naming a skipped directory
  /// explicitly still processes it.
  pub fn walk_directory(&mut self, dir: &Path) {
    debug!("Scanning directory: {}", dir.display());
    let start_time = std::time::Instant::now();
    let before = self.targets.len();

    let walker = WalkDir::new(dir)
      .follow_links(false)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
      match entry {
        Ok(entry) if entry.file_type().is_file() => self.push_file(entry.path()),
        Ok(entry) => {
          if entry.file_type().is_symlink() {
            trace!("Skipping: {} (symlink)", entry.path().display());
          }
        }
        Err(e) => {
          let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
          self.push_error(&path, anyhow!(e).context(format!("Failed to walk: {}", path.display())));
        }
      }
    }

    debug!(
      "Found {} files in {}ms",
      self.targets.len() - before,
      start_time.elapsed().as_millis()
    );
  }

  fn expand_glob(&mut self, pattern: &Path) {
    let source = pattern.to_string_lossy();
    let entries = match glob::glob(&source).with_context(|| format!("Invalid glob pattern: {}", source)) {
      Ok(entries) => entries,
      Err(e) => {
        self.push_error(pattern, e);
        return;
      }
    };

    for entry in entries {
      match entry {
        Ok(path) => match std::fs::symlink_metadata(&path) {
          Ok(metadata) if metadata.is_dir() => self.walk_directory(&path),
          Ok(metadata) if metadata.is_file() => self.push_file(&path),
          _ => trace!("Skipping: {} (not a regular file)", path.display()),
        },
        Err(e) => {
          let path = e.path().to_path_buf();
          self.push_error(&path, anyhow!(e).context(format!("Failed to expand glob: {}", source)));
        }
      }
    }
  }

  fn push_file(&mut self, path: &Path) {
    let abs = match absolutize_path(path) {
      Ok(abs) => abs,
      Err(e) => return self.push_error(path, e),
    };
    if self.seen.insert(abs.clone()) {
      self.targets.push(Target::File(abs));
    }
  }

  fn push_error(&mut self, path: &Path, error: anyhow::Error) {
    self.targets.push(Target::Unreadable {
      path: path.to_path_buf(),
      error,
    });
  }
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
  entry.file_type().is_dir() && entry.file_name().to_str().is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn looks_like_glob(path: &Path) -> bool {
  path.to_string_lossy().contains(['*', '?', '['])
}

/// Converts a potentially relative path to an absolute, lexically normalized
/// path.
///
/// # Parameters
///
/// * `path` - The path to absolutize
///
/// # Returns
///
/// The absolute path.
pub fn absolutize_path(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    Ok(normalize_lexically(path))
  } else {
    let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
    Ok(normalize_lexically(&current_dir.join(path)))
  }
}

/// Resolves `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push(component.as_os_str());
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

/// Normalizes a path to be relative to a given directory.
///
/// # Parameters
///
/// * `path` - The path to normalize
/// * `base` - The directory to make the path relative to
///
/// # Returns
///
/// The normalized relative path.
pub fn normalize_relative_path(path: &Path, base: &Path) -> PathBuf {
  if path.is_absolute() {
    if let Ok(stripped) = path.strip_prefix(base) {
      return stripped.to_path_buf();
    }

    if let Some(rel_path) = pathdiff::diff_paths(path, base) {
      return rel_path;
    }
  }

  let mut normalized = PathBuf::new();
  for component in path.components() {
    if matches!(component, Component::CurDir) {
      continue;
    }
    normalized.push(component.as_os_str());
  }

  if normalized.as_os_str().is_empty() {
    PathBuf::from(".")
  } else {
    normalized
  }
}

/// Renders a relative path with forward slashes, the form include and exclude
/// patterns are written against.
pub fn to_slash_path(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  fn collected_files(targets: &[Target]) -> Vec<PathBuf> {
    targets
      .iter()
      .filter_map(|target| match target {
        Target::File(path) => Some(path.clone()),
        Target::Unreadable { .. } => None,
      })
      .collect()
  }

  #[test]
  fn test_normalize_lexically() {
    assert_eq!(normalize_lexically(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize_lexically(Path::new("/a/./b")), PathBuf::from("/a/b"));
    assert_eq!(normalize_lexically(Path::new("../a")), PathBuf::from("../a"));
  }

  #[test]
  fn test_absolutize_path_already_absolute() {
    let path = PathBuf::from("/absolute/path");
    let result = absolutize_path(&path).expect("absolute path");
    assert_eq!(result, path);
  }

  #[test]
  fn test_normalize_relative_path() {
    let root = Path::new("/workspace/project");
    assert_eq!(
      normalize_relative_path(Path::new("/workspace/project/src/main.rs"), root),
      PathBuf::from("src/main.rs")
    );
    assert_eq!(
      normalize_relative_path(Path::new("/workspace/other/x.rs"), root),
      PathBuf::from("../other/x.rs")
    );
    assert_eq!(normalize_relative_path(Path::new("./src/lib.rs"), root), PathBuf::from("src/lib.rs"));
  }

  #[test]
  fn test_walk_skips_vcs_and_vendor_dirs() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let root = temp_dir.path();
    for dir in ["src", ".git", "vendor/lib", "node_modules/pkg", ".idea", ".vscode"] {
      fs::create_dir_all(root.join(dir)).expect("create dir");
    }
    fs::write(root.join("src/main.go"), "package main\n").expect("write");
    fs::write(root.join(".git/config"), "").expect("write");
    fs::write(root.join("vendor/lib/a.go"), "package lib\n").expect("write");
    fs::write(root.join("node_modules/pkg/index.js"), "").expect("write");
    fs::write(root.join(".idea/workspace.xml"), "").expect("write");
    fs::write(root.join(".vscode/settings.json"), "").expect("write");

    let files = collected_files(&FileCollector::collect(&[root.to_path_buf()]));
    assert_eq!(files, vec![root.join("src/main.go")]);
  }

  #[test]
  fn test_explicit_skipped_dir_is_walked() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let vendor = temp_dir.path().join("vendor");
    fs::create_dir_all(&vendor).expect("create dir");
    fs::write(vendor.join("a.go"), "package a\n").expect("write");

    let files = collected_files(&FileCollector::collect(&[vendor.clone()]));
    assert_eq!(files, vec![vendor.join("a.go")]);
  }

  #[test]
  fn test_overlapping_arguments_are_deduplicated() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src")).expect("create dir");
    fs::write(root.join("src/a.rs"), "fn a() {}\n").expect("write");

    let files = collected_files(&FileCollector::collect(&[root.join("src"), root.join("src/a.rs")]));
    assert_eq!(files.len(), 1);
  }

  #[test]
  fn test_glob_expansion() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let root = temp_dir.path();
    fs::write(root.join("a.rs"), "").expect("write");
    fs::write(root.join("b.rs"), "").expect("write");
    fs::write(root.join("c.txt"), "").expect("write");

    let pattern = root.join("*.rs");
    let files = collected_files(&FileCollector::collect(&[pattern]));
    assert_eq!(files, vec![root.join("a.rs"), root.join("b.rs")]);
  }

  #[test]
  fn test_missing_path_is_reported() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let missing = temp_dir.path().join("does-not-exist.go");

    let targets = FileCollector::collect(&[missing.clone()]);
    assert_eq!(targets.len(), 1);
    assert!(matches!(&targets[0], Target::Unreadable { path, .. } if *path == missing));
  }

  #[cfg(unix)]
  #[test]
  fn test_symlinks_are_skipped() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let root = temp_dir.path();
    fs::write(root.join("real.go"), "package main\n").expect("write");
    std::os::unix::fs::symlink(root.join("real.go"), root.join("link.go")).expect("symlink");

    let files = collected_files(&FileCollector::collect(&[root.to_path_buf()]));
    assert_eq!(files, vec![root.join("real.go")]);
  }
}
