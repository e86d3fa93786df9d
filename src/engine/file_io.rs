//! # File I/O Module
//!
//! This module provides file reading and writing utilities for the engine.
//! It encapsulates synchronous file operations.

use std::path::Path;

use anyhow::{Context, Result};

/// File I/O operations for the engine.
///
/// This struct provides static methods for reading and writing files.
pub struct FileIO;

impl FileIO {
  /// Reads the complete file content as raw bytes.
  ///
  /// UTF-8 validation is left to the caller so that non-UTF-8 files can be
  /// reported instead of failing the read.
  pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
  }

  /// Writes file content, replacing the whole file.
  ///
  /// # Parameters
  ///
  /// * `path` - Path to the file to write
  /// * `content` - Content to write to the file
  pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
  }
}
