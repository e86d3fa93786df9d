//! # headercheck
//!
//! A tool that keeps the leading header of source files in line with one or
//! more templates.
//!
//! `headercheck` finds the existing header block of each file (looking past
//! shebangs and top-of-file directives such as `//go:build`), compares it with
//! the rendered templates and either reports the file or rewrites it in place.
//! Headers that only differ in dates, emails, hashes or years are recognized as
//! the same header, so stale values are refreshed without duplicating blocks.
//!
//! ## Features
//!
//! * Template placeholders `%author%`, `%creation_date%` and `%last_update_date%` filled from git history
//! * Per-template include/exclude regular expressions, first matching template wins
//! * Check mode with lint-style output and distinct exit codes, fix mode that writes in place
//! * Stale values are left alone in files without local changes (or changes since `--reference`)
//! * Diff previews and JSON/CSV reports
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use headercheck::engine::{Engine, EngineOptions, Mode};
//! use headercheck::git::{GitOptions, metadata_provider};
//! use headercheck::templates::{TemplateDef, TemplateSet};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let root = Path::new(".");
//!     let templates = TemplateSet::load(&[TemplateDef::new(root.join(".header.txt"))])?;
//!     let git = metadata_provider(root, &GitOptions { enabled: true, reference: None })?;
//!
//!     let engine = Engine::new(EngineOptions::new(root, templates, git))?;
//!     let diagnosis = engine.diagnose(Path::new("main.go"), b"package main\n");
//!
//!     if let Some(fixed) = diagnosis.fixed {
//!         println!("{}", fixed);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`engine`] - Header location, matching, rewriting and the per-file decision policy
//! * [`templates`] - Template loading, path filtering and rendering
//! * [`git`] - Author and date metadata from git history
//! * [`config`] - Config file discovery and template resolution
//! * [`logging`] - Logging utilities for verbose output
//!
//! [`engine`]: crate::engine
//! [`templates`]: crate::templates
//! [`git`]: crate::git
//! [`config`]: crate::config
//! [`logging`]: crate::logging

pub mod cli;
pub mod config;
pub mod diff;
pub mod engine;
pub mod git;
pub mod logging;
pub mod output;
pub mod report;
pub mod templates;
