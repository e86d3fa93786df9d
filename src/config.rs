//! # Configuration Module
//!
//! This module provides configuration support for headercheck, deciding which
//! header templates are used and which files each one targets.
//!
//! Configuration can be specified in a `.headercheck.yaml` file (or one of the
//! other names in [`CONFIG_FILENAMES`]), via the `--config` flag, or via the
//! `HEADERCHECK_CONFIG` environment variable. YAML and TOML are both
//! accepted; the format is chosen by file extension.
//!
//! ```yaml
//! include: '\.go$'
//! templates:
//!   - .header.txt
//!   - path: .header-scripts.txt
//!     include: '\.(sh|py)$'
//!     exclude: '^vendor/'
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::templates::TemplateDef;
use crate::verbose_log;

/// Config file names looked up in the root, in order.
pub const CONFIG_FILENAMES: [&str; 5] = [
  ".headercheck.yaml",
  ".headercheck.yml",
  "headercheck.yaml",
  "headercheck.yml",
  ".headercheck.toml",
];

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "HEADERCHECK_CONFIG";

/// Template used when nothing else is configured, relative to the root.
pub const DEFAULT_TEMPLATE: &str = ".header.txt";

/// A `templates` entry: either a bare path or a path with its own patterns.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TemplateEntry {
  /// Path only; the global patterns apply
  Path(String),
  /// Path with optional patterns overriding the global ones
  Detailed {
    path: String,
    #[serde(default)]
    include: Option<String>,
    #[serde(default)]
    exclude: Option<String>,
  },
}

impl TemplateEntry {
  fn parts(&self) -> (&str, Option<&str>, Option<&str>) {
    match self {
      TemplateEntry::Path(path) => (path, None, None),
      TemplateEntry::Detailed { path, include, exclude } => (path, include.as_deref(), exclude.as_deref()),
    }
  }
}

/// Main configuration struct for headercheck.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
  /// Template entries, in priority order.
  #[serde(default)]
  pub templates: Vec<TemplateEntry>,

  /// Include pattern for entries that do not set one.
  #[serde(default)]
  pub include: Option<String>,

  /// Exclude pattern for entries that do not set one.
  #[serde(default)]
  pub exclude: Option<String>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid YAML.
  #[error("Failed to parse config file '{path}': {source}")]
  YamlError { path: PathBuf, source: serde_yaml::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  TomlError { path: PathBuf, source: toml::de::Error },

  /// An explicitly requested config file does not exist.
  #[error("Config file not found: {path}")]
  NotFound { path: PathBuf },
}

impl Config {
  /// Load configuration from a file.
  ///
  /// Files ending in `.toml` are parsed as TOML, everything else as YAML. An
  /// empty file yields the default configuration.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;
    Self::parse(path, &content)
  }

  /// Parses configuration text, choosing the format from `path`'s extension.
  pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
    if content.trim().is_empty() {
      return Ok(Self::default());
    }

    let is_toml = path
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config: Self = if is_toml {
      toml::from_str(content).map_err(|e| ConfigError::TomlError {
        path: path.to_path_buf(),
        source: e,
      })?
    } else {
      serde_yaml::from_str(content).map_err(|e| ConfigError::YamlError {
        path: path.to_path_buf(),
        source: e,
      })?
    };

    verbose_log!("Loaded {} template entries", config.templates.len());
    Ok(config)
  }

  /// Resolves the entries into template definitions.
  ///
  /// Relative template paths are joined to `root`. Entries with a blank path
  /// are dropped. When no entry remains, `<root>/.header.txt` is used.
  pub fn template_defs(&self, root: &Path) -> Vec<TemplateDef> {
    let global_include = non_blank(self.include.as_deref());
    let global_exclude = non_blank(self.exclude.as_deref());

    let defs: Vec<TemplateDef> = self
      .templates
      .iter()
      .map(TemplateEntry::parts)
      .filter(|(path, _, _)| !path.trim().is_empty())
      .map(|(path, include, exclude)| TemplateDef {
        path: resolve_path(root, Path::new(path)),
        include: non_blank(include).or(global_include).map(str::to_string),
        exclude: non_blank(exclude).or(global_exclude).map(str::to_string),
      })
      .collect();

    if defs.is_empty() {
      return vec![TemplateDef {
        path: root.join(DEFAULT_TEMPLATE),
        include: global_include.map(str::to_string),
        exclude: global_exclude.map(str::to_string),
      }];
    }
    defs
  }
}

/// Templates given on the command line, with the patterns that apply to them.
#[derive(Debug, Clone, Default)]
pub struct CliTemplates {
  /// Template paths, relative to the root unless absolute
  pub paths: Vec<PathBuf>,
  /// Include pattern for these templates
  pub include: Option<String>,
  /// Exclude pattern for these templates
  pub exclude: Option<String>,
}

impl CliTemplates {
  fn defs(&self, root: &Path) -> impl Iterator<Item = TemplateDef> + '_ {
    let root = root.to_path_buf();
    self.paths.iter().map(move |path| TemplateDef {
      path: resolve_path(&root, path),
      include: non_blank(self.include.as_deref()).map(str::to_string),
      exclude: non_blank(self.exclude.as_deref()).map(str::to_string),
    })
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `HEADERCHECK_CONFIG` environment variable
/// 2. The first of [`CONFIG_FILENAMES`] present in the root
///
/// # Returns
///
/// The path to the configuration file, or `None` if no config file is found.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
    && !env_path.trim().is_empty()
  {
    let path = resolve_path(root, Path::new(&env_path));
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let found = CONFIG_FILENAMES
    .iter()
    .map(|name| root.join(name))
    .find(|candidate| candidate.is_file());

  match &found {
    Some(path) => verbose_log!("Using workspace config: {}", path.display()),
    None => verbose_log!("No config file found"),
  }
  found
}

/// Resolves the ordered template definitions for a run.
///
/// - Explicit config files are all loaded, in order, and must exist.
/// - Otherwise a discovered config file is used, unless `no_config` is set.
/// - Templates given on the command line are appended last.
/// - Without any config file and without command line templates,
///   `<root>/.header.txt` is used.
///
/// # Errors
///
/// Returns an error if an explicit config file is missing or any config file
/// cannot be read or parsed.
pub fn resolve_template_defs(
  root: &Path,
  explicit_configs: &[PathBuf],
  no_config: bool,
  cli: &CliTemplates,
) -> Result<Vec<TemplateDef>, ConfigError> {
  let mut defs = Vec::new();

  if !explicit_configs.is_empty() {
    for config_path in explicit_configs {
      let path = resolve_path(root, config_path);
      if !path.is_file() {
        return Err(ConfigError::NotFound { path });
      }
      defs.extend(Config::load(&path)?.template_defs(root));
    }
  } else if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
  } else if let Some(path) = discover_config_path(root) {
    defs.extend(Config::load(&path)?.template_defs(root));
  }

  if defs.is_empty() && cli.paths.is_empty() {
    defs.push(TemplateDef::new(root.join(DEFAULT_TEMPLATE)));
  }
  defs.extend(cli.defs(root));

  Ok(defs)
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.trim().is_empty())
}
