use std::sync::atomic::{AtomicU8, Ordering};

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Global output mode.
///
/// This is initialized to [`OutputMode::Normal`] and changed via
/// [`set_verbose`] or [`set_quiet`].
static OUTPUT_MODE: AtomicU8 = AtomicU8::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
  Normal = 0,
  Quiet = 1,
  Verbose = 2,
}

impl OutputMode {
  const fn from_u8(value: u8) -> Self {
    match value {
      1 => OutputMode::Quiet,
      2 => OutputMode::Verbose,
      _ => OutputMode::Normal,
    }
  }

  fn current() -> Self {
    Self::from_u8(OUTPUT_MODE.load(Ordering::SeqCst))
  }
}

/// Enum representing the color mode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
  /// Automatically determine whether to use colors based on TTY detection
  #[default]
  Auto,
  /// Never use colors
  Never,
  /// Always use colors
  Always,
}

impl ColorMode {
  /// Applies the mode to all owo-colors output in the process.
  ///
  /// `Auto` leaves the decision to owo-colors' stream detection.
  pub fn apply(self) {
    match self {
      ColorMode::Auto => owo_colors::unset_override(),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Always => owo_colors::set_override(true),
    }
  }
}

/// Enables verbose output.
///
/// When verbose logging is enabled, the [`verbose_log!`] macro will output
/// messages to stderr.
///
/// [`verbose_log!`]: crate::verbose_log
pub fn set_verbose() {
  OUTPUT_MODE.store(OutputMode::Verbose as u8, Ordering::SeqCst);
}

/// Suppresses informational output.
pub fn set_quiet() {
  OUTPUT_MODE.store(OutputMode::Quiet as u8, Ordering::SeqCst);
}

/// Checks if verbose logging is currently enabled.
pub fn is_verbose() -> bool {
  OutputMode::current() == OutputMode::Verbose
}

/// Checks if quiet mode is currently enabled.
pub fn is_quiet() -> bool {
  OutputMode::current() == OutputMode::Quiet
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence. Otherwise the level follows the `-v` count:
/// warnings by default, then `info`, `debug` and `trace` for one, two and
/// three or more. Quiet mode keeps only errors.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing(quiet: bool, verbosity: u8) {
  let default_level = match (quiet, verbosity) {
    (true, _) => "error",
    (false, 0) => "warn",
    (false, 1) => "info",
    (false, 2) => "debug",
    (false, _) => "trace",
  };

  let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  let fmt_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_level(true)
    .compact();

  // Fails only if a subscriber is already installed.
  let _ = tracing_subscriber::registry()
    .with(filter_layer)
    .with(fmt_layer)
    .try_init();
}
