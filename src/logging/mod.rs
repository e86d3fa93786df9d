//! # Logging Module
//!
//! This module provides logging utilities for headercheck, including:
//! - Verbose logging that can be enabled/disabled
//! - Standard info logging with color support
//! - Installation of the `tracing` subscriber used for debug output
//!
//! Verbose and tracing output go to stderr, info logs go to stdout.
//!
//! ## Example
//!
//! ```rust
//! use headercheck::logging::{ColorMode, set_verbose};
//! use headercheck::{info_log, verbose_log};
//!
//! set_verbose();
//! ColorMode::Auto.apply();
//!
//! verbose_log!("Processing file: {}", "main.go");
//! info_log!("Header inserted: {}", "main.go");
//! ```

mod modes;

pub use modes::{ColorMode, init_tracing, is_quiet, is_verbose, set_quiet, set_verbose};
use owo_colors::{OwoColorize, Stream};

/// Logs a message to stderr if verbose mode is enabled.
///
/// Uses the same format string syntax as [`eprintln!`].
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)*) => {
        if $crate::logging::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

/// Logs a message to stdout unless quiet mode is enabled.
///
/// Uses the same format string syntax as [`println!`].
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        if !$crate::logging::is_quiet() {
            $crate::logging::print_info_log(&format!($($arg)*));
        }
    };
}

/// Prints an info message in yellow when colors are enabled.
pub fn print_info_log(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |m| m.yellow()));
}
