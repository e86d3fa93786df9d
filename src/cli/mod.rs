//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing.

mod check;

pub use check::{CheckArgs, CheckStatus, run_check};
use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # Check headers using .header.txt or the discovered config file
  headercheck

  # Insert or replace headers in place
  headercheck --fix src/ cmd/

  # Use specific templates for Go files only
  headercheck --template .header.txt,.header-gen.txt --include '\\.go$' .

  # Refresh stale dates only in files changed since main
  headercheck --fix --reference main

  # Preview the changes a fix would make
  headercheck --show-diff --save-diff headers.diff

  # Write a JSON report of every visited file
  headercheck --report-json headers.json
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(flatten)]
  pub check_args: CheckArgs,
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
