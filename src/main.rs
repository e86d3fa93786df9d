//! # headercheck
//!
//! Checks and fixes source file headers against templates.

use std::process::ExitCode;

use headercheck::cli::{Cli, CheckStatus, run_check};

fn main() -> ExitCode {
  let cli = Cli::parse_args();

  match run_check(cli.check_args) {
    Ok(status) => status.into(),
    Err(e) => {
      eprintln!("ERROR: {e:#}");
      CheckStatus::Error.into()
    }
  }
}
