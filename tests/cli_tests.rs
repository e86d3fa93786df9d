mod common;

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

const HEADER: &str = "// Copyright %author%\n// SPDX-License-Identifier: MIT\n";

// Workspace with a default template, one file missing its header and one
// conforming file.
fn setup_workspace() -> Result<TempDir> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();

  fs::write(root.join(".header.txt"), HEADER)?;
  fs::create_dir_all(root.join("cmd"))?;
  fs::write(root.join("cmd/main.go"), "package main\n")?;
  fs::write(
    root.join("ok.go"),
    "// Copyright unknown\n// SPDX-License-Identifier: MIT\n\npackage ok\n",
  )?;

  Ok(temp_dir)
}

fn headercheck(dir: &Path) -> Result<Command> {
  let mut cmd = Command::cargo_bin("headercheck")?;
  cmd.current_dir(dir).arg("--no-git").arg("--colors=never");
  Ok(cmd)
}

#[test]
fn test_check_reports_missing_header() -> Result<()> {
  let temp_dir = setup_workspace()?;

  headercheck(temp_dir.path())?
    .assert()
    .code(1)
    .stdout(predicate::str::contains(
      "cmd/main.go:1: missing or incorrect header (insert)",
    ))
    .stdout(predicate::str::contains("ok.go:1:").not())
    .stdout(predicate::str::contains("Run with --fix"));

  assert_eq!(fs::read_to_string(temp_dir.path().join("cmd/main.go"))?, "package main\n");

  Ok(())
}

#[test]
fn test_fix_then_check_is_clean() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let root = temp_dir.path();

  headercheck(root)?
    .arg("--fix")
    .assert()
    .code(0)
    .stdout(predicate::str::contains("Inserted header in 1 file"));

  assert_eq!(
    fs::read_to_string(root.join("cmd/main.go"))?,
    "// Copyright unknown\n// SPDX-License-Identifier: MIT\n\npackage main\n"
  );

  headercheck(root)?
    .assert()
    .code(0)
    .stdout(predicate::str::contains("All files have correct headers."));

  Ok(())
}

#[test]
fn test_quiet_check_prints_only_findings() -> Result<()> {
  let temp_dir = setup_workspace()?;

  headercheck(temp_dir.path())?
    .arg("-q")
    .assert()
    .code(1)
    .stdout("cmd/main.go:1: missing or incorrect header (insert)\n");

  Ok(())
}

#[test]
fn test_explicit_paths_limit_processing() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let root = temp_dir.path();

  headercheck(root)?.args(["--fix", "ok.go"]).assert().code(0);
  assert_eq!(fs::read_to_string(root.join("cmd/main.go"))?, "package main\n");

  Ok(())
}

#[test]
fn test_missing_template_is_an_error() -> Result<()> {
  let temp_dir = setup_workspace()?;
  fs::remove_file(temp_dir.path().join(".header.txt"))?;

  headercheck(temp_dir.path())?
    .assert()
    .code(2)
    .stderr(predicate::str::contains("ERROR:"))
    .stderr(predicate::str::contains(".header.txt"));

  Ok(())
}

#[test]
fn test_invalid_include_pattern_is_an_error() -> Result<()> {
  let temp_dir = setup_workspace()?;

  headercheck(temp_dir.path())?
    .args(["--template", ".header.txt", "--include", "(unclosed"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("Invalid include pattern"));

  Ok(())
}

#[test]
fn test_missing_explicit_config_is_an_error() -> Result<()> {
  let temp_dir = setup_workspace()?;

  headercheck(temp_dir.path())?
    .args(["--config", "missing.yaml"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("Config file not found"));

  Ok(())
}

#[test]
fn test_yaml_config_selects_templates() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let root = temp_dir.path();
  fs::write(root.join("scripts.txt"), "# Script header\n")?;
  fs::write(root.join("build.sh"), "#!/bin/sh\necho build\n")?;
  fs::write(
    root.join(".headercheck.yaml"),
    concat!(
      "templates:\n",
      "  - path: scripts.txt\n",
      "    include: '\\.sh$'\n",
      "  - path: .header.txt\n",
      "    include: '\\.go$'\n",
    ),
  )?;

  headercheck(root)?.arg("--fix").assert().code(0);

  assert_eq!(
    fs::read_to_string(root.join("build.sh"))?,
    "#!/bin/sh\n\n# Script header\n\necho build\n"
  );
  assert!(fs::read_to_string(root.join("cmd/main.go"))?.starts_with("// Copyright unknown\n"));

  Ok(())
}

#[test]
fn test_cli_templates_replace_default() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let root = temp_dir.path();
  fs::write(root.join("short.txt"), "// Short header\n")?;

  headercheck(root)?
    .args(["--fix", "--template", "short.txt", "--exclude", "^ok\\.go$"])
    .assert()
    .code(0);

  assert_eq!(
    fs::read_to_string(root.join("cmd/main.go"))?,
    "// Short header\n\npackage main\n"
  );
  assert!(fs::read_to_string(root.join("ok.go"))?.starts_with("// Copyright unknown\n"));

  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let root = temp_dir.path();
  let report_path = root.join("report.json");

  headercheck(root)?
    .arg("--report-json")
    .arg(&report_path)
    .assert()
    .code(1);

  let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
  assert_eq!(report["summary"]["mode"], "check");
  assert_eq!(report["summary"]["headers_inserted"], 1);

  let files = report["files"].as_array().expect("files array");
  assert!(
    files
      .iter()
      .any(|f| f["path"] == "cmd/main.go" && f["action"] == "insert")
  );

  Ok(())
}

#[test]
fn test_save_diff() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let root = temp_dir.path();
  let diff_path = root.join("changes.diff");

  headercheck(root)?
    .arg("--save-diff")
    .arg(&diff_path)
    .arg("cmd")
    .assert()
    .code(1);

  let diff = fs::read_to_string(&diff_path)?;
  assert!(diff.contains("Diff for cmd/main.go:"));
  assert!(diff.contains("+// Copyright unknown\n"));
  assert!(diff.contains(" package main\n"));

  Ok(())
}

#[test]
fn test_colors_never_has_no_ansi_codes() -> Result<()> {
  let temp_dir = setup_workspace()?;

  let output = headercheck(temp_dir.path())?.arg("--fix").output()?;
  let stdout = String::from_utf8(output.stdout)?;
  assert!(!stdout.contains("\x1b["));

  Ok(())
}

#[cfg(unix)]
#[test]
fn test_fix_write_failure_exits_with_error() -> Result<()> {
  let temp_dir = setup_workspace()?;
  let root = temp_dir.path();
  let locked = root.join("cmd/main.go");
  fs::write(root.join("other.go"), "package other\n")?;

  if !common::make_read_only(&locked)? {
    println!("Skipping test: read-only files are writable for this user");
    return Ok(());
  }

  let assert = headercheck(root)?.arg("--fix").assert();
  common::make_writable(&locked)?;

  assert
    .code(2)
    .stderr(predicate::str::contains("cmd/main.go: Failed to write file"));
  assert_eq!(fs::read_to_string(&locked)?, "package main\n");
  assert!(fs::read_to_string(root.join("other.go"))?.starts_with("// Copyright unknown\n"));

  Ok(())
}
