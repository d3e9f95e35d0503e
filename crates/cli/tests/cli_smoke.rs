//! CLI smoke tests for anvil.
//!
//! Every command should parse, run against an empty root and exit cleanly.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

/// Command isolated in `temp`, with no reachable registry.
fn anvil_cmd(temp: &TempDir) -> Command {
  let mut cmd: Command = cargo_bin_cmd!("anvil");
  cmd.env("ANVIL_ROOT", temp.path().join("anvil"));
  cmd.env("ANVIL_INDEX_URL", temp.path().join("no-registry"));
  cmd.env("ANVIL_AUTO_SUBMIT", "0");
  cmd.env("HOME", temp.path());
  cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  cargo_bin_cmd!("anvil")
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("forge"))
    .stdout(predicate::str::contains("housekeeping"));
}

#[test]
fn version_flag_works() {
  cargo_bin_cmd!("anvil")
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("anvil"));
}

#[test]
fn subcommand_help_works() {
  for sub in ["forge", "submit", "search", "uninstall", "update", "list", "housekeeping", "index"] {
    cargo_bin_cmd!("anvil").args([sub, "--help"]).assert().success();
  }
}

#[test]
fn unknown_subcommand_fails() {
  cargo_bin_cmd!("anvil").arg("smelt").assert().failure();
}

#[test]
fn forge_rejects_bad_runtime() {
  cargo_bin_cmd!("anvil")
    .args(["forge", "x", "--msvc-runtime", "MX"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("expected MD or MT"));
}

// =============================================================================
// Empty root
// =============================================================================

#[test]
#[serial]
fn list_on_empty_root() {
  let temp = TempDir::new().unwrap();
  anvil_cmd(&temp)
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("No packages installed"));
}

#[test]
#[serial]
fn list_json_on_empty_root() {
  let temp = TempDir::new().unwrap();
  anvil_cmd(&temp)
    .args(["list", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("[]"));
}

#[test]
#[serial]
fn first_run_creates_layout() {
  let temp = TempDir::new().unwrap();
  anvil_cmd(&temp).arg("list").assert().success();

  let root = temp.path().join("anvil");
  for dir in ["index", "build", "opt", "bin"] {
    assert!(root.join(dir).is_dir(), "{dir} should exist");
  }
  assert!(root.join("index/index.db").is_file());
}

#[test]
#[serial]
fn index_repair_without_registry_fails() {
  let temp = TempDir::new().unwrap();
  anvil_cmd(&temp)
    .args(["index", "repair"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Index repair failed"));
}
