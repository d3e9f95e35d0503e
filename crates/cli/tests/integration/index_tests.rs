use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn search_finds_seed_package() {
  let env = TestEnv::new();

  env
    .anvil_cmd()
    .args(["search", "anvil"])
    .assert()
    .success()
    .stdout(predicate::str::contains("anvil-core"));
}

#[test]
fn search_json_output_is_valid() {
  let env = TestEnv::new();

  let out = env.anvil_cmd().args(["search", "core", "-o", "json"]).output().unwrap();

  assert!(out.status.success());
  let hits: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(hits[0]["name"], "anvil-core");
}

#[test]
fn submit_adds_to_local_index() {
  let env = TestEnv::new();

  env
    .anvil_cmd()
    .args(["submit", "https://github.com/someone/widget.git"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Added widget"))
    .stdout(predicate::str::contains("submissions%2Fwidget.json"));

  env
    .anvil_cmd()
    .args(["submit", "git@github.com:someone/widget"])
    .assert()
    .success()
    .stdout(predicate::str::contains("already indexed"));

  env
    .anvil_cmd()
    .args(["search", "widget"])
    .assert()
    .success()
    .stdout(predicate::str::contains("User added"));
}

#[test]
fn index_check_reports_missing_checkout() {
  let env = TestEnv::new();

  env
    .anvil_cmd()
    .args(["index", "check", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("missing_checkout"));
}

#[test]
fn update_without_checkout_is_a_no_op() {
  let env = TestEnv::new();

  env
    .anvil_cmd()
    .arg("update")
    .assert()
    .success()
    .stdout(predicate::str::contains("nothing to update"));
}

#[test]
fn first_run_clones_registry() {
  let env = TestEnv::new();
  let registry = env.git_registry();

  let out = env
    .anvil_cmd()
    .env("ANVIL_INDEX_URL", &registry)
    .args(["index", "check", "-o", "json"])
    .output()
    .unwrap();

  assert!(out.status.success());
  let health: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(health["issues"], serde_json::json!([]));
  assert!(env.root_path().join("index/.git").is_dir());

  env
    .anvil_cmd()
    .env("ANVIL_INDEX_URL", &registry)
    .arg("update")
    .assert()
    .success()
    .stdout(predicate::str::contains("Index updated"));
}
