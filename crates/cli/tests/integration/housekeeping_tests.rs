use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn housekeeping_on_empty_root_succeeds() {
  let env = TestEnv::new();

  env
    .anvil_cmd()
    .arg("housekeeping")
    .assert()
    .success()
    .stdout(predicate::str::contains("Housekeeping complete"));
}

#[test]
fn housekeeping_clears_stale_workspaces() {
  let env = TestEnv::new();
  env.write_file("anvil/build/stale/obj.o", "0123456789");

  let out = env.anvil_cmd().args(["housekeeping", "-o", "json"]).output().unwrap();

  assert!(out.status.success());
  let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(report["stats"]["workspaces_removed"], 1);
  assert_eq!(report["stats"]["bytes_freed"], 10);
  assert!(env.root_path().join("build").is_dir());
  assert!(!env.root_path().join("build/stale").exists());
}
