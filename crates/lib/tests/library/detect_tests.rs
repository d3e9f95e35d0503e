//! Detection through the public API: custom rules and ranking.

use std::path::Path;

use anvil_lib::build::{BuildPlan, BuildStep, Detector, NativeAction, Rule};
use tempfile::TempDir;

fn just_rule() -> Rule {
  Rule {
    name: "just",
    matches: |src| src.join("justfile").is_file(),
    plan: |_| Some(BuildPlan::new("just", vec![BuildStep::shell("just install --prefix {PREFIX}")])),
  }
}

fn tree(files: &[&str]) -> TempDir {
  let temp = TempDir::new().unwrap();
  for file in files {
    let path = temp.path().join(file);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "").unwrap();
  }
  temp
}

#[test]
fn custom_rule_runs_before_fallback() {
  let src = tree(&["justfile"]);
  let detector = Detector::new().with_rule(just_rule());

  let plan = detector.detect(src.path(), Path::new("/opt/x"));

  assert_eq!(plan.detected, "just");
  assert_eq!(detector.rule_names().last(), Some(&"copy"));
}

#[test]
fn built_in_rules_outrank_appended_ones() {
  let src = tree(&["justfile", "Cargo.toml", "src/main.rs"]);
  std::fs::write(src.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();

  let appended = Detector::new().with_rule(just_rule());
  assert_eq!(appended.detect(src.path(), Path::new("/opt/x")).detected, "cargo");

  let first = Detector::new().with_rule_at(0, just_rule());
  assert_eq!(first.detect(src.path(), Path::new("/opt/x")).detected, "just");
}

#[test]
fn unknown_tree_is_copied() {
  let src = tree(&["notes.txt"]);

  let plan = Detector::new().detect(src.path(), Path::new("/opt/x"));

  assert_eq!(plan.steps, vec![BuildStep::Native(NativeAction::CopyAll)]);
}
