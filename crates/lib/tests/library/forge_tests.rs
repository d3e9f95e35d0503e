//! Forge pipeline through the public API.

#![cfg(unix)]

use std::path::{Path, PathBuf};

use anvil_lib::build::{BuildPlan, BuildStep, Detector, Rule};
use anvil_lib::config::AnvilConfig;
use anvil_lib::forge::{Forge, ForgeOptions, ForgeOutcome};
use anvil_lib::release::NoReleases;
use tempfile::TempDir;

fn forge(temp: &TempDir) -> Forge<NoReleases> {
  let config = AnvilConfig::with_root(temp.path().join("anvil"))
    .with_index_repo_url(temp.path().join("no-registry").to_string_lossy())
    .with_auto_submit(false);
  Forge::open(config).unwrap().with_releases(NoReleases)
}

fn source(temp: &TempDir, name: &str, files: &[(&str, &str)]) -> PathBuf {
  let dir = temp.path().join("src").join(name);
  for (file, content) in files {
    let path = dir.join(file);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }
  dir
}

#[tokio::test]
async fn fallback_copies_tree_and_links_scripts() {
  let temp = TempDir::new().unwrap();
  let forge = forge(&temp);
  let src = source(&temp, "scripts", &[("bin/greet.sh", "#!/bin/sh\necho hi\n"), ("README", "docs")]);

  let report = forge
    .forge(src.to_str().unwrap(), &ForgeOptions::default())
    .await
    .unwrap();

  assert_eq!(
    report.outcome,
    ForgeOutcome::Built {
      detected: "copy".to_string(),
      steps: 1
    }
  );
  let prefix = forge.config().install_prefix("scripts");
  assert!(prefix.join("README").is_file());
  assert!(report.published.contains(&forge.config().bin_dir().join("greet.sh")));
}

#[tokio::test]
async fn custom_detector_drives_the_build() {
  let temp = TempDir::new().unwrap();
  let detector = Detector::new().with_rule_at(
    0,
    Rule {
      name: "marker",
      matches: |src: &Path| src.join("MARKER").exists(),
      plan: |_| {
        Some(
          BuildPlan::new(
            "marker",
            vec![BuildStep::shell(
              "mkdir -p {PREFIX}/bin && cp MARKER {PREFIX}/bin/marker && chmod +x {PREFIX}/bin/marker",
            )],
          )
          .with_binaries(["marker"]),
        )
      },
    },
  );
  let forge = forge(&temp).with_detector(detector);
  let src = source(&temp, "tagged", &[("MARKER", "#!/bin/sh\n")]);

  let report = forge
    .forge(src.to_str().unwrap(), &ForgeOptions::default())
    .await
    .unwrap();

  assert!(matches!(report.outcome, ForgeOutcome::Built { ref detected, .. } if detected == "marker"));
  assert!(forge.config().bin_dir().join("marker").exists());
  assert_eq!(forge.list().unwrap(), vec!["tagged".to_string()]);
}

#[tokio::test]
async fn refuses_to_forge_into_home() {
  let temp = TempDir::new().unwrap();
  let mut config = AnvilConfig::with_root(temp.path().join("anvil"))
    .with_index_repo_url(temp.path().join("no-registry").to_string_lossy())
    .with_auto_submit(false);
  // A package whose workspace would be the home directory itself.
  config.home = config.workspace("home");
  std::fs::create_dir_all(&config.home).unwrap();
  std::fs::write(config.home.join(".profile"), "keep").unwrap();
  let forge = Forge::open(config).unwrap().with_releases(NoReleases);
  let src = source(&temp, "home", &[("README", "x")]);

  let err = forge
    .forge(src.to_str().unwrap(), &ForgeOptions::default())
    .await
    .unwrap_err();

  assert!(matches!(err, anvil_lib::forge::ForgeError::Unclean { .. }));
  assert!(forge.config().home.join(".profile").exists());
}
