//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated anvil root with an unreachable registry.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// A source directory holding only an `anvil.json` with `steps`.
  pub fn manifest_project(&self, name: &str, steps: &[&str]) -> PathBuf {
    let manifest = serde_json::json!({ "name": name, "build": { "common": steps } });
    let path = self.write_file(&format!("src/{}/anvil.json", name), &manifest.to_string());
    path.parent().unwrap().to_path_buf()
  }

  pub fn root_path(&self) -> PathBuf {
    let p = self.temp.path().join("anvil");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn bin_path(&self) -> PathBuf {
    self.root_path().join("bin")
  }

  /// A committed git repository to serve as the registry.
  pub fn git_registry(&self) -> PathBuf {
    let repo = self.temp.path().join("registry");
    self.write_file("registry/packages.txt", "anvil-core\n");
    for args in [
      &["init", "-q"][..],
      &["add", "packages.txt"][..],
      &["commit", "-q", "-m", "seed"][..],
    ] {
      let status = std::process::Command::new("git")
        .args(["-c", "user.name=anvil", "-c", "user.email=anvil@example.com"])
        .args(args)
        .current_dir(&repo)
        .status()
        .unwrap();
      assert!(status.success(), "git {args:?} failed");
    }
    repo
  }

  /// Get a pre-configured Command for the anvil binary.
  ///
  /// - `ANVIL_ROOT`: isolated root
  /// - `ANVIL_INDEX_URL`: a path that does not exist, so the index stays local
  /// - `ANVIL_AUTO_SUBMIT`: off, so forges leave the index alone
  /// - `HOME`/`USERPROFILE`: the temp directory
  pub fn anvil_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("anvil");
    cmd.env("ANVIL_ROOT", self.root_path());
    cmd.env("ANVIL_INDEX_URL", self.temp.path().join("no-registry"));
    cmd.env("ANVIL_AUTO_SUBMIT", "0");
    cmd.env("ANVIL_LOG", "warn");
    cmd.env("HOME", self.temp.path());
    cmd.env("USERPROFILE", self.temp.path());
    cmd.env_remove("ANVIL_MSVC_RUNTIME");
    cmd.env_remove("ANVIL_FORCE_PIC");
    cmd
  }
}
