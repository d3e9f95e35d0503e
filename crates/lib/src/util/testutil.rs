//! Test helpers shared across anvil-lib unit tests.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::build::{SystemPackages, Toolchain};
use crate::execute::ExecuteError;

/// Toolchain that only knows the programs it was given.
#[derive(Debug, Clone, Default)]
pub struct FakeToolchain {
  programs: BTreeSet<String>,
}

impl FakeToolchain {
  pub fn with(programs: &[&str]) -> Self {
    Self {
      programs: programs.iter().map(|p| p.to_string()).collect(),
    }
  }
}

impl Toolchain for FakeToolchain {
  fn find(&self, program: &str) -> Option<PathBuf> {
    self
      .programs
      .contains(program)
      .then(|| PathBuf::from("/usr/bin").join(program))
  }
}

/// Records install requests instead of running a package manager.
#[derive(Debug, Clone, Default)]
pub struct RecordingPackages {
  calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl RecordingPackages {
  pub fn installed(&self) -> Vec<Vec<String>> {
    self.calls.borrow().clone()
  }
}

impl SystemPackages for RecordingPackages {
  fn install(&self, packages: &[String]) -> Result<(), ExecuteError> {
    self.calls.borrow_mut().push(packages.to_vec());
    Ok(())
  }
}

/// Write `(relative path, content)` pairs under `root`, creating parents.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
  for (relative, content) in files {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }
}

/// Write an executable file at `path`.
#[cfg(unix)]
pub fn write_executable(path: &Path, content: &str) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
  crate::fs::set_executable(path).unwrap();
}
