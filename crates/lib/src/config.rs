//! Process-wide configuration.
//!
//! A single [`AnvilConfig`] is built at startup and handed to every component,
//! so nothing below the CLI reads ambient path state.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── index/          # registry checkout + index.db
//! ├── build/<name>/   # per-forge workspace (ephemeral)
//! ├── opt/<name>/     # install prefix
//! └── bin/            # published entry points
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::build::MsvcRuntime;
use crate::consts::{INDEX_DB_FILE, INDEX_REPO_URL};
use crate::platform::paths::{filesystem_root, home_dir, root_dir};

#[derive(Debug, Clone)]
pub struct AnvilConfig {
  pub root: PathBuf,
  pub home: PathBuf,
  /// Registry cloned into the index directory.
  pub index_repo_url: String,
  /// Register forged repositories in the local index when they are missing.
  pub auto_submit: bool,
  /// `ANVIL_MSVC_RUNTIME`, lowest-precedence runtime selection.
  pub msvc_runtime: Option<MsvcRuntime>,
  /// `ANVIL_FORCE_PIC`, lowest-precedence PIC request.
  pub force_pic: bool,
}

impl AnvilConfig {
  /// Build the configuration from the process environment.
  pub fn from_env() -> Self {
    let mut config = Self::with_root(root_dir());

    if let Ok(url) = std::env::var("ANVIL_INDEX_URL") {
      config.index_repo_url = url;
    }
    if let Ok(value) = std::env::var("ANVIL_AUTO_SUBMIT") {
      config.auto_submit = !matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "no");
    }
    config.msvc_runtime = std::env::var("ANVIL_MSVC_RUNTIME")
      .ok()
      .and_then(|v| MsvcRuntime::parse(&v));
    config.force_pic = std::env::var("ANVIL_FORCE_PIC")
      .map(|v| is_truthy(&v))
      .unwrap_or(false);

    config
  }

  /// Configuration rooted at `root` with default toggles.
  pub fn with_root(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      home: home_dir(),
      index_repo_url: INDEX_REPO_URL.to_string(),
      auto_submit: true,
      msvc_runtime: None,
      force_pic: false,
    }
  }

  pub fn with_index_repo_url(mut self, url: impl Into<String>) -> Self {
    self.index_repo_url = url.into();
    self
  }

  pub fn with_auto_submit(mut self, enabled: bool) -> Self {
    self.auto_submit = enabled;
    self
  }

  pub fn index_dir(&self) -> PathBuf {
    self.root.join("index")
  }

  pub fn index_db(&self) -> PathBuf {
    self.index_dir().join(INDEX_DB_FILE)
  }

  pub fn build_dir(&self) -> PathBuf {
    self.root.join("build")
  }

  pub fn install_dir(&self) -> PathBuf {
    self.root.join("opt")
  }

  pub fn bin_dir(&self) -> PathBuf {
    self.root.join("bin")
  }

  /// Scratch directory for one forge of `name`.
  pub fn workspace(&self, name: &str) -> PathBuf {
    self.build_dir().join(name)
  }

  /// Install prefix for `name`.
  pub fn install_prefix(&self, name: &str) -> PathBuf {
    self.install_dir().join(name)
  }

  /// Paths that must never be removed, in resolved form.
  pub fn protected_paths(&self) -> Vec<PathBuf> {
    [self.root.as_path(), self.home.as_path(), filesystem_root().as_path()]
      .into_iter()
      .map(resolve)
      .collect()
  }

  /// Create the root and its build, install and bin directories.
  ///
  /// The index directory is left to [`crate::index::PackageIndex::open`],
  /// which clones the registry only when it finds the directory missing.
  pub fn ensure_layout(&self) -> io::Result<()> {
    for dir in [self.root.clone(), self.build_dir(), self.install_dir(), self.bin_dir()] {
      std::fs::create_dir_all(&dir)?;
    }
    debug!(root = %self.root.display(), "anvil layout ready");
    Ok(())
  }

  /// Whether the bin directory is on `PATH`.
  pub fn bin_on_path(&self) -> bool {
    let bin = resolve(&self.bin_dir());
    std::env::var_os("PATH")
      .map(|path| std::env::split_paths(&path).any(|p| resolve(&p) == bin))
      .unwrap_or(false)
  }
}

/// Absolute form of `path`; symlinks are resolved when the path exists.
pub fn resolve(path: &Path) -> PathBuf {
  if let Ok(canonical) = dunce::canonicalize(path) {
    return canonical;
  }
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    std::env::current_dir()
      .map(|cwd| cwd.join(path))
      .unwrap_or_else(|_| path.to_path_buf())
  }
}

/// `1` / `true` in any case.
pub fn is_truthy(value: &str) -> bool {
  matches!(value.trim().to_lowercase().as_str(), "1" | "true")
}
