//! The registry checkout inside the index directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::consts::INDEX_DB_FILE;
use crate::fs::SafeRemover;
use crate::git::{self, FetchError};
use crate::index::IndexError;

/// A problem found in the index directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexIssue {
  /// No `.git` at all.
  MissingCheckout,
  /// `.git` exists but is a plain file.
  GitMarkerIsFile,
  /// `.git` is a directory git cannot open.
  UnreadableRepo { message: String },
  /// Top-level entries besides the store while there is no usable checkout.
  StrayEntries { entries: Vec<String> },
}

impl fmt::Display for IndexIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      IndexIssue::MissingCheckout => write!(f, "index is not a git checkout"),
      IndexIssue::GitMarkerIsFile => write!(f, ".git is a file, not a directory"),
      IndexIssue::UnreadableRepo { message } => write!(f, "repository cannot be read: {}", message),
      IndexIssue::StrayEntries { entries } => write!(f, "stray entries: {}", entries.join(", ")),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexHealth {
  pub issues: Vec<IndexIssue>,
}

impl IndexHealth {
  pub fn is_healthy(&self) -> bool {
    self.issues.is_empty()
  }
}

/// Result of syncing with the central registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
  Pulled,
  /// Nothing to pull from.
  NoCheckout,
  PullFailed(String),
  /// The checkout was invalid and has been re-cloned.
  Repaired(IndexHealth),
  RepairFailed { health: IndexHealth, message: String },
}

#[derive(Debug, Clone)]
pub struct Registry {
  dir: PathBuf,
  url: String,
  remover: SafeRemover,
}

impl Registry {
  pub fn new(dir: impl Into<PathBuf>, url: impl Into<String>, remover: SafeRemover) -> Self {
    Self {
      dir: dir.into(),
      url: url.into(),
      remover,
    }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Clone the registry straight into an empty index directory.
  pub fn clone_into_empty(&self) -> Result<(), FetchError> {
    git::clone_repo(&self.url, &self.dir, None).map(|_| ())
  }

  /// Inspect the index directory without changing it.
  pub fn check(&self) -> IndexHealth {
    let git_dir = self.dir.join(".git");
    let mut issues = Vec::new();

    match git_dir.symlink_metadata() {
      Err(_) => issues.push(IndexIssue::MissingCheckout),
      Ok(meta) if !meta.is_dir() => issues.push(IndexIssue::GitMarkerIsFile),
      Ok(_) => {
        if let Err(e) = git::open_repo(&self.dir) {
          issues.push(IndexIssue::UnreadableRepo { message: e.to_string() });
        }
        return IndexHealth { issues };
      }
    }

    let stray = self.stray_entries();
    if !stray.is_empty() {
      issues.push(IndexIssue::StrayEntries { entries: stray });
    }
    IndexHealth { issues }
  }

  /// Top-level names other than `.git` and the store, sorted.
  fn stray_entries(&self) -> Vec<String> {
    let Ok(read) = std::fs::read_dir(&self.dir) else {
      return Vec::new();
    };
    let mut names: Vec<String> = read
      .filter_map(Result::ok)
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .filter(|n| n != ".git" && n != INDEX_DB_FILE)
      .collect();
    names.sort();
    names
  }

  /// Replace an unusable checkout with a fresh clone, keeping the store.
  ///
  /// Returns the issues found before repairing; a healthy index is left alone.
  pub fn repair(&self) -> Result<IndexHealth, IndexError> {
    let health = self.check();
    if health.is_healthy() {
      debug!(dir = %self.dir.display(), "index healthy, nothing to repair");
      return Ok(health);
    }
    for issue in &health.issues {
      warn!(issue = %issue, "repairing index");
    }

    std::fs::create_dir_all(&self.dir)?;
    for entry in std::fs::read_dir(&self.dir)?.filter_map(Result::ok) {
      if entry.file_name() == INDEX_DB_FILE {
        continue;
      }
      let outcome = self.remover.remove(&entry.path());
      if !outcome.is_gone() {
        warn!(path = %entry.path().display(), outcome = ?outcome, "could not clear index entry");
      }
    }

    let parent = self.dir.parent().unwrap_or(&self.dir);
    let staging = tempfile::Builder::new().prefix(".index-clone-").tempdir_in(parent)?;
    git::clone_repo(&self.url, staging.path(), None)?;

    for entry in std::fs::read_dir(staging.path())?.filter_map(Result::ok) {
      let dest = self.dir.join(entry.file_name());
      if dest.exists() {
        debug!(path = %dest.display(), "keeping existing entry");
        continue;
      }
      std::fs::rename(entry.path(), &dest)?;
    }

    info!(dir = %self.dir.display(), "index re-cloned");
    Ok(health)
  }

  /// Pull when the checkout is usable, repair it when it is not.
  pub fn update(&self) -> UpdateOutcome {
    let health = self.check();
    if health.issues.contains(&IndexIssue::MissingCheckout) {
      debug!("no registry checkout to update");
      return UpdateOutcome::NoCheckout;
    }

    if !health.is_healthy() {
      warn!(dir = %self.dir.display(), "index checkout is invalid, re-cloning");
      return match self.repair() {
        Ok(health) => UpdateOutcome::Repaired(health),
        Err(e) => {
          warn!(error = %e, "index repair failed");
          UpdateOutcome::RepairFailed {
            health,
            message: e.to_string(),
          }
        }
      };
    }

    info!(url = %self.url, "syncing central index");
    match git::pull(&self.dir) {
      Ok(()) => UpdateOutcome::Pulled,
      Err(e) => {
        warn!(error = %e, "index sync failed");
        UpdateOutcome::PullFailed(e.to_string())
      }
    }
  }
}
