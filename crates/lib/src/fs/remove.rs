//! Guarded recursive deletion.
//!
//! Every destructive operation in anvil goes through [`SafeRemover`]. The
//! remover resolves its argument to an absolute path and refuses anything on
//! the protected list (the anvil root, the user's home, the filesystem root)
//! or any ancestor of those. Removal is retried a fixed number of times with a
//! fixed delay, making entries writable between attempts. Exhausting the
//! retries is logged and reported, never raised.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::config::{AnvilConfig, resolve};

const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// What a guarded removal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
  Removed,
  /// Nothing existed at the path.
  Missing,
  /// The path is protected and was left untouched.
  Refused,
  /// Every attempt failed; the path may be partially removed.
  GaveUp,
}

impl RemoveOutcome {
  /// True when nothing is left at the path.
  pub fn is_gone(self) -> bool {
    matches!(self, Self::Removed | Self::Missing)
  }
}

#[derive(Debug, Clone)]
pub struct SafeRemover {
  protected: Vec<PathBuf>,
  retries: u32,
  delay: Duration,
}

impl SafeRemover {
  pub fn new(protected: Vec<PathBuf>) -> Self {
    Self {
      protected: protected.iter().map(|p| resolve(p)).collect(),
      retries: DEFAULT_RETRIES,
      delay: DEFAULT_DELAY,
    }
  }

  /// Remover protecting the configured root, home and filesystem root.
  pub fn for_config(config: &AnvilConfig) -> Self {
    Self::new(config.protected_paths())
  }

  pub fn with_backoff(mut self, retries: u32, delay: Duration) -> Self {
    self.retries = retries.max(1);
    self.delay = delay;
    self
  }

  /// Whether removing `path` would destroy a protected location.
  pub fn is_protected(&self, path: &Path) -> bool {
    let resolved = resolve(path);
    self.protected.iter().any(|p| p.starts_with(&resolved))
  }

  /// Remove `path` recursively unless it is protected.
  pub fn remove(&self, path: &Path) -> RemoveOutcome {
    if path.symlink_metadata().is_err() {
      return RemoveOutcome::Missing;
    }

    if self.is_protected(path) {
      error!(path = %path.display(), "refusing to remove protected path");
      return RemoveOutcome::Refused;
    }

    let mut last_err = None;
    for attempt in 1..=self.retries {
      match remove_entry(path) {
        Ok(()) => {
          debug!(path = %path.display(), attempt, "removed");
          return RemoveOutcome::Removed;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => return RemoveOutcome::Removed,
        Err(e) => {
          warn!(path = %path.display(), attempt, error = %e, "removal failed, retrying");
          make_writable(path);
          last_err = Some(e);
          if attempt < self.retries {
            std::thread::sleep(self.delay);
          }
        }
      }
    }

    error!(
      path = %path.display(),
      retries = self.retries,
      error = ?last_err.map(|e| e.to_string()),
      "could not remove path"
    );
    RemoveOutcome::GaveUp
  }

  /// Remove every child of `dir`, keeping `dir` itself.
  ///
  /// Returns the outcome for each child in directory order.
  pub fn clear_dir(&self, dir: &Path) -> io::Result<Vec<(PathBuf, RemoveOutcome)>> {
    let mut outcomes = Vec::new();
    if !dir.is_dir() {
      return Ok(outcomes);
    }

    let mut children: Vec<PathBuf> = std::fs::read_dir(dir)?.flatten().map(|e| e.path()).collect();
    children.sort();

    for child in children {
      let outcome = self.remove(&child);
      outcomes.push((child, outcome));
    }

    Ok(outcomes)
  }

  /// Remove `dir` if present and create it again, empty.
  pub fn recreate_dir(&self, dir: &Path) -> io::Result<()> {
    match self.remove(dir) {
      RemoveOutcome::Removed | RemoveOutcome::Missing => {}
      RemoveOutcome::Refused => {
        return Err(io::Error::new(
          io::ErrorKind::PermissionDenied,
          format!("refusing to recreate protected path {}", dir.display()),
        ));
      }
      RemoveOutcome::GaveUp => {
        return Err(io::Error::other(format!("could not clear {}", dir.display())));
      }
    }
    std::fs::create_dir_all(dir)
  }
}

fn remove_entry(path: &Path) -> io::Result<()> {
  let meta = path.symlink_metadata()?;
  if meta.is_dir() {
    std::fs::remove_dir_all(path)
  } else {
    std::fs::remove_file(path)
  }
}

/// Restore write permission on `path` and everything beneath it.
///
/// Best-effort: failures are logged and skipped.
pub fn make_writable(path: &Path) {
  // Directories before contents so they can be entered.
  for entry in WalkDir::new(path).follow_links(false).into_iter().flatten() {
    if entry.path_is_symlink() {
      continue;
    }
    if let Err(e) = make_entry_writable(entry.path()) {
      warn!(path = %entry.path().display(), error = %e, "failed to make writable, continuing");
    }
  }
}

#[cfg(unix)]
fn make_entry_writable(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let metadata = std::fs::metadata(path)?;
  let mode = metadata.permissions().mode();
  let wanted = if metadata.is_dir() { mode | 0o700 } else { mode | 0o200 };
  if wanted != mode {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(wanted))?;
  }
  Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_entry_writable(path: &Path) -> io::Result<()> {
  let mut perms = std::fs::metadata(path)?.permissions();
  if perms.readonly() {
    perms.set_readonly(false);
    std::fs::set_permissions(path, perms)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn remover_for(temp: &TempDir) -> (AnvilConfig, SafeRemover) {
    let mut config = AnvilConfig::with_root(temp.path().join("anvil"));
    config.home = temp.path().join("home");
    std::fs::create_dir_all(&config.home).unwrap();
    config.ensure_layout().unwrap();
    let remover = SafeRemover::for_config(&config).with_backoff(2, Duration::from_millis(1));
    (config, remover)
  }

  #[test]
  fn refuses_root_home_and_filesystem_root() {
    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    assert_eq!(remover.remove(&config.root), RemoveOutcome::Refused);
    assert_eq!(remover.remove(&config.home), RemoveOutcome::Refused);
    assert_eq!(
      remover.remove(&crate::platform::paths::filesystem_root()),
      RemoveOutcome::Refused
    );
    assert!(config.root.exists());
    assert!(config.home.exists());
  }

  #[test]
  #[traced_test]
  fn refusal_is_logged() {
    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    remover.remove(&config.root);

    assert!(logs_contain("refusing to remove protected path"));
  }

  #[test]
  fn refuses_paths_that_resolve_to_protected_locations() {
    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    let sneaky = config.build_dir().join("..").join("bin").join("..");
    assert_eq!(remover.remove(&sneaky), RemoveOutcome::Refused);
    assert!(config.root.exists());
  }

  #[test]
  fn refuses_ancestors_of_protected_paths() {
    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    assert_eq!(remover.remove(temp.path()), RemoveOutcome::Refused);
    assert!(config.root.exists());
  }

  #[test]
  fn removes_ordinary_trees() {
    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    let ws = config.workspace("pkg");
    std::fs::create_dir_all(ws.join("src/deep")).unwrap();
    std::fs::write(ws.join("src/deep/file.c"), "int main;").unwrap();

    assert_eq!(remover.remove(&ws), RemoveOutcome::Removed);
    assert!(!ws.exists());
    assert_eq!(remover.remove(&ws), RemoveOutcome::Missing);
  }

  #[test]
  #[cfg(unix)]
  fn removes_read_only_entries() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    let ws = config.workspace("locked");
    let inner = ws.join("inner");
    std::fs::create_dir_all(&inner).unwrap();
    std::fs::write(inner.join("ro.txt"), "x").unwrap();
    std::fs::set_permissions(inner.join("ro.txt"), std::fs::Permissions::from_mode(0o444)).unwrap();
    std::fs::set_permissions(&inner, std::fs::Permissions::from_mode(0o555)).unwrap();

    let outcome = remover.remove(&ws);
    assert!(outcome.is_gone(), "got {:?}", outcome);
    assert!(!ws.exists());
  }

  #[test]
  fn clear_dir_keeps_the_directory() {
    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    let build = config.build_dir();
    std::fs::write(build.join("junk1"), "x").unwrap();
    std::fs::create_dir_all(build.join("subdir")).unwrap();
    std::fs::write(build.join("subdir/junk2"), "y").unwrap();

    let outcomes = remover.clear_dir(&build).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|(_, o)| *o == RemoveOutcome::Removed));
    assert!(build.is_dir());
    assert_eq!(std::fs::read_dir(&build).unwrap().count(), 0);
  }

  #[test]
  fn recreate_dir_wipes_previous_contents() {
    let temp = TempDir::new().unwrap();
    let (config, remover) = remover_for(&temp);

    let ws = config.workspace("again");
    std::fs::create_dir_all(&ws).unwrap();
    std::fs::write(ws.join("stale"), "old").unwrap();

    remover.recreate_dir(&ws).unwrap();
    assert!(ws.is_dir());
    assert!(!ws.join("stale").exists());
  }
}
