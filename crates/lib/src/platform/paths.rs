use std::path::PathBuf;

use crate::consts::APP_DIR;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("C:\\"))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Returns the anvil root directory.
///
/// `ANVIL_ROOT` takes precedence over `~/.anvil`.
pub fn root_dir() -> PathBuf {
  if let Ok(path) = std::env::var("ANVIL_ROOT") {
    return PathBuf::from(path);
  }

  home_dir().join(APP_DIR)
}

/// Returns the filesystem root for the current platform.
#[cfg(windows)]
pub fn filesystem_root() -> PathBuf {
  let drive = std::env::var("SYSTEMDRIVE").unwrap_or_else(|_| "C:".to_string());
  PathBuf::from(format!("{}\\", drive))
}

/// Returns the filesystem root for the current platform.
#[cfg(not(windows))]
pub fn filesystem_root() -> PathBuf {
  PathBuf::from("/")
}
