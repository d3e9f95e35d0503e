//! Executable-bit checks.

use std::io;
use std::path::Path;

/// Extensions treated as runnable on Windows.
#[cfg(windows)]
const WINDOWS_EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "bat", "cmd", "com"];

/// Whether the current user may execute `path`.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
  use rustix::fs::{Access, access};
  path.is_file() && access(path, Access::EXEC_OK).is_ok()
}

#[cfg(windows)]
pub fn is_executable(path: &Path) -> bool {
  path.is_file()
    && path
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|e| WINDOWS_EXECUTABLE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// Add the execute bits to `path`. No-op on Windows.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  let mut perms = std::fs::metadata(path)?.permissions();
  perms.set_mode(perms.mode() | 0o755);
  std::fs::set_permissions(path, perms)
}

#[cfg(windows)]
pub fn set_executable(_path: &Path) -> io::Result<()> {
  Ok(())
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn executable_bit_round_trip() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("tool");
    std::fs::write(&file, "#!/bin/sh\n").unwrap();
    assert!(!is_executable(&file));

    set_executable(&file).unwrap();
    assert!(is_executable(&file));
  }

  #[test]
  fn directories_are_not_executables() {
    let temp = TempDir::new().unwrap();
    assert!(!is_executable(temp.path()));
  }
}
