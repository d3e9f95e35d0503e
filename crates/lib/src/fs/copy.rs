//! Tree and file copies.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Recursively copy the contents of `src` into `dst`, merging with anything
/// already there. Symlinks are recreated on unix and followed elsewhere.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<u64> {
  std::fs::create_dir_all(dst)?;
  let mut copied = 0;

  for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
    let entry = entry.map_err(io::Error::other)?;
    let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    let target = dst.join(relative);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      std::fs::create_dir_all(&target)?;
    } else if file_type.is_symlink() {
      copy_symlink(entry.path(), &target)?;
      copied += 1;
    } else {
      if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::copy(entry.path(), &target)?;
      copied += 1;
    }
  }

  debug!(src = %src.display(), dst = %dst.display(), files = copied, "copied tree");
  Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  let pointee = std::fs::read_link(link)?;
  if target.symlink_metadata().is_ok() {
    std::fs::remove_file(target)?;
  }
  std::os::unix::fs::symlink(pointee, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  if link.is_dir() {
    copy_tree(link, target).map(|_| ())
  } else {
    std::fs::copy(link, target).map(|_| ())
  }
}

/// Copy each regular file in `files` into `dir`, creating `dir` first.
///
/// Returns the destination paths.
pub fn copy_files_into<I>(files: I, dir: &Path) -> io::Result<Vec<PathBuf>>
where
  I: IntoIterator<Item = PathBuf>,
{
  std::fs::create_dir_all(dir)?;
  let mut copied = Vec::new();
  for file in files {
    let Some(name) = file.file_name() else {
      continue;
    };
    let dest = dir.join(name);
    std::fs::copy(&file, &dest)?;
    copied.push(dest);
  }
  Ok(copied)
}
