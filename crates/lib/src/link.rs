//! Publishing installed executables into the shared bin directory.
//!
//! Entry points are symlinks on unix and `.bat` forwarding scripts on
//! Windows. Linking the same prefix twice leaves the bin directory unchanged.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{AnvilConfig, resolve};
use crate::fs::{SafeRemover, is_executable, make_writable};

/// Suffixes published even without the executable bit.
const RUNNABLE_SUFFIXES: &[&str] = &["exe", "bat", "py", "sh"];

#[derive(Debug, Clone)]
pub struct ArtifactLinker {
  bin_dir: PathBuf,
  remover: SafeRemover,
}

impl ArtifactLinker {
  /// Linker whose remover protects only `bin_dir` itself.
  pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
    let bin_dir = bin_dir.into();
    let remover = SafeRemover::new(vec![bin_dir.clone()]);
    Self { bin_dir, remover }
  }

  pub fn for_config(config: &AnvilConfig) -> Self {
    Self::new(config.bin_dir()).with_remover(SafeRemover::for_config(config))
  }

  pub fn with_remover(mut self, remover: SafeRemover) -> Self {
    self.remover = remover;
    self
  }

  pub fn bin_dir(&self) -> &Path {
    &self.bin_dir
  }

  /// Publish every entry point found in `prefix`, returning the published paths.
  pub fn link(&self, prefix: &Path, stems: &BTreeSet<String>) -> io::Result<BTreeSet<PathBuf>> {
    std::fs::create_dir_all(&self.bin_dir)?;
    let mut published = BTreeSet::new();

    for source in candidates(prefix, stems) {
      match self.publish(&source) {
        Ok(dest) => {
          debug!(src = %source.display(), dest = %dest.display(), "published entry point");
          published.insert(dest);
        }
        Err(e) => warn!(src = %source.display(), error = %e, "failed to publish entry point"),
      }
    }

    if published.is_empty() {
      warn!(prefix = %prefix.display(), "no executables found to link");
    } else {
      info!(count = published.len(), bin = %self.bin_dir.display(), "linked executables");
    }
    Ok(published)
  }

  fn publish(&self, source: &Path) -> io::Result<PathBuf> {
    let dest = self.destination(source)?;
    self.remove_existing(&dest)?;
    write_entry(source, &dest)?;
    Ok(dest)
  }

  #[cfg(unix)]
  fn destination(&self, source: &Path) -> io::Result<PathBuf> {
    let name = source
      .file_name()
      .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "entry point has no file name"))?;
    Ok(self.bin_dir.join(name))
  }

  #[cfg(windows)]
  fn destination(&self, source: &Path) -> io::Result<PathBuf> {
    let stem = source
      .file_stem()
      .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "entry point has no file name"))?;
    Ok(self.bin_dir.join(stem).with_extension("bat"))
  }

  /// Clear `dest` for a new entry. Directories go through the remover; files
  /// are retried once after making them writable.
  fn remove_existing(&self, dest: &Path) -> io::Result<()> {
    let Ok(meta) = dest.symlink_metadata() else {
      return Ok(());
    };
    if meta.is_dir() {
      let outcome = self.remover.remove(dest);
      if !outcome.is_gone() {
        return Err(io::Error::other(format!(
          "could not clear directory {} ({outcome:?})",
          dest.display()
        )));
      }
      return Ok(());
    }
    if std::fs::remove_file(dest).is_ok() {
      return Ok(());
    }
    make_writable(dest);
    std::fs::remove_file(dest)
  }

  /// Published entries that forward into `prefix`.
  pub fn entries_for(&self, prefix: &Path) -> Vec<PathBuf> {
    let prefix = resolve(prefix);
    self
      .entries()
      .into_iter()
      .filter(|entry| target_of(entry).is_some_and(|t| t.starts_with(&prefix)))
      .collect()
  }

  /// Every entry in the bin directory, sorted.
  pub fn entries(&self) -> Vec<PathBuf> {
    let Ok(read) = std::fs::read_dir(&self.bin_dir) else {
      return Vec::new();
    };
    let mut entries: Vec<PathBuf> = read.filter_map(Result::ok).map(|e| e.path()).collect();
    entries.sort();
    entries
  }
}

/// Where a published entry forwards to, when that can be told.
pub fn target_of(entry: &Path) -> Option<PathBuf> {
  let meta = entry.symlink_metadata().ok()?;
  if meta.file_type().is_symlink() {
    let target = std::fs::read_link(entry).ok()?;
    let target = if target.is_absolute() {
      target
    } else {
      entry.parent()?.join(target)
    };
    return Some(resolve(&target));
  }

  if entry.extension().is_some_and(|e| e.eq_ignore_ascii_case("bat")) {
    let script = std::fs::read_to_string(entry).ok()?;
    let quoted = script.lines().find_map(|line| {
      let rest = line.trim().strip_prefix('"')?;
      rest.split('"').next().map(PathBuf::from)
    })?;
    return Some(resolve(&quoted));
  }
  None
}

/// Executables directly in `prefix` or `prefix/bin`, plus any file under
/// `prefix` whose stem is expected. Hidden files are skipped.
pub fn candidates(prefix: &Path, stems: &BTreeSet<String>) -> BTreeSet<PathBuf> {
  let mut found = BTreeSet::new();

  for dir in [prefix.to_path_buf(), prefix.join("bin")] {
    let Ok(read) = std::fs::read_dir(&dir) else {
      continue;
    };
    for entry in read.filter_map(Result::ok) {
      let path = entry.path();
      if is_hidden(&path) || !path.is_file() {
        continue;
      }
      if is_executable(&path) || has_runnable_suffix(&path) {
        found.insert(path);
      }
    }
  }

  if !stems.is_empty() {
    let walker = WalkDir::new(prefix)
      .min_depth(1)
      .into_iter()
      .filter_entry(|e| !is_hidden(e.path()))
      .filter_map(Result::ok);
    for entry in walker {
      let path = entry.path();
      let stem_matches = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| stems.contains(s));
      if entry.file_type().is_file() && stem_matches {
        found.insert(path.to_path_buf());
      }
    }
  }

  found
}

fn is_hidden(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|n| n.starts_with('.'))
}

fn has_runnable_suffix(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| RUNNABLE_SUFFIXES.iter().any(|s| s.eq_ignore_ascii_case(e)))
}


#[cfg(unix)]
fn write_entry(source: &Path, dest: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(resolve(source), dest)
}

#[cfg(windows)]
fn write_entry(source: &Path, dest: &Path) -> io::Result<()> {
  std::fs::write(dest, format!("@echo off\r\n\"{}\" %*\r\n", resolve(source).display()))
}
