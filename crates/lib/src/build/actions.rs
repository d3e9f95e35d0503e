//! In-process collection of build outputs into the install prefix.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::build::NativeAction;
use crate::fs::{copy_files_into, copy_tree, is_executable};

/// Extensions never taken for entry points by [`NativeAction::CopyBuildBins`].
const NON_BINARY_EXTENSIONS: &[&str] = &["py", "sh", "txt", "md", "c", "h", "o", "a", "so", "dll", "dylib"];

const CARGO_LIB_EXTENSIONS: &[&str] = &["rlib", "a", "so", "dll", "dylib"];

impl NativeAction {
  /// Perform the action, returning how many entries were copied.
  pub fn run(&self, workspace: &Path, prefix: &Path) -> io::Result<u64> {
    info!(action = self.name(), workspace = %workspace.display(), "running native step");
    std::fs::create_dir_all(prefix)?;

    let copied = match self {
      Self::CopyCargoBins => {
        let release = cargo_release_dir(workspace)?;
        let bins = list_files(&release)?.into_iter().filter(|f| is_cargo_binary(f));
        count(copy_files_into(bins, &prefix.join("bin"))?)
      }
      Self::CopyCargoLibs => {
        let release = cargo_release_dir(workspace)?;
        let libs = list_files(&release)?
          .into_iter()
          .filter(|f| has_extension(f, CARGO_LIB_EXTENSIONS));
        count(copy_files_into(libs, &prefix.join("lib"))?)
      }
      Self::CopyBuildBins => copy_build_bins(workspace, prefix)?,
      Self::CopyAll => copy_tree(workspace, prefix)?,
      Self::CopyGradleArtifacts => copy_dir_files(&workspace.join("build").join("libs"), prefix, |_| true)?,
      Self::CopyBazelArtifacts => {
        let out = workspace.join("bazel-bin");
        if out.is_dir() { copy_tree(&out, prefix)? } else { 0 }
      }
      Self::CopyZigArtifacts => {
        copy_dir_files(&workspace.join("zig-out").join("bin"), &prefix.join("bin"), |_| true)?
      }
      Self::CopyMavenArtifacts => {
        copy_dir_files(&workspace.join("target"), prefix, |f| has_extension(f, &["jar"]))?
      }
      Self::CopySwiftArtifacts => {
        let release = workspace.join(".build").join("release");
        copy_dir_files(&release, &prefix.join("bin"), |f| is_executable(f))?
      }
    };

    if copied == 0 {
      warn!(action = self.name(), "no artifacts found to copy");
    } else {
      info!(action = self.name(), copied, "collected artifacts");
    }
    Ok(copied)
  }
}

fn count(paths: Vec<PathBuf>) -> u64 {
  paths.len() as u64
}

fn cargo_release_dir(workspace: &Path) -> io::Result<PathBuf> {
  let release = workspace.join("target").join("release");
  if !release.is_dir() {
    return Err(io::Error::new(
      io::ErrorKind::NotFound,
      format!("{} does not exist", release.display()),
    ));
  }
  Ok(release)
}

/// Regular files directly inside `dir`, sorted.
fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in std::fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_file() {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

fn copy_dir_files(src: &Path, dest: &Path, keep: impl Fn(&Path) -> bool) -> io::Result<u64> {
  if !src.is_dir() {
    return Ok(0);
  }
  let files = list_files(src)?.into_iter().filter(|f| keep(f));
  Ok(count(copy_files_into(files, dest)?))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

#[cfg(unix)]
fn is_cargo_binary(path: &Path) -> bool {
  let dotless = path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|n| !n.contains('.'));
  dotless && is_executable(path)
}

#[cfg(windows)]
fn is_cargo_binary(path: &Path) -> bool {
  has_extension(path, &["exe"])
}

/// Copy executables from the usual output folders into `prefix/bin`.
///
/// A file named after the workspace or prefix counts even without the
/// executable bit. Individual copy failures are skipped.
fn copy_build_bins(workspace: &Path, prefix: &Path) -> io::Result<u64> {
  let bin_dir = prefix.join("bin");
  std::fs::create_dir_all(&bin_dir)?;

  let mut probable = Vec::new();
  for dir in [workspace, prefix] {
    if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
      probable.push(name.to_string());
      probable.push(format!("{}.exe", name));
    }
  }

  let locations = [
    workspace.to_path_buf(),
    workspace.join("bin"),
    workspace.join("build"),
    workspace.join("dist"),
    workspace.join("target").join("release"),
    workspace.join("cmd"),
  ];

  let mut copied = 0;
  for location in locations.iter().filter(|l| l.is_dir()) {
    for entry in WalkDir::new(location).min_depth(1).into_iter().filter_map(Result::ok) {
      let path = entry.path();
      if !entry.file_type().is_file() || path.starts_with(&bin_dir) {
        continue;
      }
      let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| probable.iter().any(|p| p == n));
      if !named && !(is_executable(path) && !has_extension(path, NON_BINARY_EXTENSIONS)) {
        continue;
      }
      let Some(name) = path.file_name() else {
        continue;
      };
      match std::fs::copy(path, bin_dir.join(name)) {
        Ok(_) => copied += 1,
        Err(e) => warn!(path = %path.display(), error = %e, "skipping artifact"),
      }
    }
  }
  Ok(copied)
}
