//! Uninstall, listing and housekeeping over the anvil root.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::resolve;
use crate::forge::target::checked_name;
use crate::forge::{Forge, ForgeError};
use crate::fs::RemoveOutcome;
use crate::link::target_of;
use crate::release::ReleaseProvider;

#[derive(Debug)]
pub struct UninstallReport {
  pub name: String,
  pub unlinked: Vec<PathBuf>,
  pub prefix: RemoveOutcome,
}

#[derive(Debug, Default, Serialize)]
pub struct HousekeepingStats {
  pub workspaces_scanned: usize,
  pub workspaces_removed: usize,
  pub bytes_freed: u64,
  pub links_scanned: usize,
  pub links_removed: usize,
}

#[derive(Debug, Serialize)]
pub struct HousekeepingReport {
  pub stats: HousekeepingStats,
  pub removed_paths: Vec<PathBuf>,
}

impl<R: ReleaseProvider> Forge<R> {
  /// Remove the published entries of `name`, then its install prefix.
  pub fn uninstall(&self, name: &str) -> Result<UninstallReport, ForgeError> {
    let name = checked_name(name)?;
    let prefix = self.config.install_prefix(&name);
    if !prefix.exists() {
      return Err(ForgeError::NotInstalled(name));
    }

    let mut unlinked = Vec::new();
    for entry in self.linker.entries_for(&prefix) {
      match std::fs::remove_file(&entry) {
        Ok(()) => unlinked.push(entry),
        Err(e) => warn!(entry = %entry.display(), error = %e, "failed to remove entry point"),
      }
    }

    let outcome = self.remover.remove(&prefix);
    match outcome {
      RemoveOutcome::Removed | RemoveOutcome::Missing => info!(name = %name, "uninstalled"),
      other => warn!(name = %name, outcome = ?other, "install prefix not fully removed"),
    }

    Ok(UninstallReport {
      name,
      unlinked,
      prefix: outcome,
    })
  }

  /// Installed package names, sorted.
  pub fn list(&self) -> Result<Vec<String>, ForgeError> {
    let dir = self.config.install_dir();
    if !dir.is_dir() {
      return Ok(Vec::new());
    }

    let mut names: Vec<String> = std::fs::read_dir(&dir)?
      .filter_map(Result::ok)
      .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .filter(|n| !n.starts_with('.'))
      .collect();
    names.sort();
    Ok(names)
  }

  /// Clear leftover workspaces and drop published entries that no longer
  /// belong to an installed package.
  ///
  /// An entry is kept while its stem names an installed package or it
  /// forwards into an existing install prefix.
  pub fn housekeeping(&self) -> Result<HousekeepingReport, ForgeError> {
    let mut stats = HousekeepingStats::default();
    let mut removed_paths = Vec::new();

    let build_dir = self.config.build_dir();
    let sizes: Vec<(PathBuf, u64)> = children(&build_dir)
      .into_iter()
      .map(|p| {
        let size = dir_size(&p);
        (p, size)
      })
      .collect();
    stats.workspaces_scanned = sizes.len();
    for (path, outcome) in self.remover.clear_dir(&build_dir)? {
      if outcome.is_gone() {
        stats.workspaces_removed += 1;
        stats.bytes_freed += sizes.iter().find(|(p, _)| *p == path).map_or(0, |(_, s)| *s);
        removed_paths.push(path);
      } else {
        warn!(path = %path.display(), ?outcome, "could not clear workspace");
      }
    }

    let installed: BTreeSet<String> = self.list()?.into_iter().collect();
    let install_dir = resolve(&self.config.install_dir());

    for entry in self.linker.entries() {
      stats.links_scanned += 1;
      if keeps_entry(&entry, &installed, &install_dir) {
        continue;
      }
      match std::fs::remove_file(&entry) {
        Ok(()) => {
          debug!(entry = %entry.display(), "removed orphaned entry point");
          stats.links_removed += 1;
          removed_paths.push(entry);
        }
        Err(e) => warn!(entry = %entry.display(), error = %e, "failed to remove orphaned entry point"),
      }
    }

    info!(
      workspaces_removed = stats.workspaces_removed,
      links_removed = stats.links_removed,
      bytes_freed = stats.bytes_freed,
      "housekeeping complete"
    );
    Ok(HousekeepingReport { stats, removed_paths })
  }
}

fn keeps_entry(entry: &Path, installed: &BTreeSet<String>, install_dir: &Path) -> bool {
  let stem_installed = entry
    .file_stem()
    .and_then(|s| s.to_str())
    .is_some_and(|s| installed.contains(s));
  if stem_installed {
    return true;
  }

  target_of(entry).is_some_and(|target| {
    target.exists()
      && target
        .strip_prefix(install_dir)
        .ok()
        .and_then(|rest| rest.components().next())
        .is_some_and(|pkg| installed.contains(&*pkg.as_os_str().to_string_lossy()))
  })
}

fn children(dir: &Path) -> Vec<PathBuf> {
  std::fs::read_dir(dir)
    .map(|read| read.filter_map(Result::ok).map(|e| e.path()).collect())
    .unwrap_or_default()
}

fn dir_size(path: &Path) -> u64 {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .map(|m| m.len())
    .sum()
}
