//! What the user asked to forge.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::resolve;
use crate::forge::ForgeError;
use crate::git;
use crate::index::PackageIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
  /// Looked up in the index.
  Name,
  /// A remote repository URL.
  Url,
  /// A directory on this machine.
  LocalPath(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTarget {
  pub kind: TargetKind,
  pub raw: String,
  pub name: String,
  /// Repository URL when known; for local checkouts, their `origin`.
  pub url: Option<String>,
}

impl SourceTarget {
  /// Classify `raw`: URL, then existing directory, then index name.
  pub fn resolve(raw: &str, index: &PackageIndex) -> Result<Self, ForgeError> {
    let trimmed = raw.trim();

    if is_remote_url(trimmed) {
      let name = package_name_from_url(trimmed)?;
      info!(name = %name, url = %trimmed, "direct forge");
      return Ok(Self {
        kind: TargetKind::Url,
        raw: raw.to_string(),
        name,
        url: Some(trimmed.to_string()),
      });
    }

    let path = Path::new(trimmed);
    if path.is_dir() {
      let path = resolve(path);
      let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ForgeError::InvalidName(trimmed.to_string()))?;
      let url = if path.join(".git").exists() { git::origin_url(&path) } else { None };
      info!(name = %name, path = %path.display(), remote = ?url, "local forge");
      return Ok(Self {
        kind: TargetKind::LocalPath(path),
        raw: raw.to_string(),
        name: checked_name(&name)?,
        url,
      });
    }

    let name = checked_name(trimmed)?;
    let url = index
      .get_url(&name)?
      .ok_or_else(|| ForgeError::UnknownPackage(name.clone()))?;
    info!(name = %name, url = %url, "index forge");
    Ok(Self {
      kind: TargetKind::Name,
      raw: raw.to_string(),
      name,
      url: Some(url),
    })
  }
}

pub fn is_remote_url(target: &str) -> bool {
  target.starts_with("http") || target.starts_with("git@")
}

/// Last path segment of a repository URL without `.git`.
pub fn package_name_from_url(url: &str) -> Result<String, ForgeError> {
  let trimmed = url.trim().trim_end_matches('/');
  let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
  checked_name(last.strip_suffix(".git").unwrap_or(last))
}

/// Names become directory names under the anvil root.
pub fn checked_name(name: &str) -> Result<String, ForgeError> {
  let valid = !name.is_empty()
    && name != "."
    && name != ".."
    && !name.contains(['/', '\\'])
    && !name.contains(char::is_whitespace);
  if valid {
    Ok(name.to_string())
  } else {
    Err(ForgeError::InvalidName(name.to_string()))
  }
}
