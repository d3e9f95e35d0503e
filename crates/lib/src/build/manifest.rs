//! The `anvil.json` project manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::build::{MsvcRuntime, PlanMetadata};
use crate::consts::MANIFEST_FILE;
use crate::platform::os::Os;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
  pub name: Option<String>,
  pub description: Option<String>,
  pub url: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  /// Entry-point stems to publish.
  pub binaries: Vec<String>,
  /// Packages forged before this one.
  pub dependencies: Vec<String>,
  /// `common` plus optional per-OS overrides.
  pub build: BTreeMap<String, Vec<String>>,
  /// System packages installed before building.
  pub build_dependencies: Vec<String>,
  pub msvc_runtime: Option<String>,
  pub force_pic: Option<bool>,
}

impl Manifest {
  pub fn path_in(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
  }

  /// Load the manifest from `dir`; `Ok(None)` when there is none.
  pub fn load(dir: &Path) -> Result<Option<Self>, ManifestError> {
    let path = Self::path_in(dir);
    if !path.is_file() {
      return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
      path: path.clone(),
      source,
    })?;
    serde_json::from_str(&content)
      .map(Some)
      .map_err(|source| ManifestError::Parse { path, source })
  }

  /// Build commands for `os`: its own key when present, else `common`.
  pub fn steps_for(&self, os: Option<Os>) -> &[String] {
    if let Some(os) = os {
      for key in os.manifest_keys() {
        if let Some(steps) = self.build.get(*key) {
          return steps;
        }
      }
    }
    self.build.get("common").map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn metadata(&self) -> PlanMetadata {
    PlanMetadata {
      msvc_runtime: self.msvc_runtime.as_deref().and_then(MsvcRuntime::parse),
      force_pic: self.force_pic,
    }
  }
}
