use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the install prefix in shell steps.
pub const PREFIX_PLACEHOLDER: &str = "{PREFIX}";

/// One step of a build plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
  /// Shell command run in the workspace; may contain `{PREFIX}`.
  Shell(String),
  /// In-process action over the workspace and install prefix.
  Native(NativeAction),
}

impl BuildStep {
  pub fn shell(cmd: impl Into<String>) -> Self {
    Self::Shell(cmd.into())
  }

  /// Shell text with `{PREFIX}` replaced, using forward slashes so the path
  /// survives every shell unescaped.
  pub fn render(cmd: &str, prefix: &Path) -> String {
    let prefix = prefix.to_string_lossy().replace('\\', "/");
    cmd.replace(PREFIX_PLACEHOLDER, &prefix)
  }
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildStep::Shell(cmd) => write!(f, "{}", cmd),
      BuildStep::Native(action) => write!(f, "<{}>", action.name()),
    }
  }
}

/// Post-build collection actions performed in process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeAction {
  /// Executables from `target/release` into `bin/`.
  CopyCargoBins,
  /// `rlib`/static/shared libraries from `target/release` into `lib/`.
  CopyCargoLibs,
  /// Executables found in common build output folders into `bin/`.
  CopyBuildBins,
  /// The whole workspace into the prefix.
  CopyAll,
  CopyGradleArtifacts,
  CopyBazelArtifacts,
  CopyZigArtifacts,
  CopyMavenArtifacts,
  CopySwiftArtifacts,
}

impl NativeAction {
  pub fn name(&self) -> &'static str {
    match self {
      Self::CopyCargoBins => "copy-cargo-bins",
      Self::CopyCargoLibs => "copy-cargo-libs",
      Self::CopyBuildBins => "copy-build-bins",
      Self::CopyAll => "copy-all",
      Self::CopyGradleArtifacts => "copy-gradle-artifacts",
      Self::CopyBazelArtifacts => "copy-bazel-artifacts",
      Self::CopyZigArtifacts => "copy-zig-artifacts",
      Self::CopyMavenArtifacts => "copy-maven-artifacts",
      Self::CopySwiftArtifacts => "copy-swift-artifacts",
    }
  }
}

/// C runtime linkage for the MSVC toolchain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MsvcRuntime {
  /// Dynamic CRT (`/MD`).
  #[default]
  #[serde(rename = "MD")]
  Md,
  /// Static CRT (`/MT`).
  #[serde(rename = "MT")]
  Mt,
}

impl MsvcRuntime {
  /// Parse `MD` / `MT` in any case; anything else is `None`.
  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_uppercase().as_str() {
      "MD" => Some(Self::Md),
      "MT" => Some(Self::Mt),
      _ => None,
    }
  }

  pub fn cl_flag(&self) -> &'static str {
    match self {
      Self::Md => "/MD",
      Self::Mt => "/MT",
    }
  }

  /// Value for `CMAKE_MSVC_RUNTIME_LIBRARY`.
  pub fn cmake_value(&self) -> &'static str {
    match self {
      Self::Md => "MultiThreadedDLL",
      Self::Mt => "MultiThreaded",
    }
  }
}

impl fmt::Display for MsvcRuntime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Md => write!(f, "MD"),
      Self::Mt => write!(f, "MT"),
    }
  }
}

/// Per-project build metadata from the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanMetadata {
  pub msvc_runtime: Option<MsvcRuntime>,
  pub force_pic: Option<bool>,
}

/// Ordered steps plus what the build is expected to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
  /// Rule that produced the plan, for reporting.
  pub detected: &'static str,
  pub steps: Vec<BuildStep>,
  /// Stems of entry points the build should produce.
  pub binaries: BTreeSet<String>,
  pub metadata: PlanMetadata,
  /// Packages to forge before this one.
  pub dependencies: Vec<String>,
}

impl BuildPlan {
  pub fn new(detected: &'static str, steps: Vec<BuildStep>) -> Self {
    Self {
      detected,
      steps,
      ..Default::default()
    }
  }

  /// A plan with nothing to do; forging it is a no-op success.
  pub fn empty(detected: &'static str) -> Self {
    Self::new(detected, Vec::new())
  }

  pub fn with_binaries<I, S>(mut self, binaries: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.binaries = binaries.into_iter().map(Into::into).collect();
    self
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}
