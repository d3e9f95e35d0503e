//! End-to-end package forging.
//!
//! A forge runs the pipeline
//!
//! ```text
//! resolve target -> release check? -> fetch -> detect -> dependencies
//!   -> build -> link -> cleanup -> auto-submit?
//! ```
//!
//! Each stage finishes before the next starts. A build failure aborts the
//! forge and leaves the workspace and install prefix in place for
//! inspection; the stages after link never fail a forge that built.

pub mod maintenance;
pub mod submit;
pub mod target;

use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::build::{BuildPlan, Detector, MsvcRuntime};
use crate::config::AnvilConfig;
use crate::diagnostics;
use crate::execute::{BuildEnv, EnvOverrides, ExecuteError, ProcessRunner};
use crate::fs::{SafeRemover, copy_tree};
use crate::git::{self, FetchError};
use crate::index::{IndexError, PackageIndex};
use crate::link::ArtifactLinker;
use crate::release::{GithubReleases, ReleaseProvider};

pub use maintenance::{HousekeepingReport, HousekeepingStats, UninstallReport};
pub use submit::{Submission, submission_link};
pub use target::{SourceTarget, TargetKind};

/// Per-invocation overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeOptions {
  /// Highest-precedence MSVC runtime choice.
  pub msvc_runtime: Option<MsvcRuntime>,
  /// Highest-precedence PIC request.
  pub force_pic: Option<bool>,
  /// Try an existing install or a prebuilt release before building.
  pub check_release: bool,
}

impl Default for ForgeOptions {
  fn default() -> Self {
    Self {
      msvc_runtime: None,
      force_pic: None,
      check_release: true,
    }
  }
}

#[derive(Debug, Error)]
pub enum ForgeError {
  #[error("package '{0}' not found in index")]
  UnknownPackage(String),

  #[error("'{0}' is not a usable package name")]
  InvalidName(String),

  #[error("failed to fetch source: {0}")]
  Fetch(#[from] FetchError),

  #[error("could not prepare {path}: {source}")]
  Unclean {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("build of '{name}' failed at `{step}`: {source}")]
  Build {
    name: String,
    step: String,
    #[source]
    source: ExecuteError,
    suggestions: Vec<String>,
  },

  #[error("dependency '{dependency}' of '{name}' failed: {source}")]
  Dependency {
    name: String,
    dependency: String,
    #[source]
    source: Box<ForgeError>,
  },

  #[error("index error: {0}")]
  Index(#[from] IndexError),

  #[error("failed to link executables: {0}")]
  Link(#[source] std::io::Error),

  #[error("package '{0}' is not installed")]
  NotInstalled(String),

  #[error("invalid submission link: {0}")]
  SubmitLink(#[from] url::ParseError),

  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ForgeError {
  /// Remediation hints attached to a failed build, searching through
  /// dependency failures.
  pub fn suggestions(&self) -> &[String] {
    match self {
      ForgeError::Build { suggestions, .. } => suggestions,
      ForgeError::Dependency { source, .. } => source.suggestions(),
      _ => &[],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForgeOutcome {
  /// Built from source.
  Built { detected: String, steps: usize },
  /// The install prefix was already populated.
  AlreadyInstalled,
  /// A prebuilt release was installed.
  Prebuilt,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgeReport {
  pub name: String,
  pub prefix: PathBuf,
  pub outcome: ForgeOutcome,
  pub published: BTreeSet<PathBuf>,
  /// Reports for manifest dependencies forged first.
  pub dependencies: Vec<ForgeReport>,
  /// Submission link when the source was added to the local index.
  pub submitted: Option<String>,
}

/// The package manager: one value per process, built from [`AnvilConfig`].
pub struct Forge<R = GithubReleases> {
  config: AnvilConfig,
  index: PackageIndex,
  detector: Detector,
  linker: ArtifactLinker,
  remover: SafeRemover,
  releases: R,
}

impl Forge<GithubReleases> {
  /// Lay out the root, open the index and use GitHub for releases.
  pub fn open(config: AnvilConfig) -> Result<Self, ForgeError> {
    config.ensure_layout()?;
    if !config.bin_on_path() {
      warn!(bin = %config.bin_dir().display(), "bin directory is not on PATH");
    }

    let index = PackageIndex::open(&config)?;
    Ok(Self {
      linker: ArtifactLinker::for_config(&config),
      remover: SafeRemover::for_config(&config),
      detector: Detector::new(),
      releases: GithubReleases::new(),
      index,
      config,
    })
  }
}

impl<R: ReleaseProvider> Forge<R> {
  pub fn with_releases<P: ReleaseProvider>(self, releases: P) -> Forge<P> {
    Forge {
      config: self.config,
      index: self.index,
      detector: self.detector,
      linker: self.linker,
      remover: self.remover,
      releases,
    }
  }

  pub fn with_detector(mut self, detector: Detector) -> Self {
    self.detector = detector;
    self
  }

  pub fn with_remover(mut self, remover: SafeRemover) -> Self {
    self.remover = remover;
    self
  }

  pub fn config(&self) -> &AnvilConfig {
    &self.config
  }

  pub fn index(&self) -> &PackageIndex {
    &self.index
  }

  pub fn linker(&self) -> &ArtifactLinker {
    &self.linker
  }

  /// Forge `target`: an index name, a repository URL or a local directory.
  ///
  /// Manifest dependencies are forged first, each as a full forge of its own.
  pub async fn forge(&self, target: &str, options: &ForgeOptions) -> Result<ForgeReport, ForgeError> {
    let source = SourceTarget::resolve(target, &self.index)?;
    let prefix = self.config.install_prefix(&source.name);

    if options.check_release
      && let Some(outcome) = self.release_check(&source, &prefix).await
    {
      let published = self.linker.link(&prefix, &BTreeSet::new()).map_err(ForgeError::Link)?;
      return Ok(ForgeReport {
        name: source.name,
        prefix,
        outcome,
        published,
        dependencies: Vec::new(),
        submitted: None,
      });
    }

    let workspace = self.config.workspace(&source.name);
    self.fetch(&source, &workspace).await?;

    let plan = self.detector.detect(&workspace, &prefix);
    self.prepare(&prefix)?;

    let mut dependencies = Vec::new();
    for dependency in &plan.dependencies {
      info!(name = %source.name, dependency = %dependency, "forging dependency");
      let report = Box::pin(self.forge(dependency, options))
        .await
        .map_err(|e| ForgeError::Dependency {
          name: source.name.clone(),
          dependency: dependency.clone(),
          source: Box::new(e),
        })?;
      dependencies.push(report);
    }

    self.build(&source.name, &plan, &workspace, &prefix, options).await?;

    let published = self.linker.link(&prefix, &plan.binaries).map_err(ForgeError::Link)?;

    match self.remover.remove(&workspace) {
      outcome if outcome.is_gone() => {}
      outcome => warn!(workspace = %workspace.display(), ?outcome, "workspace left behind"),
    }

    let submitted = self.auto_submit(&source);

    info!(name = %source.name, prefix = %prefix.display(), "forged");
    Ok(ForgeReport {
      name: source.name,
      prefix,
      outcome: ForgeOutcome::Built {
        detected: plan.detected.to_string(),
        steps: plan.steps.len(),
      },
      published,
      dependencies,
      submitted,
    })
  }

  /// `Some` when building can be skipped.
  async fn release_check(&self, source: &SourceTarget, prefix: &Path) -> Option<ForgeOutcome> {
    if dir_has_entries(prefix) {
      info!(name = %source.name, prefix = %prefix.display(), "already installed");
      return Some(ForgeOutcome::AlreadyInstalled);
    }

    let url = source.url.as_deref()?;
    if let Err(e) = std::fs::create_dir_all(prefix) {
      warn!(prefix = %prefix.display(), error = %e, "could not create install prefix");
      return None;
    }

    match self.releases.install_latest(url, prefix).await {
      Ok(true) => {
        info!(name = %source.name, "installed prebuilt release");
        Some(ForgeOutcome::Prebuilt)
      }
      Ok(false) => None,
      Err(e) => {
        warn!(name = %source.name, error = %e, "release check failed, building from source");
        None
      }
    }
  }

  async fn fetch(&self, source: &SourceTarget, workspace: &Path) -> Result<(), ForgeError> {
    self.prepare(workspace)?;

    match &source.kind {
      TargetKind::LocalPath(path) => {
        let copied = copy_tree(path, workspace)?;
        info!(src = %path.display(), files = copied, "copied local source");
      }
      TargetKind::Name | TargetKind::Url => {
        let url = source
          .url
          .clone()
          .ok_or_else(|| ForgeError::UnknownPackage(source.name.clone()))?;
        let dest = workspace.to_path_buf();
        info!(url = %url, dest = %dest.display(), "cloning source");
        tokio::task::spawn_blocking(move || git::clone_repo(&url, &dest, NonZeroU32::new(1)).map(|_| ()))
          .await??;
      }
    }
    Ok(())
  }

  /// Wipe and recreate a forge-owned directory.
  fn prepare(&self, dir: &Path) -> Result<(), ForgeError> {
    self.remover.recreate_dir(dir).map_err(|source| ForgeError::Unclean {
      path: dir.to_path_buf(),
      source,
    })
  }

  async fn build(
    &self,
    name: &str,
    plan: &BuildPlan,
    workspace: &Path,
    prefix: &Path,
    options: &ForgeOptions,
  ) -> Result<(), ForgeError> {
    if plan.is_empty() {
      warn!(name = %name, detected = plan.detected, "nothing to build");
      return Ok(());
    }

    let overrides = EnvOverrides {
      msvc_runtime: options.msvc_runtime,
      force_pic: options.force_pic,
    };
    let env = BuildEnv::for_host(&self.config, &overrides, &plan.metadata);
    let runner = ProcessRunner::new(workspace, prefix, env);

    info!(name = %name, detected = plan.detected, steps = plan.steps.len(), "building");
    for step in &plan.steps {
      info!(step = %step, "running build step");
      if let Err(e) = runner.run(step).await {
        let suggestions = e.stderr().map(diagnostics::analyze).unwrap_or_default();
        error!(name = %name, step = %step, error = %e, "build step failed");
        for suggestion in &suggestions {
          warn!(suggestion = %suggestion, "possible fix");
        }
        return Err(ForgeError::Build {
          name: name.to_string(),
          step: step.to_string(),
          source: e,
          suggestions,
        });
      }
    }
    Ok(())
  }

  /// Register the forged repository when the index lacks it.
  fn auto_submit(&self, source: &SourceTarget) -> Option<String> {
    if !self.config.auto_submit {
      return None;
    }
    let url = source.url.as_deref()?;

    match self.index.has_url(url) {
      Ok(true) => return None,
      Ok(false) => {}
      Err(e) => {
        warn!(url = %url, error = %e, "could not query index for auto-submit");
        return None;
      }
    }

    if let Err(e) = self.index.add_local(&source.name, url) {
      warn!(name = %source.name, error = %e, "auto-submit failed");
      return None;
    }

    match submission_link(&source.name, url) {
      Ok(link) => {
        info!(name = %source.name, link = %link, "added to local index; submit upstream with this link");
        Some(link.to_string())
      }
      Err(e) => {
        warn!(name = %source.name, error = %e, "could not build submission link");
        None
      }
    }
  }
}

fn dir_has_entries(dir: &Path) -> bool {
  std::fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}
