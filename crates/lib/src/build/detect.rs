//! Build plan detection.
//!
//! A [`Detector`] walks a ranked list of [`Rule`]s and returns the plan of the
//! first rule that matches the source tree. Rules never combine and there is
//! no backtracking: a matching rule either produces a plan or declines, in
//! which case the next rule is tried.

use std::path::Path;

use tracing::info;

use crate::build::host::{PathToolchain, PlatformPackages, SystemPackages, Toolchain};
use crate::build::rules::default_rules;
use crate::build::BuildPlan;
use crate::platform::os::Os;

/// What a rule sees while building a plan.
pub struct DetectContext<'a> {
  pub source: &'a Path,
  pub prefix: &'a Path,
  /// Parallel job count for `-j` style flags.
  pub jobs: usize,
  pub os: Option<Os>,
  pub toolchain: &'a dyn Toolchain,
  pub packages: &'a dyn SystemPackages,
}

/// One entry of the detection registry.
#[derive(Clone, Copy)]
pub struct Rule {
  pub name: &'static str,
  /// Cheap marker check on the source tree.
  pub matches: fn(&Path) -> bool,
  /// Build the plan; `None` declines and lets later rules run.
  pub plan: fn(&DetectContext<'_>) -> Option<BuildPlan>,
}

impl std::fmt::Debug for Rule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Rule").field("name", &self.name).finish()
  }
}

pub struct Detector {
  rules: Vec<Rule>,
  toolchain: Box<dyn Toolchain>,
  packages: Box<dyn SystemPackages>,
  jobs: usize,
  os: Option<Os>,
}

impl Default for Detector {
  fn default() -> Self {
    Self::new()
  }
}

impl Detector {
  /// Detector with the built-in rules and host collaborators.
  pub fn new() -> Self {
    Self {
      rules: default_rules(),
      toolchain: Box::new(PathToolchain),
      packages: Box::new(PlatformPackages),
      jobs: parallel_jobs(),
      os: Os::current(),
    }
  }

  /// Add a rule just ahead of the catch-all fallback.
  pub fn with_rule(mut self, rule: Rule) -> Self {
    let at = self.rules.len().saturating_sub(1);
    self.rules.insert(at, rule);
    self
  }

  /// Add a rule at an explicit rank; rank 0 outranks every built-in rule.
  pub fn with_rule_at(mut self, rank: usize, rule: Rule) -> Self {
    let at = rank.min(self.rules.len());
    self.rules.insert(at, rule);
    self
  }

  pub fn with_toolchain(mut self, toolchain: impl Toolchain + 'static) -> Self {
    self.toolchain = Box::new(toolchain);
    self
  }

  pub fn with_packages(mut self, packages: impl SystemPackages + 'static) -> Self {
    self.packages = Box::new(packages);
    self
  }

  pub fn with_os(mut self, os: Option<Os>) -> Self {
    self.os = os;
    self
  }

  pub fn with_jobs(mut self, jobs: usize) -> Self {
    self.jobs = jobs.max(1);
    self
  }

  /// Rule names in rank order.
  pub fn rule_names(&self) -> Vec<&'static str> {
    self.rules.iter().map(|r| r.name).collect()
  }

  /// Plan for building `source` into `prefix`.
  pub fn detect(&self, source: &Path, prefix: &Path) -> BuildPlan {
    let ctx = DetectContext {
      source,
      prefix,
      jobs: self.jobs,
      os: self.os,
      toolchain: self.toolchain.as_ref(),
      packages: self.packages.as_ref(),
    };

    for rule in &self.rules {
      if !(rule.matches)(source) {
        continue;
      }
      if let Some(plan) = (rule.plan)(&ctx) {
        info!(rule = rule.name, steps = plan.steps.len(), source = %source.display(), "detected build system");
        return plan;
      }
    }
    BuildPlan::empty("none")
  }
}

/// Available parallelism, at least 1.
pub fn parallel_jobs() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1)
}
