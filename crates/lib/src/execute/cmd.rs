//! Running build steps.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use crate::build::{BuildStep, NativeAction};
use crate::execute::env::BuildEnv;
use crate::execute::types::ExecuteError;

/// Runs the steps of one build in its workspace.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
  workspace: PathBuf,
  prefix: PathBuf,
  env: BuildEnv,
}

impl ProcessRunner {
  pub fn new(workspace: impl Into<PathBuf>, prefix: impl Into<PathBuf>, env: BuildEnv) -> Self {
    Self {
      workspace: workspace.into(),
      prefix: prefix.into(),
      env,
    }
  }

  pub fn workspace(&self) -> &Path {
    &self.workspace
  }

  pub fn prefix(&self) -> &Path {
    &self.prefix
  }

  pub async fn run(&self, step: &BuildStep) -> Result<(), ExecuteError> {
    match step {
      BuildStep::Shell(cmd) => self.run_shell(cmd).await.map(|_| ()),
      BuildStep::Native(action) => self.run_native(*action),
    }
  }

  /// Run a shell step, returning its trimmed stdout.
  pub async fn run_shell(&self, cmd: &str) -> Result<String, ExecuteError> {
    let cmd = self.env.rewrite(&BuildStep::render(cmd, &self.prefix));
    info!(cmd = %cmd, "executing command");

    let (shell, args) = shell();
    let mut command = Command::new(shell);
    command.args(args).arg(&cmd).current_dir(&self.workspace);
    for (key, value) in self.env.vars() {
      command.env(key, value);
    }

    debug!(shell = %shell, working_dir = ?self.workspace, "spawning process");
    let output = command.output().await.map_err(|source| ExecuteError::Spawn {
      cmd: cmd.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      return Err(ExecuteError::CommandFailed {
        cmd,
        code: output.status.code(),
        stdout,
        stderr,
      });
    }

    let stdout = stdout.trim().to_string();
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command output");
    }
    Ok(stdout)
  }

  fn run_native(&self, action: NativeAction) -> Result<(), ExecuteError> {
    action
      .run(&self.workspace, &self.prefix)
      .map(|_| ())
      .map_err(|source| ExecuteError::Native {
        action: action.name(),
        source,
      })
  }
}

/// Build shells never read user profiles.
#[cfg(unix)]
fn shell() -> (&'static str, &'static [&'static str]) {
  ("/bin/sh", &["-c"])
}

#[cfg(windows)]
fn shell() -> (&'static str, &'static [&'static str]) {
  ("cmd.exe", &["/C"])
}
