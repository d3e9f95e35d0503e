//! Errors for running build steps.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecuteError {
  /// A shell step exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CommandFailed {
    cmd: String,
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },

  /// The shell itself could not be started.
  #[error("failed to spawn `{cmd}`: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  /// A native step failed.
  #[error("{action} failed: {source}")]
  Native {
    action: &'static str,
    #[source]
    source: std::io::Error,
  },
}

impl ExecuteError {
  /// Captured stderr of a failed command, if any.
  pub fn stderr(&self) -> Option<&str> {
    match self {
      ExecuteError::CommandFailed { stderr, .. } => Some(stderr),
      _ => None,
    }
  }
}
