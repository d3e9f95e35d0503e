//! Host collaborators consulted during detection.

use std::path::PathBuf;
use std::process::Command;

use tracing::{info, warn};

use crate::execute::ExecuteError;
use crate::platform::os::Os;

/// Finds toolchain binaries.
pub trait Toolchain {
  fn find(&self, program: &str) -> Option<PathBuf>;
}

/// Looks programs up on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathToolchain;

impl Toolchain for PathToolchain {
  fn find(&self, program: &str) -> Option<PathBuf> {
    which::which(program).ok()
  }
}

/// Installs system-level build prerequisites.
pub trait SystemPackages {
  fn install(&self, packages: &[String]) -> Result<(), ExecuteError>;
}

/// apt on Linux, Homebrew on macOS, Chocolatey on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformPackages;

impl PlatformPackages {
  pub fn command_for(os: Os, packages: &[String]) -> String {
    let list = packages.join(" ");
    match os {
      Os::Linux => format!("sudo apt-get update && sudo apt-get install -y {}", list),
      Os::MacOs => format!("brew install {}", list),
      Os::Windows => format!("choco install -y {}", list),
    }
  }
}

impl SystemPackages for PlatformPackages {
  fn install(&self, packages: &[String]) -> Result<(), ExecuteError> {
    if packages.is_empty() {
      return Ok(());
    }
    let Some(os) = Os::current() else {
      warn!("unknown platform, skipping build dependency installation");
      return Ok(());
    };

    let cmd = Self::command_for(os, packages);
    info!(packages = ?packages, cmd = %cmd, "installing build dependencies");

    let mut command = if cfg!(windows) {
      let mut c = Command::new("cmd.exe");
      c.arg("/C");
      c
    } else {
      let mut c = Command::new("/bin/sh");
      c.arg("-c");
      c
    };
    let output = command.arg(&cmd).output().map_err(|source| ExecuteError::Spawn {
      cmd: cmd.clone(),
      source,
    })?;

    if !output.status.success() {
      return Err(ExecuteError::CommandFailed {
        cmd,
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      });
    }
    Ok(())
  }
}
