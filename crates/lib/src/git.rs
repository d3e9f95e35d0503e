//! Git access for the registry checkout and remote sources.
//!
//! Clones and repository inspection go through `gix`; `git pull` runs the
//! git binary.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::process::Command;

use gix::remote::Direction;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to create directory '{0}': {1}")]
  CreateDir(PathBuf, #[source] std::io::Error),

  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to checkout '{url}': {source}")]
  Checkout {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  #[error("git pull failed in '{path}': {message}")]
  Pull { path: PathBuf, message: String },
}

/// Clone `url` into `dest`, optionally truncating history to `depth` commits.
pub fn clone_repo(url: &str, dest: &Path, depth: Option<NonZeroU32>) -> Result<gix::Repository, FetchError> {
  std::fs::create_dir_all(dest).map_err(|e| FetchError::CreateDir(dest.to_path_buf(), e))?;
  info!(url, path = %dest.display(), depth = depth.map(|d| d.get()), "cloning repository");

  let mut prepared = gix::prepare_clone(url, dest).map_err(|e| FetchError::Clone {
    url: url.to_string(),
    source: Box::new(e),
  })?;
  if let Some(depth) = depth {
    prepared = prepared.with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(depth));
  }

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  let (repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Checkout {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  Ok(repo)
}

pub fn open_repo(path: &Path) -> Result<gix::Repository, FetchError> {
  gix::open(path).map_err(|e| FetchError::Open {
    path: path.to_path_buf(),
    source: Box::new(e),
  })
}

/// Fetch URL of the `origin` remote (or the default fetch remote) of the
/// repository at `path`.
pub fn origin_url(path: &Path) -> Option<String> {
  let repo = gix::open(path).ok()?;
  let remote = match repo.find_remote("origin") {
    Ok(remote) => remote,
    Err(_) => repo.find_default_remote(Direction::Fetch)?.ok()?,
  };
  let url = remote.url(Direction::Fetch)?.to_bstring().to_string();
  debug!(path = %path.display(), url = %url, "read remote url");
  Some(url)
}

/// Fast-forward the checkout at `path` from its upstream.
pub fn pull(path: &Path) -> Result<(), FetchError> {
  debug!(path = %path.display(), "pulling");
  let output = Command::new("git")
    .args(["pull", "--ff-only"])
    .current_dir(path)
    .output()
    .map_err(|e| FetchError::Pull {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

  if !output.status.success() {
    return Err(FetchError::Pull {
      path: path.to_path_buf(),
      message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }
  Ok(())
}
