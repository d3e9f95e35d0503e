//! Prebuilt release lookup.
//!
//! Before building from source the forge asks a [`ReleaseProvider`] whether a
//! prebuilt for the current platform can be installed instead.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::fs::set_executable;
use crate::platform::Platform;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = "anvil-release-check/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ReleaseError {
  #[error("release request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("unpacking {asset} failed: {message}")]
  Unpack { asset: String, message: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
  #[serde(default)]
  pub tag_name: Option<String>,
  #[serde(default)]
  pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub browser_download_url: Option<String>,
}

/// Source of prebuilt packages.
pub trait ReleaseProvider {
  /// Install a prebuilt of the repository at `url` into `prefix`.
  ///
  /// `Ok(false)` means no suitable release exists.
  fn install_latest(&self, url: &str, prefix: &Path) -> impl Future<Output = Result<bool, ReleaseError>>;
}

/// Provider that never finds a release.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReleases;

impl ReleaseProvider for NoReleases {
  async fn install_latest(&self, _url: &str, _prefix: &Path) -> Result<bool, ReleaseError> {
    Ok(false)
  }
}

/// Latest GitHub release with a platform-matching asset.
#[derive(Debug, Clone)]
pub struct GithubReleases {
  client: reqwest::Client,
  api_base: String,
  token: Option<String>,
  platform: Option<Platform>,
}

impl Default for GithubReleases {
  fn default() -> Self {
    Self::new()
  }
}

impl GithubReleases {
  pub fn new() -> Self {
    let token = std::env::var("GITHUB_TOKEN")
      .or_else(|_| std::env::var("GH_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty());
    Self {
      client: reqwest::Client::new(),
      api_base: GITHUB_API.to_string(),
      token,
      platform: Platform::current(),
    }
  }

  pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
    self.api_base = base.into();
    self
  }

  async fn latest(&self, owner: &str, repo: &str) -> Result<Option<Release>, ReleaseError> {
    let url = format!("{}/repos/{}/{}/releases/latest", self.api_base, owner, repo);
    let mut request = self
      .client
      .get(&url)
      .header(reqwest::header::USER_AGENT, USER_AGENT)
      .timeout(REQUEST_TIMEOUT);
    if let Some(token) = &self.token {
      request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
    }

    let response = request.send().await?;
    if !response.status().is_success() {
      warn!(url = %url, status = %response.status(), "release lookup returned non-success status");
      return Ok(None);
    }
    Ok(Some(response.json::<Release>().await?))
  }

  async fn download(&self, url: &str, dest: &Path) -> Result<(), ReleaseError> {
    let response = self
      .client
      .get(url)
      .header(reqwest::header::USER_AGENT, USER_AGENT)
      .send()
      .await?
      .error_for_status()?;
    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes).await?;
    info!(path = %dest.display(), size = bytes.len(), "download complete");
    Ok(())
  }
}

impl ReleaseProvider for GithubReleases {
  async fn install_latest(&self, url: &str, prefix: &Path) -> Result<bool, ReleaseError> {
    let Some((owner, repo)) = github_owner_repo(url) else {
      debug!(url, "not a GitHub repository, skipping release lookup");
      return Ok(false);
    };
    let Some(platform) = self.platform else {
      return Ok(false);
    };
    let Some(release) = self.latest(&owner, &repo).await? else {
      return Ok(false);
    };
    let Some((asset, download_url)) = choose_asset(&release, &platform) else {
      debug!(owner = %owner, repo = %repo, platform = %platform, "no matching release asset");
      return Ok(false);
    };

    info!(asset = %asset.name, tag = ?release.tag_name, "downloading prebuilt release asset");
    let staging = tempfile::tempdir()?;
    let file = staging.path().join(&asset.name);
    self.download(download_url, &file).await?;
    install_asset(&file, prefix).await?;
    info!(repo = %repo, prefix = %prefix.display(), "installed prebuilt release");
    Ok(true)
  }
}

/// `(owner, repo)` from a GitHub URL or an `owner/repo` shorthand.
pub fn github_owner_repo(target: &str) -> Option<(String, String)> {
  let target = target.trim();
  if !target.starts_with("http") && target.matches('/').count() == 1 && !target.contains(':') {
    let (owner, repo) = target.split_once('/')?;
    return (!owner.is_empty() && !repo.is_empty()).then(|| (owner.to_string(), repo.to_string()));
  }

  let at = target.find("github.com")?;
  let rest = target[at + "github.com".len()..].trim_start_matches([':', '/']);
  let mut parts = rest.split('/');
  let owner = parts.next().filter(|o| !o.is_empty())?;
  let repo = parts.next()?.split('.').next().filter(|r| !r.is_empty())?;
  Some((owner.to_string(), repo.to_string()))
}

/// First asset that looks built for `platform` and can be downloaded.
pub fn choose_asset<'a>(release: &'a Release, platform: &Platform) -> Option<(&'a ReleaseAsset, &'a str)> {
  release.assets.iter().find_map(|asset| {
    let url = asset.browser_download_url.as_deref()?;
    platform.matches_asset(&asset.name).then_some((asset, url))
  })
}

/// Unpack an archive into `prefix`, or place a bare file in `prefix/bin`.
pub async fn install_asset(file: &Path, prefix: &Path) -> Result<PathBuf, ReleaseError> {
  tokio::fs::create_dir_all(prefix).await?;
  let name = file
    .file_name()
    .map(|n| n.to_string_lossy().to_lowercase())
    .unwrap_or_default();

  let unpack = if name.ends_with(".zip") {
    Some(("unzip", vec!["-o".into(), file.as_os_str().to_owned(), "-d".into(), prefix.as_os_str().to_owned()]))
  } else if [".tar.gz", ".tgz", ".tar.xz", ".tar.bz2", ".tar"].iter().any(|ext| name.ends_with(ext)) {
    Some(("tar", vec!["-xf".into(), file.as_os_str().to_owned(), "-C".into(), prefix.as_os_str().to_owned()]))
  } else {
    None
  };

  if let Some((program, args)) = unpack {
    let output = Command::new(program).args(&args).output().await?;
    if !output.status.success() {
      return Err(ReleaseError::Unpack {
        asset: name,
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    return Ok(prefix.to_path_buf());
  }

  let bin = prefix.join("bin");
  tokio::fs::create_dir_all(&bin).await?;
  let dest = bin.join(file.file_name().unwrap_or_default());
  tokio::fs::copy(file, &dest).await?;
  set_executable(&dest)?;
  Ok(dest)
}
