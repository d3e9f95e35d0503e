//! Registering repositories and sharing them with the central index.

use serde::Serialize;
use tracing::info;
use url::Url;

use crate::consts::INDEX_SUBMIT_URL;
use crate::forge::target::package_name_from_url;
use crate::forge::{Forge, ForgeError};
use crate::index::{IndexError, SearchHit};
use crate::release::ReleaseProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
  pub name: String,
  pub url: String,
  /// False when the index already knew the repository.
  pub added: bool,
  /// Prefilled "new file" page on the central registry.
  pub link: String,
}

/// Link that opens a prefilled `submissions/<name>.json` in the registry.
pub fn submission_link(name: &str, url: &str) -> Result<Url, url::ParseError> {
  let body = serde_json::json!({ "name": name, "url": url });
  let value = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
  Url::parse_with_params(
    INDEX_SUBMIT_URL,
    [
      ("filename", format!("submissions/{}.json", name)),
      ("value", value),
      ("message", format!("Add {}", name)),
    ],
  )
}

impl<R: ReleaseProvider> Forge<R> {
  /// Add `url` to the local index and produce its submission link.
  pub fn submit(&self, url: &str) -> Result<Submission, ForgeError> {
    let url = url.trim();
    if url.is_empty() {
      return Err(IndexError::EmptyUrl.into());
    }

    let name = package_name_from_url(url)?;
    let added = self.index.add_local(&name, url)?;
    let link = submission_link(&name, url)?.to_string();
    info!(name = %name, url = %url, added, "submission prepared");

    Ok(Submission {
      name,
      url: url.to_string(),
      added,
      link,
    })
  }

  pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, ForgeError> {
    Ok(self.index.search(query)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AnvilConfig;
  use crate::release::NoReleases;
  use tempfile::TempDir;

  fn forge(temp: &TempDir) -> Forge<NoReleases> {
    let config = AnvilConfig::with_root(temp.path().join("anvil"))
      .with_index_repo_url(temp.path().join("no-registry").to_string_lossy());
    Forge::open(config).unwrap().with_releases(NoReleases)
  }

  #[test]
  fn link_prefills_submission_file() {
    let link = submission_link("ripgrep", "https://github.com/BurntSushi/ripgrep").unwrap();

    assert!(link.as_str().starts_with(INDEX_SUBMIT_URL));
    let params: Vec<(String, String)> = link.query_pairs().into_owned().collect();
    assert_eq!(params[0], ("filename".into(), "submissions/ripgrep.json".into()));
    let body: serde_json::Value = serde_json::from_str(&params[1].1).unwrap();
    assert_eq!(body["url"], "https://github.com/BurntSushi/ripgrep");
    assert_eq!(params[2], ("message".into(), "Add ripgrep".into()));
  }

  #[test]
  fn submit_adds_once() {
    let temp = TempDir::new().unwrap();
    let forge = forge(&temp);

    let first = forge.submit("https://github.com/someone/widget.git").unwrap();
    assert!(first.added);
    assert_eq!(first.name, "widget");

    let again = forge.submit("git@github.com:Someone/Widget.git").unwrap();
    assert!(!again.added);

    let hits = forge.search("widget").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url.as_deref(), Some("https://github.com/someone/widget.git"));
  }

  #[test]
  fn submit_rejects_empty_url() {
    let temp = TempDir::new().unwrap();
    let err = forge(&temp).submit("   ").unwrap_err();
    assert!(matches!(err, ForgeError::Index(IndexError::EmptyUrl)));
  }
}
