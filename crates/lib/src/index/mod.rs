//! Local package index.
//!
//! The index directory holds a checkout of the central registry and an
//! SQLite store mapping package names to repository URLs. Opening the index
//! never fails because the registry is unreachable: the clone is best-effort
//! and a fresh store is seeded locally.

pub mod normalize;
pub mod registry;
pub mod store;

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::config::AnvilConfig;
use crate::fs::SafeRemover;
use crate::git::FetchError;

pub use normalize::normalize_url;
pub use registry::{IndexHealth, IndexIssue, Registry, UpdateOutcome};
pub use store::{IndexStore, LOCAL_DESCRIPTION, SearchHit};

#[derive(Debug, Error)]
pub enum IndexError {
  #[error("index database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("URL cannot be empty when adding to the index")]
  EmptyUrl,

  #[error("registry clone failed: {0}")]
  Fetch(#[from] FetchError),
}

fn is_missing_or_empty(dir: &Path) -> bool {
  std::fs::read_dir(dir).map_or(true, |mut entries| entries.next().is_none())
}

#[derive(Debug, Clone)]
pub struct PackageIndex {
  registry: Registry,
  store: IndexStore,
}

impl PackageIndex {
  /// Open the index, creating and seeding it when absent.
  pub fn open(config: &AnvilConfig) -> Result<Self, IndexError> {
    let registry = Registry::new(
      config.index_dir(),
      config.index_repo_url.clone(),
      SafeRemover::for_config(config),
    );

    if is_missing_or_empty(registry.dir()) {
      std::fs::create_dir_all(registry.dir())?;
      if let Err(e) = registry.clone_into_empty() {
        warn!(error = %e, "could not clone central index, continuing offline");
      }
      // A failed clone may remove the directory it created.
      std::fs::create_dir_all(registry.dir())?;
    }

    let store = IndexStore::new(config.index_db());
    if !store.path().exists() {
      store.bootstrap()?;
    } else if let Err(e) = store.migrate() {
      warn!(error = %e, "index schema migration failed");
    }

    Ok(Self { registry, store })
  }

  pub fn dir(&self) -> &Path {
    self.registry.dir()
  }

  pub fn store(&self) -> &IndexStore {
    &self.store
  }

  pub fn get_url(&self, name: &str) -> Result<Option<String>, IndexError> {
    self.store.get_url(name)
  }

  pub fn has_url(&self, url: &str) -> Result<bool, IndexError> {
    self.store.has_url(url)
  }

  pub fn add_local(&self, name: &str, url: &str) -> Result<bool, IndexError> {
    self.store.add_local(name, url)
  }

  pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, IndexError> {
    self.store.search(query)
  }

  pub fn update(&self) -> UpdateOutcome {
    self.registry.update()
  }

  pub fn check(&self) -> IndexHealth {
    self.registry.check()
  }

  pub fn repair(&self) -> Result<IndexHealth, IndexError> {
    self.registry.repair()
  }
}
