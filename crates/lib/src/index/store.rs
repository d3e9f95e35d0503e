//! SQLite-backed repository records.
//!
//! Every operation opens its own short-lived connection.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info};

use crate::consts::SEED_PACKAGE;
use crate::index::IndexError;
use crate::index::normalize::normalize_url;

/// Description stored for records added from this machine.
pub const LOCAL_DESCRIPTION: &str = "User added";

/// A search result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
  pub name: String,
  pub description: Option<String>,
  pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndexStore {
  path: PathBuf,
}

impl IndexStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn connection(&self) -> Result<Connection, IndexError> {
    Ok(Connection::open(&self.path)?)
  }

  /// Create the schema and the seed record.
  pub fn bootstrap(&self) -> Result<(), IndexError> {
    let conn = self.connection()?;
    conn.execute_batch(
      r#"
      CREATE TABLE IF NOT EXISTS repositories (
        name TEXT PRIMARY KEY,
        url TEXT,
        normalized_url TEXT,
        description TEXT
      );
      CREATE INDEX IF NOT EXISTS idx_repositories_normalized_url ON repositories(normalized_url);
      "#,
    )?;
    let (name, url, description) = SEED_PACKAGE;
    conn.execute(
      "INSERT OR IGNORE INTO repositories (name, url, normalized_url, description) VALUES (?1, ?2, ?3, ?4)",
      params![name, url, normalize_url(url), description],
    )?;
    info!(path = %self.path.display(), "created index database");
    Ok(())
  }

  /// Add and backfill `normalized_url` on stores created without it.
  pub fn migrate(&self) -> Result<bool, IndexError> {
    let mut conn = self.connection()?;
    let columns = {
      let mut stmt = conn.prepare("PRAGMA table_info(repositories)")?;
      stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?
    };
    if columns.iter().any(|c| c == "normalized_url") {
      return Ok(false);
    }

    let tx = conn.transaction()?;
    tx.execute("ALTER TABLE repositories ADD COLUMN normalized_url TEXT", [])?;
    let rows = {
      let mut stmt = tx.prepare("SELECT name, url FROM repositories")?;
      stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?
    };
    for (name, url) in &rows {
      let normalized = url.as_deref().filter(|u| !u.is_empty()).map(normalize_url);
      tx.execute(
        "UPDATE repositories SET normalized_url = ?1 WHERE name = ?2",
        params![normalized, name],
      )?;
    }
    tx.execute(
      "CREATE INDEX IF NOT EXISTS idx_repositories_normalized_url ON repositories(normalized_url)",
      [],
    )?;
    tx.commit()?;

    info!(records = rows.len(), "migrated index schema");
    Ok(true)
  }

  pub fn get_url(&self, name: &str) -> Result<Option<String>, IndexError> {
    let conn = self.connection()?;
    let url = conn
      .query_row("SELECT url FROM repositories WHERE name = ?1", params![name], |row| {
        row.get::<_, Option<String>>(0)
      })
      .optional()?;
    Ok(url.flatten())
  }

  /// Whether any record denotes the same repository as `url`.
  ///
  /// Scans every row and compares both the stored normalized value and the
  /// re-normalized raw url, so rows written by older clients still match.
  pub fn has_url(&self, url: &str) -> Result<bool, IndexError> {
    if url.trim().is_empty() {
      return Ok(false);
    }
    let wanted = normalize_url(url);
    let conn = self.connection()?;
    let mut stmt = conn.prepare("SELECT normalized_url, url FROM repositories")?;
    let rows = stmt.query_map([], |row| {
      Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    for row in rows {
      let (stored, raw) = row?;
      if stored.as_deref().is_some_and(|s| !s.is_empty() && s == wanted) {
        return Ok(true);
      }
      if raw.as_deref().is_some_and(|r| !r.is_empty() && normalize_url(r) == wanted) {
        return Ok(true);
      }
    }
    Ok(false)
  }

  /// Record `url` under `name` unless the repository is already indexed.
  ///
  /// Returns whether a row was written.
  pub fn add_local(&self, name: &str, url: &str) -> Result<bool, IndexError> {
    if url.trim().is_empty() {
      return Err(IndexError::EmptyUrl);
    }
    if self.has_url(url)? {
      debug!(name, url, "repository already indexed");
      return Ok(false);
    }

    let conn = self.connection()?;
    conn.execute(
      "INSERT OR REPLACE INTO repositories (name, url, normalized_url, description) VALUES (?1, ?2, ?3, ?4)",
      params![name, url, normalize_url(url), LOCAL_DESCRIPTION],
    )?;
    info!(name, url, "added repository to local index");
    Ok(true)
  }

  /// Records whose name or description contains `query`.
  pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, IndexError> {
    let conn = self.connection()?;
    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(
      "SELECT name, description, url FROM repositories WHERE name LIKE ?1 OR description LIKE ?1 ORDER BY name",
    )?;
    let hits = stmt
      .query_map(params![pattern], |row| {
        Ok(SearchHit {
          name: row.get(0)?,
          description: row.get(1)?,
          url: row.get(2)?,
        })
      })?
      .collect::<Result<Vec<_>, _>>()?;
    Ok(hits)
  }
}
