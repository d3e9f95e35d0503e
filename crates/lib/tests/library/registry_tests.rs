//! Central registry lifecycle against a local git repository.

use std::path::{Path, PathBuf};
use std::process::Command;

use anvil_lib::config::AnvilConfig;
use anvil_lib::forge::Forge;
use anvil_lib::index::{IndexIssue, PackageIndex, UpdateOutcome};
use anvil_lib::release::NoReleases;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
  let status = Command::new("git")
    .args(["-c", "user.name=anvil", "-c", "user.email=anvil@example.com"])
    .args(args)
    .current_dir(dir)
    .status()
    .unwrap();
  assert!(status.success(), "git {args:?} failed");
}

fn commit_file(repo: &Path, file: &str, content: &str) {
  std::fs::write(repo.join(file), content).unwrap();
  git(repo, &["add", file]);
  git(repo, &["commit", "-q", "-m", file]);
}

/// A registry repository with one committed file.
fn registry(temp: &TempDir) -> PathBuf {
  let repo = temp.path().join("registry");
  std::fs::create_dir_all(&repo).unwrap();
  git(&repo, &["init", "-q"]);
  commit_file(&repo, "packages.txt", "anvil-core\n");
  repo
}

fn config(temp: &TempDir, registry: &Path) -> AnvilConfig {
  AnvilConfig::with_root(temp.path().join("anvil"))
    .with_index_repo_url(registry.to_string_lossy())
    .with_auto_submit(false)
}

#[test]
fn first_forge_open_clones_registry() {
  let temp = TempDir::new().unwrap();
  let registry = registry(&temp);

  let forge = Forge::open(config(&temp, &registry)).unwrap().with_releases(NoReleases);

  let index_dir = forge.config().index_dir();
  assert!(index_dir.join(".git").is_dir());
  assert!(index_dir.join("packages.txt").is_file());
  assert!(forge.config().index_db().is_file());
  assert!(forge.index().check().is_healthy());
}

#[test]
fn empty_index_directory_is_cloned() {
  let temp = TempDir::new().unwrap();
  let registry = registry(&temp);
  let config = config(&temp, &registry);
  std::fs::create_dir_all(config.index_dir()).unwrap();

  PackageIndex::open(&config).unwrap();

  assert!(config.index_dir().join(".git").is_dir());
}

#[test]
fn update_pulls_new_commits() {
  let temp = TempDir::new().unwrap();
  let registry = registry(&temp);
  let config = config(&temp, &registry);
  let index = PackageIndex::open(&config).unwrap();
  commit_file(&registry, "more.txt", "zlib\n");

  assert_eq!(index.update(), UpdateOutcome::Pulled);
  assert_eq!(
    std::fs::read_to_string(config.index_dir().join("more.txt")).unwrap(),
    "zlib\n"
  );
}

#[test]
fn repair_restores_checkout_and_keeps_store() {
  let temp = TempDir::new().unwrap();
  let registry = registry(&temp);
  let config = config(&temp, &registry);
  let index = PackageIndex::open(&config).unwrap();
  index.add_local("mine", "https://github.com/me/mine").unwrap();

  let git_dir = config.index_dir().join(".git");
  std::fs::remove_dir_all(&git_dir).unwrap();
  std::fs::write(&git_dir, "gitdir: nowhere\n").unwrap();
  assert!(index.check().issues.contains(&IndexIssue::GitMarkerIsFile));

  index.repair().unwrap();

  assert!(git_dir.is_dir());
  assert!(config.index_dir().join("packages.txt").is_file());
  assert!(index.check().is_healthy());
  assert_eq!(
    index.get_url("mine").unwrap().as_deref(),
    Some("https://github.com/me/mine")
  );
}

#[test]
fn update_repairs_broken_checkout() {
  let temp = TempDir::new().unwrap();
  let registry = registry(&temp);
  let config = config(&temp, &registry);
  let index = PackageIndex::open(&config).unwrap();
  let git_dir = config.index_dir().join(".git");
  std::fs::remove_dir_all(&git_dir).unwrap();
  std::fs::write(&git_dir, "gitdir: nowhere\n").unwrap();

  let outcome = index.update();

  assert!(matches!(outcome, UpdateOutcome::Repaired(_)), "got {outcome:?}");
  assert!(git_dir.is_dir());
}
