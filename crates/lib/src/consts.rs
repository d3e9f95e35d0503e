/// Directory name of the anvil root under the user's home.
pub const APP_DIR: &str = ".anvil";

/// Explicit per-project build description, highest detection priority.
pub const MANIFEST_FILE: &str = "anvil.json";

/// Central registry of package sources.
pub const INDEX_REPO_URL: &str = "https://github.com/sycomix/Anvil_Index.git";

/// Base URL for upstream submission links.
pub const INDEX_SUBMIT_URL: &str = "https://github.com/sycomix/Anvil_Index/new/main";

/// File name of the index store inside the index directory.
pub const INDEX_DB_FILE: &str = "index.db";

/// Seed record written into a freshly created index store.
pub const SEED_PACKAGE: (&str, &str, &str) = (
  "anvil-core",
  "https://github.com/sycomix/anvil-core.git",
  "Anvil Core",
);
