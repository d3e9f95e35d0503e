mod forge;
mod housekeeping;
mod index;
mod list;
mod search;
mod submit;
mod uninstall;
mod update;

pub use forge::cmd_forge;
pub use housekeeping::cmd_housekeeping;
pub use index::{cmd_index_check, cmd_index_repair};
pub use list::cmd_list;
pub use search::cmd_search;
pub use submit::cmd_submit;
pub use uninstall::cmd_uninstall;
pub use update::cmd_update;

use anyhow::{Context, Result};
use tracing::debug;

use anvil_lib::config::AnvilConfig;
use anvil_lib::forge::Forge;

/// Open the package manager from the process environment.
fn open_forge() -> Result<Forge> {
  let config = AnvilConfig::from_env();
  debug!(root = %config.root.display(), index = %config.index_repo_url, "opening anvil root");
  Forge::open(config).context("Failed to open anvil root")
}

/// Current-thread runtime; forges never run concurrently.
fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
