use anyhow::{Context, Result};

use anvil_lib::fs::RemoveOutcome;

use crate::output::{print_item, print_success, print_warning, symbols};

pub fn cmd_uninstall(name: &str) -> Result<()> {
  let forge = super::open_forge()?;
  let report = forge.uninstall(name).with_context(|| format!("Failed to uninstall '{}'", name))?;

  for entry in &report.unlinked {
    print_item(symbols::REMOVE, &entry.display().to_string());
  }
  match report.prefix {
    RemoveOutcome::Removed | RemoveOutcome::Missing => print_success(&format!("Uninstalled {}", report.name)),
    outcome => print_warning(&format!("{} unlinked, but its prefix was not removed ({:?})", report.name, outcome)),
  }
  Ok(())
}
