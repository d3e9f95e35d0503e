//! `anvil index check` and `anvil index repair`.

use anyhow::{Context, Result};

use anvil_lib::index::IndexHealth;

use crate::output::{OutputFormat, print_json, print_success, print_warning};

pub fn cmd_index_check(output: OutputFormat) -> Result<()> {
  let forge = super::open_forge()?;
  let health = forge.index().check();

  if output.is_json() {
    return print_json(&health);
  }
  print_health(&health);
  Ok(())
}

pub fn cmd_index_repair(output: OutputFormat) -> Result<()> {
  let forge = super::open_forge()?;
  let found = forge.index().repair().context("Index repair failed")?;

  if output.is_json() {
    return print_json(&found);
  }

  if found.is_healthy() {
    print_success("Index checkout is healthy; nothing to repair");
  } else {
    for issue in &found.issues {
      print_warning(&issue.to_string());
    }
    print_success("Index checkout re-cloned");
  }
  Ok(())
}

fn print_health(health: &IndexHealth) {
  if health.is_healthy() {
    print_success("Index checkout is healthy");
    return;
  }
  for issue in &health.issues {
    print_warning(&issue.to_string());
  }
  print_warning("Run 'anvil index repair' to re-clone the checkout");
}
