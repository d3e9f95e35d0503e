//! Implementation of the `anvil update` command.

use anyhow::Result;

use anvil_lib::index::UpdateOutcome;

use crate::output::{print_error, print_info, print_success, print_warning};

/// Sync the registry checkout. Sync problems are reported, never fatal.
pub fn cmd_update() -> Result<()> {
  let forge = super::open_forge()?;

  match forge.index().update() {
    UpdateOutcome::Pulled => print_success("Index updated"),
    UpdateOutcome::NoCheckout => print_info("No index checkout; nothing to update"),
    UpdateOutcome::PullFailed(message) => print_warning(&format!("Index update failed: {}", message)),
    UpdateOutcome::Repaired(health) => {
      for issue in &health.issues {
        print_warning(&issue.to_string());
      }
      print_success("Index checkout was invalid and has been re-cloned");
    }
    UpdateOutcome::RepairFailed { health, message } => {
      for issue in &health.issues {
        print_warning(&issue.to_string());
      }
      print_error(&format!("Index repair failed: {}", message));
    }
  }
  Ok(())
}
