use std::time::Instant;

use anyhow::{Context, Result};

use crate::output::{OutputFormat, format_bytes, format_duration, print_json, print_stat, print_success};

pub fn cmd_housekeeping(output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let forge = super::open_forge()?;
  let report = forge.housekeeping().context("Housekeeping failed")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_success("Housekeeping complete!");
    print_stat("Workspaces removed", &report.stats.workspaces_removed.to_string());
    print_stat("Entry points removed", &report.stats.links_removed.to_string());
    print_stat("Space freed", &format_bytes(report.stats.bytes_freed));
    print_stat("Duration", &format_duration(start.elapsed()));
  }
  Ok(())
}
