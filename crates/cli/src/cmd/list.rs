use anyhow::Result;

use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_list(output: OutputFormat) -> Result<()> {
  let forge = super::open_forge()?;
  let installed = forge.list()?;

  if output.is_json() {
    return print_json(&installed);
  }

  if installed.is_empty() {
    print_info("No packages installed");
  }
  for name in &installed {
    println!("{}", name);
  }
  Ok(())
}
