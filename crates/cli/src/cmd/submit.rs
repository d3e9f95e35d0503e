use anyhow::{Context, Result};

use crate::output::{OutputFormat, print_info, print_json, print_success};

pub fn cmd_submit(url: &str, output: OutputFormat) -> Result<()> {
  let forge = super::open_forge()?;
  let submission = forge.submit(url).context("Failed to submit repository")?;

  if output.is_json() {
    return print_json(&submission);
  }

  if submission.added {
    print_success(&format!("Added {} to the local index", submission.name));
  } else {
    print_info(&format!("{} is already indexed", submission.url));
  }
  println!("Open this link to submit it to the central index:");
  println!("  {}", submission.link);
  Ok(())
}
