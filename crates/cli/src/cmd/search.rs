use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_search(query: &str, output: OutputFormat) -> Result<()> {
  let forge = super::open_forge()?;
  let hits = forge.search(query).context("Failed to search index")?;

  if output.is_json() {
    return print_json(&hits);
  }

  if hits.is_empty() {
    print_info(&format!("No packages matching '{}'", query));
    return Ok(());
  }

  for hit in &hits {
    println!(
      "{}  {}",
      hit.name.if_supports_color(Stream::Stdout, |s| s.bold()),
      hit.description.as_deref().unwrap_or("")
    );
    if let Some(url) = &hit.url {
      println!("    {}", url.if_supports_color(Stream::Stdout, |s| s.dimmed()));
    }
  }
  Ok(())
}
