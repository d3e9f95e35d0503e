//! Implementation of the `anvil forge` command.

use std::time::Instant;

use anyhow::Result;

use anvil_lib::build::MsvcRuntime;
use anvil_lib::forge::{ForgeOptions, ForgeOutcome, ForgeReport};

use crate::output::{
  OutputFormat, format_duration, print_info, print_item, print_json, print_stat, print_success, print_warning, symbols,
};

pub fn cmd_forge(
  target: &str,
  msvc_runtime: Option<MsvcRuntime>,
  force_pic: Option<bool>,
  no_release_check: bool,
  output: OutputFormat,
) -> Result<()> {
  let start = Instant::now();
  let forge = super::open_forge()?;

  let options = ForgeOptions {
    msvc_runtime,
    force_pic,
    check_release: !no_release_check,
  };

  let rt = super::runtime()?;
  let report = match rt.block_on(forge.forge(target, &options)) {
    Ok(report) => report,
    Err(e) => {
      for suggestion in e.suggestions() {
        print_warning(suggestion);
      }
      return Err(anyhow::Error::new(e).context(format!("Failed to forge '{}'", target)));
    }
  };

  if output.is_json() {
    print_json(&report)?;
    return Ok(());
  }

  print_report(&report);
  print_stat("Duration", &format_duration(start.elapsed()));
  if !forge.config().bin_on_path() {
    print_info(&format!(
      "Add {} to your PATH to use installed programs",
      forge.config().bin_dir().display()
    ));
  }
  Ok(())
}

fn print_report(report: &ForgeReport) {
  for dependency in &report.dependencies {
    print_report(dependency);
  }

  let how = match &report.outcome {
    ForgeOutcome::Built { detected, steps } => format!("built with {} ({} steps)", detected, steps),
    ForgeOutcome::AlreadyInstalled => "already installed".to_string(),
    ForgeOutcome::Prebuilt => "installed from prebuilt release".to_string(),
  };
  print_success(&format!("{} {}", report.name, how));
  print_stat("Prefix", &report.prefix.display().to_string());
  for entry in &report.published {
    print_item(symbols::ARROW, &entry.display().to_string());
  }
  if let Some(link) = &report.submitted {
    print_info(&format!("Added {} to the local index. Share it upstream:", report.name));
    println!("  {}", link);
  }
}
