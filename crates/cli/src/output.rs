//! CLI output formatting utilities.
//!
//! Status lines go to the terminal with colored symbols; `-o json` switches
//! list-style commands to machine-readable output on stdout. Errors and
//! warnings always go to stderr.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{AnsiColors, OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const REMOVE: &str = "-";
}

/// Binary units, largest first.
const UNITS: [(u64, &str); 3] = [(1 << 30, "GB"), (1 << 20, "MB"), (1 << 10, "KB")];

pub fn format_bytes(bytes: u64) -> String {
  UNITS
    .iter()
    .find(|(size, _)| bytes >= *size)
    .map(|(size, unit)| format!("{:.1} {}", bytes as f64 / *size as f64, unit))
    .unwrap_or_else(|| format!("{} B", bytes))
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  match secs {
    60.. => format!("{}m {}s", secs / 60, secs % 60),
    1.. => format!("{}.{:02}s", secs, duration.subsec_millis() / 10),
    0 => format!("{}ms", duration.subsec_millis()),
  }
}

fn status_line(stream: Stream, symbol: &str, color: AnsiColors, message: &str, tint_message: bool) {
  let symbol = symbol.if_supports_color(stream, |s| s.color(color)).to_string();
  let message = if tint_message {
    message.if_supports_color(stream, |s| s.color(color)).to_string()
  } else {
    message.to_string()
  };
  match stream {
    Stream::Stdout => println!("{} {}", symbol, message),
    _ => eprintln!("{} {}", symbol, message),
  }
}

pub fn print_success(message: &str) {
  status_line(Stream::Stdout, symbols::SUCCESS, AnsiColors::Green, message, false);
}

pub fn print_error(message: &str) {
  status_line(Stream::Stderr, symbols::ERROR, AnsiColors::Red, message, true);
}

pub fn print_warning(message: &str) {
  status_line(Stream::Stderr, symbols::WARNING, AnsiColors::Yellow, message, true);
}

pub fn print_info(message: &str) {
  status_line(Stream::Stdout, symbols::INFO, AnsiColors::Blue, message, false);
}

/// Indented `label: value` line under a status line.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

/// Indented list entry, e.g. a published or removed path.
pub fn print_item(symbol: &str, text: &str) {
  println!("  {} {}", symbol.if_supports_color(Stream::Stdout, |s| s.cyan()), text);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
