//! CLI output formatting utilities.
//!
//! Colored status lines, durations and JSON output shared by the commands.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

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
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const STALE: &str = "~";
}

/// Durations are shown to the millisecond.
pub fn format_duration(duration: Duration) -> String {
  let millis = Duration::from_millis(duration.as_millis() as u64);
  humantime::format_duration(millis).to_string()
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

/// An indented unit line with a status symbol.
pub fn print_unit(stale: bool, name: &str, note: &str) {
  if stale {
    println!(
      "  {} {} {}",
      symbols::STALE.if_supports_color(Stream::Stdout, |s| s.yellow()),
      name,
      note.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  } else {
    println!(
      "  {} {} {}",
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
      name,
      note.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
