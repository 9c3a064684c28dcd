//! Terminal output for rtcbuild commands.
//!
//! Status lines go to stdout, problems to stderr. Colors are applied only
//! when the stream supports them.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

/// Width of the label column in [`print_stat`].
const LABEL_WIDTH: usize = 26;

#[derive(Debug, Clone, Copy)]
enum Level {
  Success,
  Info,
  Warning,
  Error,
}

impl Level {
  fn symbol(self) -> &'static str {
    match self {
      Level::Success => "✓",
      Level::Info => "•",
      Level::Warning => "⚠",
      Level::Error => "✗",
    }
  }
}

fn emit(level: Level, message: &str) {
  let symbol = level.symbol();
  match level {
    Level::Success => println!("{} {}", symbol.if_supports_color(Stream::Stdout, |s| s.green()), message),
    Level::Info => println!("{} {}", symbol.if_supports_color(Stream::Stdout, |s| s.blue()), message),
    Level::Warning => eprintln!(
      "{} {}",
      symbol.if_supports_color(Stream::Stderr, |s| s.yellow()),
      message.if_supports_color(Stream::Stderr, |s| s.yellow())
    ),
    Level::Error => eprintln!(
      "{} {}",
      symbol.if_supports_color(Stream::Stderr, |s| s.red()),
      message.if_supports_color(Stream::Stderr, |s| s.red())
    ),
  }
}

pub fn print_success(message: &str) {
  emit(Level::Success, message);
}

pub fn print_info(message: &str) {
  emit(Level::Info, message);
}

pub fn print_warning(message: &str) {
  emit(Level::Warning, message);
}

pub fn print_error(message: &str) {
  emit(Level::Error, message);
}

/// An indented `label  value` row with the label column aligned.
pub fn print_stat(label: &str, value: &str) {
  let label = format!("{label:<LABEL_WIDTH$}");
  println!("  {} {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}

/// Compact duration: `350ms`, `4.2s`, `3m 05s`, `1h 02m`.
pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  match secs {
    0 => format!("{}ms", duration.subsec_millis()),
    1..60 => format!("{:.1}s", duration.as_secs_f64()),
    60..3600 => format!("{}m {:02}s", secs / 60, secs % 60),
    _ => format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60),
  }
}
