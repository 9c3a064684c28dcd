//! Types for stage subprocess execution.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running a stage's subprocess.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The program could not be started at all.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("'{command}' exited with {}", describe_code(.code))]
  Failed { command: String, code: Option<i32> },
}

fn describe_code(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "a signal".to_string(),
  }
}

/// One external command run by a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
  pub program: PathBuf,
  pub args: Vec<String>,
  /// Working directory of the subprocess.
  pub cwd: PathBuf,
}

impl StageCommand {
  pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: cwd.into(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  /// File name of the program (`gclient` for `/x/depot_tools/gclient`).
  pub fn program_name(&self) -> String {
    self
      .program
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.program.display().to_string())
  }
}

impl fmt::Display for StageCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program_name())?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}
