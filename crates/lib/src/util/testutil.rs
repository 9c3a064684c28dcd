//! Test utilities for rtcbuild-lib.

use std::path::Path;
use std::sync::Mutex;

use crate::env::BuildEnvironment;
use crate::execute::{CommandRunner, ExecuteError, StageCommand};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Create an empty file, including parent directories.
pub fn touch(path: &Path) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, "").unwrap();
}

/// A command the fake runner was asked to run, with the environment it got.
#[derive(Debug, Clone)]
pub struct Recorded {
  pub command: StageCommand,
  pub env: BuildEnvironment,
}

impl Recorded {
  /// Program file name followed by the first argument, e.g. `gclient sync`.
  pub fn head(&self) -> String {
    match self.command.args.first() {
      Some(arg) => format!("{} {}", self.command.program_name(), arg),
      None => self.command.program_name(),
    }
  }
}

/// Runner that records commands instead of spawning them.
///
/// Commands whose program name matches `fail_on` exit with code 1; `effect`
/// runs for every successful command so tests can simulate tool output.
#[derive(Default)]
pub struct FakeRunner {
  pub calls: Mutex<Vec<Recorded>>,
  fail_on: Option<String>,
  effect: Option<Box<dyn Fn(&StageCommand) + Send + Sync>>,
}

impl FakeRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_on(program: &str) -> Self {
    Self {
      fail_on: Some(program.to_string()),
      ..Self::default()
    }
  }

  pub fn with_effect(mut self, effect: impl Fn(&StageCommand) + Send + Sync + 'static) -> Self {
    self.effect = Some(Box::new(effect));
    self
  }

  pub fn heads(&self) -> Vec<String> {
    self.calls.lock().unwrap().iter().map(Recorded::head).collect()
  }

  pub fn recorded(&self) -> Vec<Recorded> {
    self.calls.lock().unwrap().clone()
  }
}

impl CommandRunner for FakeRunner {
  async fn run(&self, command: &StageCommand, env: &BuildEnvironment) -> Result<(), ExecuteError> {
    self.calls.lock().unwrap().push(Recorded {
      command: command.clone(),
      env: env.clone(),
    });

    if self.fail_on.as_deref() == Some(command.program_name().as_str()) {
      return Err(ExecuteError::Failed {
        command: command.to_string(),
        code: Some(1),
      });
    }

    if let Some(effect) = &self.effect {
      effect(command);
    }
    Ok(())
  }
}
