//! Subprocess runner.
//!
//! Stages never spawn processes directly; they hand a [`StageCommand`] to a
//! [`CommandRunner`]. [`SystemRunner`] is the real implementation.

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use super::types::{ExecuteError, StageCommand};
use crate::env::BuildEnvironment;

/// Runs a stage's command to completion.
pub trait CommandRunner {
  /// Run `command` with exactly the variables in `env`.
  ///
  /// Resolves to `Ok(())` only for a zero exit status.
  fn run(
    &self,
    command: &StageCommand,
    env: &BuildEnvironment,
  ) -> impl Future<Output = Result<(), ExecuteError>> + Send;
}

/// Spawns real processes with inherited stdio.
///
/// Output is streamed straight to the console and never captured. There is
/// no timeout: a hung tool hangs the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  async fn run(&self, command: &StageCommand, env: &BuildEnvironment) -> Result<(), ExecuteError> {
    info!(command = %command, cwd = %command.cwd.display(), "running");

    let mut process = Command::new(&command.program);
    process
      .args(&command.args)
      .current_dir(&command.cwd)
      .env_clear()
      .envs(env.iter())
      .stdin(Stdio::inherit())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit());

    debug!(program = %command.program.display(), "spawning process");

    let status = process.status().await.map_err(|source| ExecuteError::Spawn {
      program: command.program.display().to_string(),
      source,
    })?;

    if !status.success() {
      return Err(ExecuteError::Failed {
        command: command.to_string(),
        code: status.code(),
      });
    }

    debug!(command = %command, "process exited successfully");
    Ok(())
  }
}
