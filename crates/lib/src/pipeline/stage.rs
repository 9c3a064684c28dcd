use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::execute::ExecuteError;
use crate::install::{InstallError, UploadOutcome};
use crate::prepare::PrepareError;
use crate::progress::ProgressError;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
  EnsureToolchain,
  EnsureWorkspaceConfig,
  DeriveBuildEnvironment,
  SyncSources,
  GenerateBuildFiles,
  Compile,
  InstallArtifact,
}

impl Stage {
  pub const ALL: [Stage; 7] = [
    Self::EnsureToolchain,
    Self::EnsureWorkspaceConfig,
    Self::DeriveBuildEnvironment,
    Self::SyncSources,
    Self::GenerateBuildFiles,
    Self::Compile,
    Self::InstallArtifact,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::EnsureToolchain => "ensure-toolchain",
      Self::EnsureWorkspaceConfig => "ensure-workspace-config",
      Self::DeriveBuildEnvironment => "derive-build-environment",
      Self::SyncSources => "sync-sources",
      Self::GenerateBuildFiles => "generate-build-files",
      Self::Compile => "compile",
      Self::InstallArtifact => "install-artifact",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// How a stage finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
  /// The stage's subprocess ran and exited with 0.
  Ran,
  /// A verified earlier result made the subprocess unnecessary.
  Skipped,
  /// In-process work only (environment derivation).
  Completed,
  /// The artifact was installed; carries what happened to the upload.
  Installed(UploadOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
  pub stage: Stage,
  pub outcome: StageOutcome,
  pub elapsed: Duration,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
  pub stages: Vec<StageReport>,
}

impl PipelineReport {
  pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
    self.stages.iter().find(|r| r.stage == stage).map(|r| &r.outcome)
  }

  pub fn elapsed(&self) -> Duration {
    self.stages.iter().map(|r| r.elapsed).sum()
  }
}

/// Why a single stage failed.
#[derive(Debug, Error)]
pub enum StageError {
  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error(transparent)]
  Progress(#[from] ProgressError),

  #[error(transparent)]
  Prepare(#[from] PrepareError),

  #[error(transparent)]
  Install(#[from] InstallError),

  #[error("failed to {action} '{path}': {source}")]
  Io {
    action: &'static str,
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A run stopped at `stage`.
#[derive(Debug, Error)]
#[error("stage {stage} failed: {source}")]
pub struct PipelineError {
  pub stage: Stage,
  #[source]
  pub source: StageError,
}
