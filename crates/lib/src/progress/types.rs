use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current version of the progress file format.
pub const PROGRESS_VERSION: u32 = 1;

/// Pipeline milestones that survive between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
  /// depot_tools is cloned.
  Toolchain,
  /// The gclient workspace is configured.
  Workspace,
  /// `gclient sync` completed.
  Sync,
  /// ninja produced the addon.
  Artifact,
}

impl Milestone {
  pub const ALL: [Milestone; 4] = [Self::Toolchain, Self::Workspace, Self::Sync, Self::Artifact];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Toolchain => "toolchain",
      Self::Workspace => "workspace",
      Self::Sync => "sync",
      Self::Artifact => "artifact",
    }
  }
}

impl fmt::Display for Milestone {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
  /// Unix timestamp (seconds) the milestone was reached.
  pub completed_at: u64,
}

/// Persisted pipeline progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
  pub version: u32,
  #[serde(default)]
  pub milestones: BTreeMap<Milestone, MilestoneRecord>,
}

impl Default for ProgressState {
  fn default() -> Self {
    Self {
      version: PROGRESS_VERSION,
      milestones: BTreeMap::new(),
    }
  }
}

impl ProgressState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_recorded(&self, milestone: Milestone) -> bool {
    self.milestones.contains_key(&milestone)
  }

  pub fn get(&self, milestone: Milestone) -> Option<&MilestoneRecord> {
    self.milestones.get(&milestone)
  }

  pub fn record(&mut self, milestone: Milestone) {
    self.milestones.insert(
      milestone,
      MilestoneRecord {
        completed_at: now_unix(),
      },
    );
  }

  /// Forget a milestone and every milestone after it.
  pub fn invalidate_from(&mut self, milestone: Milestone) {
    self.milestones.retain(|m, _| *m < milestone);
  }
}

fn now_unix() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or(0)
}

#[derive(Debug, Error)]
pub enum ProgressError {
  #[error("failed to create state directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to read progress file: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write progress file: {0}")]
  Write(#[source] io::Error),

  #[error("failed to parse progress file: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize progress: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("unsupported progress file version {0}")]
  UnsupportedVersion(u32),
}
