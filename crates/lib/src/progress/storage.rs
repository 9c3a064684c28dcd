//! Progress storage.
//!
//! The state lives in a single JSON document under the project's
//! `third_party/.rtcbuild/` directory and is replaced atomically on every
//! write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{Milestone, PROGRESS_VERSION, ProgressError, ProgressState};
use crate::consts::PROGRESS_FILE;
use crate::layout;

#[derive(Debug, Clone)]
pub struct ProgressStore {
  base_path: PathBuf,
}

impl ProgressStore {
  pub fn new(base_path: PathBuf) -> Self {
    Self { base_path }
  }

  /// Store for a project root.
  pub fn for_root(root: &Path) -> Self {
    Self::new(layout::state_dir(root))
  }

  pub fn path(&self) -> PathBuf {
    self.base_path.join(PROGRESS_FILE)
  }

  /// Load the state. Returns an empty state if nothing was recorded yet.
  pub fn load(&self) -> Result<ProgressState, ProgressError> {
    let content = match fs::read_to_string(self.path()) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ProgressState::new()),
      Err(e) => return Err(ProgressError::Read(e)),
    };

    let state: ProgressState = serde_json::from_str(&content).map_err(ProgressError::Parse)?;
    if state.version != PROGRESS_VERSION {
      return Err(ProgressError::UnsupportedVersion(state.version));
    }

    Ok(state)
  }

  /// Write the state (temp file + rename).
  pub fn save(&self, state: &ProgressState) -> Result<(), ProgressError> {
    fs::create_dir_all(&self.base_path).map_err(ProgressError::CreateDir)?;

    let path = self.path();
    let temp_path = self.base_path.join(format!("{}.tmp", PROGRESS_FILE));

    let content = serde_json::to_string_pretty(state).map_err(ProgressError::Serialize)?;
    fs::write(&temp_path, &content).map_err(ProgressError::Write)?;
    fs::rename(&temp_path, &path).map_err(ProgressError::Write)?;

    Ok(())
  }

  /// Record a milestone and persist immediately.
  pub fn record(&self, milestone: Milestone) -> Result<ProgressState, ProgressError> {
    let mut state = self.load()?;
    state.record(milestone);
    self.save(&state)?;
    debug!(%milestone, path = %self.path().display(), "recorded milestone");
    Ok(state)
  }

  /// Forget a milestone and everything after it.
  pub fn invalidate_from(&self, milestone: Milestone) -> Result<(), ProgressError> {
    let mut state = self.load()?;
    state.invalidate_from(milestone);
    self.save(&state)
  }

  /// Delete the progress file. Missing files are not an error.
  pub fn clear(&self) -> Result<bool, ProgressError> {
    match fs::remove_file(self.path()) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(ProgressError::Write(e)),
    }
  }
}
