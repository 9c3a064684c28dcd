//! Checks deciding whether a stage's work is already done.
//!
//! A recorded milestone alone is not trusted: each gate also checks that the
//! stage's output is still on disk.

use crate::layout::ProjectLayout;
use crate::progress::{Milestone, ProgressState};

/// depot_tools has been cloned.
pub fn toolchain_ready(layout: &ProjectLayout) -> bool {
  layout.depot_tools.is_dir()
}

/// The gclient workspace is configured and has a checkout directory.
pub fn workspace_configured(layout: &ProjectLayout) -> bool {
  layout.webrtc.is_dir() && layout.gclient_file().exists() && layout.webrtc_src.is_dir()
}

/// A previous `gclient sync` completed.
///
/// Either the progress state records the sync and the checkout still exists,
/// or the legacy marker file is present.
pub fn sync_completed(layout: &ProjectLayout, state: &ProgressState) -> bool {
  let recorded = state.is_recorded(Milestone::Sync) && layout.webrtc_src.is_dir();
  recorded || layout.sync_marker().exists()
}
