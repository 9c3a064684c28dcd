//! Implementation of the `rtcbuild reset` command.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use rtcbuild_lib::layout;
use rtcbuild_lib::lock::{LockMode, ProjectLock};
use rtcbuild_lib::progress::ProgressStore;

use super::project_root;
use crate::output::{print_info, print_success};
use crate::prompts::confirm;

/// Forget recorded progress and the legacy sync marker.
///
/// Checkouts under `third_party/` are left alone; the next build verifies
/// them again before skipping anything.
pub fn cmd_reset(root: &Path, force: bool) -> Result<()> {
  let root = project_root(root);
  let store = ProgressStore::for_root(&root);
  let marker = layout::sync_marker(&root);

  if !store.path().exists() && !marker.exists() {
    print_info("Nothing to reset");
    return Ok(());
  }

  if !confirm(&format!("Reset build progress for {}?", root.display()), force)? {
    print_info("Aborted");
    return Ok(());
  }

  let _lock = ProjectLock::acquire(&root, LockMode::Exclusive, "reset")?;

  let cleared = store.clear().context("Failed to remove progress file")?;
  let marker_removed = match fs::remove_file(&marker) {
    Ok(()) => true,
    Err(e) if e.kind() == io::ErrorKind::NotFound => false,
    Err(e) => return Err(e).with_context(|| format!("Failed to remove {}", marker.display())),
  };

  info!(cleared, marker_removed, "progress reset");
  print_success("Progress reset");

  Ok(())
}
