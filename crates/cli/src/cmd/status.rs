//! Status command implementation.
//!
//! Displays which milestones of the build have been recorded for a project.

use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use anyhow::{Context, Result};

use rtcbuild_lib::layout;
use rtcbuild_lib::lock::{LockMode, ProjectLock};
use rtcbuild_lib::progress::{Milestone, ProgressStore};

use super::project_root;
use crate::output::{print_info, print_json, print_stat, print_success, print_warning};

pub fn cmd_status(root: &Path, json: bool) -> Result<()> {
  let root = project_root(root);
  let store = ProgressStore::for_root(&root);
  let legacy_marker = layout::sync_marker(&root).exists();

  let state = if store.path().exists() {
    let _lock = ProjectLock::acquire(&root, LockMode::Shared, "status")?;
    store.load().context("Failed to load progress")?
  } else {
    Default::default()
  };

  if json {
    let milestones: serde_json::Map<_, _> = Milestone::ALL
      .iter()
      .map(|m| {
        let completed_at = state.get(*m).map(|r| r.completed_at);
        (m.as_str().to_string(), serde_json::json!(completed_at))
      })
      .collect();
    let json_output = serde_json::json!({
      "root": root,
      "version": state.version,
      "milestones": milestones,
      "legacy_sync_marker": legacy_marker,
    });
    return print_json(&json_output);
  }

  if state.milestones.is_empty() && !legacy_marker {
    print_info("No progress recorded. Run 'rtcbuild build' to start.");
    return Ok(());
  }

  print_success(&format!("Progress for {}", root.display()));
  for milestone in Milestone::ALL {
    let value = match state.get(milestone) {
      Some(record) => {
        let completed = UNIX_EPOCH + Duration::from_secs(record.completed_at);
        humantime::format_rfc3339_seconds(completed).to_string()
      }
      None => "pending".to_string(),
    };
    print_stat(milestone.as_str(), &value);
  }

  if legacy_marker && !state.is_recorded(Milestone::Sync) {
    println!();
    print_warning("Legacy sync marker present; sources are treated as synced");
  }

  Ok(())
}
