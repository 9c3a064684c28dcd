//! Project preparation run before the first pipeline stage.
//!
//! Checks node-gyp's preconditions, reads the package version and links the
//! runtime's shared gyp configuration into the project root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::ProjectLayout;

#[derive(Debug, Error)]
pub enum PrepareError {
  #[error("'{0}' not found; run node-gyp rebuild instead of invoking the build directly")]
  MissingGypConfig(PathBuf),

  #[error("failed to read '{path}': {source}")]
  ReadPackage {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse '{path}': {source}")]
  ParsePackage {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("runtime configuration not found in '{0}' (looked for include/node/common.gypi and common.gypi)")]
  MissingCommonGypi(PathBuf),

  #[error("failed to {action} '{path}': {source}")]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl PrepareError {
  fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
    let path = path.to_path_buf();
    move |source| Self::Io { action, path, source }
  }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
  version: String,
}

/// Fail unless node-gyp has configured the project.
pub fn check_gyp_config(root: &Path) -> Result<(), PrepareError> {
  let config = root.join("build").join("config.gypi");
  if !config.is_file() {
    return Err(PrepareError::MissingGypConfig(config));
  }
  Ok(())
}

/// Read `version` from the project's `package.json`.
pub fn read_package_version(root: &Path) -> Result<String, PrepareError> {
  let path = root.join("package.json");
  let content = fs::read_to_string(&path).map_err(|source| PrepareError::ReadPackage {
    path: path.clone(),
    source,
  })?;
  let manifest: PackageManifest =
    serde_json::from_str(&content).map_err(|source| PrepareError::ParsePackage { path, source })?;
  Ok(manifest.version)
}

/// Replace `<root>/nodejs.gypi` with a hard link to the runtime's
/// `common.gypi`.
///
/// Newer runtime header bundles keep the file under `include/node/`, older
/// ones at the top level.
pub fn link_common_gypi(layout: &ProjectLayout, runtime_dir: &Path) -> Result<PathBuf, PrepareError> {
  let link = layout.common_gypi_link();

  if link.symlink_metadata().is_ok() {
    fs::remove_file(&link).map_err(PrepareError::io("remove", &link))?;
  }

  let source = [
    runtime_dir.join("include").join("node").join("common.gypi"),
    runtime_dir.join("common.gypi"),
  ]
  .into_iter()
  .find(|candidate| candidate.is_file())
  .ok_or_else(|| PrepareError::MissingCommonGypi(runtime_dir.to_path_buf()))?;

  fs::hard_link(&source, &link).map_err(PrepareError::io("link", &link))?;
  debug!(source = %source.display(), link = %link.display(), "linked runtime gyp configuration");
  Ok(link)
}

/// Create `third_party/` if it does not exist.
pub fn ensure_third_party(layout: &ProjectLayout) -> Result<(), PrepareError> {
  fs::create_dir_all(&layout.third_party).map_err(PrepareError::io("create", &layout.third_party))
}

/// Remove a `webrtc.node` left over from a previous build so a failed
/// compile cannot be mistaken for a fresh one.
pub fn remove_stale_artifact(layout: &ProjectLayout) -> Result<bool, PrepareError> {
  let artifact = layout.built_artifact();
  match fs::remove_file(&artifact) {
    Ok(()) => {
      info!(path = %artifact.display(), "removed stale artifact");
      Ok(true)
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(PrepareError::io("remove", &artifact)(e)),
  }
}
