//! Build settings.
//!
//! Every field has a default matching the pinned upstream revision and the
//! artifact server layout. A project can override any subset by placing a
//! `rtcbuild.json` file in its root:
//!
//! ```json
//! { "webrtc_revision": "6294a7eb71c891e9ea41273a7a94113f6802d0da", "use_x11": true }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::SETTINGS_FILE;

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read settings file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse settings file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Git URL of the depot_tools repository.
  pub depot_tools_repo: String,
  /// Git URL of the WebRTC repository tracked by gclient.
  pub webrtc_repo: String,
  /// Commit of `webrtc_repo` the workspace is pinned to.
  pub webrtc_revision: String,
  /// Base URL the artifact is uploaded under (must end with `/`).
  pub upload_base_url: String,
  pub upload_user: String,
  /// Environment variable holding the upload password.
  pub credentials_var: String,
  pub use_openssl: bool,
  pub use_gtk: bool,
  pub use_x11: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      depot_tools_repo: "https://chromium.googlesource.com/chromium/tools/depot_tools.git".to_string(),
      webrtc_repo: "https://chromium.googlesource.com/external/webrtc.git".to_string(),
      webrtc_revision: "6294a7eb71c891e9ea41273a7a94113f6802d0da".to_string(),
      upload_base_url: "http://cide.cc:8080/webrtc/".to_string(),
      upload_user: "cIDE".to_string(),
      credentials_var: "CIDE_CREDENTIALS".to_string(),
      use_openssl: false,
      use_gtk: false,
      use_x11: false,
    }
  }
}

impl Settings {
  /// Load settings for a project root, falling back to defaults when no
  /// override file exists.
  pub fn load(root: &Path) -> Result<Self, SettingsError> {
    let path = root.join(SETTINGS_FILE);

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => return Err(SettingsError::Read { path, source }),
    };

    debug!(path = %path.display(), "loading settings override");
    serde_json::from_str(&content).map_err(|source| SettingsError::Parse { path, source })
  }

  /// The `<url>@<commit>` solution handed to `gclient config`.
  pub fn webrtc_solution(&self) -> String {
    format!("{}@{}", self.webrtc_repo, self.webrtc_revision)
  }
}
