//! Filesystem layout of a project and its third-party checkouts.
//!
//! ```text
//! {root}/
//! ├── build/config.gypi         # written by node-gyp, required
//! ├── build/{config}/webrtc.node
//! ├── nodejs.gypi               # hard link to the runtime's common.gypi
//! └── third_party/
//!     ├── .rtcbuild/progress.json
//!     ├── webrtc_sync           # legacy sync marker
//!     ├── depot_tools/
//!     └── webrtc/
//!         ├── .gclient
//!         └── src/out/{config}/webrtc.node
//! ```

use std::path::{Path, PathBuf};

use crate::consts::{
  ARTIFACT_NAME, DEPOT_TOOLS_DIR, GCLIENT_FILE, STATE_DIR, SYNC_MARKER, THIRD_PARTY_DIR, WEBRTC_DIR, WEBRTC_SRC_DIR,
};
use crate::platform::Os;
use crate::target::BuildTarget;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
  pub root: PathBuf,
  pub third_party: PathBuf,
  pub depot_tools: PathBuf,
  pub webrtc: PathBuf,
  pub webrtc_src: PathBuf,
  /// ninja output directory, e.g. `webrtc/src/out/Release`.
  pub out_dir: PathBuf,
  out_dir_name: String,
  os: Os,
}

impl ProjectLayout {
  pub fn new(root: &Path, target: &BuildTarget) -> Self {
    let third_party = root.join(THIRD_PARTY_DIR);
    let webrtc = third_party.join(WEBRTC_DIR);
    let webrtc_src = webrtc.join(WEBRTC_SRC_DIR);
    let out_dir_name = target.out_dir_name();

    Self {
      root: root.to_path_buf(),
      depot_tools: third_party.join(DEPOT_TOOLS_DIR),
      out_dir: webrtc_src.join("out").join(&out_dir_name),
      third_party,
      webrtc,
      webrtc_src,
      out_dir_name,
      os: target.platform,
    }
  }

  /// ninja output directory relative to `webrtc/src`, as `gn gen` expects it.
  pub fn out_dir_relative(&self) -> String {
    format!("out/{}", self.out_dir_name)
  }

  pub fn gclient_file(&self) -> PathBuf {
    self.webrtc.join(GCLIENT_FILE)
  }

  /// Path of the `gclient` script inside depot_tools.
  pub fn gclient(&self) -> PathBuf {
    self.depot_tools.join(self.os.script_name("gclient"))
  }

  pub fn sync_marker(&self) -> PathBuf {
    self.third_party.join(SYNC_MARKER)
  }

  pub fn built_artifact(&self) -> PathBuf {
    self.out_dir.join(ARTIFACT_NAME)
  }

  pub fn common_gypi_link(&self) -> PathBuf {
    self.root.join("nodejs.gypi")
  }
}

/// State directory for a project root; usable before a target is known.
pub fn state_dir(root: &Path) -> PathBuf {
  root.join(THIRD_PARTY_DIR).join(STATE_DIR)
}

/// Legacy sync marker for a project root.
pub fn sync_marker(root: &Path) -> PathBuf {
  root.join(THIRD_PARTY_DIR).join(SYNC_MARKER)
}
