//! Fixed names shared across the crate.

/// Directory under the project root holding all third-party checkouts.
pub const THIRD_PARTY_DIR: &str = "third_party";
pub const DEPOT_TOOLS_DIR: &str = "depot_tools";
pub const WEBRTC_DIR: &str = "webrtc";
/// gclient solution name, and therefore the checkout directory under `webrtc/`.
pub const WEBRTC_SRC_DIR: &str = "src";
pub const GCLIENT_FILE: &str = ".gclient";

/// Legacy sync-completed marker, kept for compatibility with older checkouts.
pub const SYNC_MARKER: &str = "webrtc_sync";

/// Directory under `third_party/` with rtcbuild's own persisted state.
pub const STATE_DIR: &str = ".rtcbuild";
pub const PROGRESS_FILE: &str = "progress.json";

/// Name of the compiled addon produced by ninja.
pub const ARTIFACT_NAME: &str = "webrtc.node";

/// Optional per-project settings override file.
pub const SETTINGS_FILE: &str = "rtcbuild.json";
