//! rtcbuild-lib: bootstrap and build orchestration for the WebRTC node addon.
//!
//! The crate drives a fixed sequence of stages:
//! - fetch depot_tools and configure a gclient workspace
//! - derive the build environment for the requested target
//! - sync sources, generate ninja files and compile
//! - install the resulting `webrtc.node` and optionally upload it
//!
//! Progress is persisted under `third_party/.rtcbuild` so repeated runs skip
//! work whose results are still on disk.

pub mod consts;
pub mod env;
pub mod execute;
pub mod install;
pub mod layout;
pub mod lock;
pub mod pipeline;
pub mod platform;
pub mod prepare;
pub mod progress;
pub mod settings;
pub mod target;
pub mod util;
