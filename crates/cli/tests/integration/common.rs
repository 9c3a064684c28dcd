//! Shared test helpers for CLI integration tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

const GIT: &str = r#"#!/bin/sh
echo "git $*" >> "$TOOL_LOG"
mkdir -p "$3"
cp "$DEPOT_TOOLS_SRC"/* "$3"/
"#;

const GCLIENT: &str = r#"#!/bin/sh
echo "gclient $*" >> "$TOOL_LOG"
case "$1" in
  config) touch .gclient ;;
  sync) mkdir -p src ;;
esac
"#;

const GN: &str = r#"#!/bin/sh
echo "gn $*" >> "$TOOL_LOG"
mkdir -p "$2"
"#;

const NINJA: &str = r#"#!/bin/sh
echo "ninja $*" >> "$TOOL_LOG"
echo "CXX=$CXX" >> "$TOOL_LOG"
mkdir -p "$2"
touch "$2/webrtc.node"
"#;

const FAILING_GN: &str = r#"#!/bin/sh
echo "gn $*" >> "$TOOL_LOG"
exit 3
"#;

/// Host architecture in runtime naming, so builds are never cross builds.
fn host_arch() -> &'static str {
  match std::env::consts::ARCH {
    "x86_64" => "x64",
    "aarch64" => "arm64",
    "x86" => "ia32",
    other => other,
  }
}

fn write_script(path: &Path, content: &str) {
  std::fs::write(path, content).unwrap();
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Isolated project with fake `git`, `gclient`, `gn` and `ninja`.
///
/// `git clone` copies `gclient` into the destination so the pipeline finds it
/// inside depot_tools like the real one.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let env = Self { temp };

    env.write_file("build/config.gypi", "{}");
    env.write_file("package.json", r#"{ "name": "webrtc", "version": "1.4.0" }"#);
    env.write_file("runtime/include/node/common.gypi", "{}");

    std::fs::create_dir_all(env.bin_dir()).unwrap();
    std::fs::create_dir_all(env.depot_tools_src()).unwrap();
    write_script(&env.bin_dir().join("git"), GIT);
    write_script(&env.bin_dir().join("gn"), GN);
    write_script(&env.bin_dir().join("ninja"), NINJA);
    write_script(&env.depot_tools_src().join("gclient"), GCLIENT);

    env
  }

  /// Replace `gn` with one that exits non-zero.
  pub fn break_gn(&self) {
    write_script(&self.bin_dir().join("gn"), FAILING_GN);
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn root(&self) -> PathBuf {
    let p = self.temp.path().join("project");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  fn bin_dir(&self) -> PathBuf {
    self.temp.path().join("bin")
  }

  fn depot_tools_src(&self) -> PathBuf {
    self.temp.path().join("depot_tools_src")
  }

  fn log_path(&self) -> PathBuf {
    self.temp.path().join("tools.log")
  }

  /// Lines the fake tools logged, in invocation order.
  pub fn tool_log(&self) -> Vec<String> {
    std::fs::read_to_string(self.log_path())
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }

  /// Tool names from [`Self::tool_log`], with the first argument.
  pub fn tool_calls(&self) -> Vec<String> {
    self
      .tool_log()
      .iter()
      .filter(|line| !line.split_whitespace().next().is_some_and(|head| head.contains('=')))
      .map(|line| line.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
      .collect()
  }

  /// `status --json` for this project.
  pub fn status_json(&self) -> serde_json::Value {
    let output = cargo_bin_cmd!("rtcbuild")
      .arg("status")
      .arg("--root")
      .arg(self.root())
      .arg("--json")
      .output()
      .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
  }

  /// A `build` command with the fake tools first on `PATH`.
  pub fn build_cmd(&self) -> Command {
    let path = std::env::var("PATH").unwrap_or_default();
    let mut cmd: Command = cargo_bin_cmd!("rtcbuild");
    cmd
      .current_dir(self.root())
      .env("PATH", format!("{}:{}", self.bin_dir().display(), path))
      .env("TOOL_LOG", self.log_path())
      .env("DEPOT_TOOLS_SRC", self.depot_tools_src())
      .env_remove("CIDE_CREDENTIALS")
      .env_remove("GYP_DEFINES")
      .env_remove("CXX")
      .arg("build")
      .arg(format!("--target_arch={}", host_arch()))
      .arg(self.root().join("runtime"))
      .arg("node.lib")
      .arg(self.temp.path().join("gyp"))
      .arg("--runtime-version")
      .arg("6.2.1");
    cmd
  }
}
