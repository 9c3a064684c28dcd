//! Build command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn fresh_build_runs_every_tool_in_order() {
  let env = TestEnv::new();

  env.build_cmd().assert().success().stdout(predicate::str::contains("Build complete"));

  assert_eq!(
    env.tool_calls(),
    vec!["git clone", "gclient config", "gclient sync", "gn gen", "ninja -C"]
  );

  let root = env.root();
  assert!(root.join("third_party/depot_tools/gclient").exists());
  assert!(root.join("third_party/webrtc/.gclient").exists());
  assert!(root.join("third_party/webrtc_sync").exists());
  assert!(root.join("third_party/webrtc/src/out/Release/webrtc.node").exists());
  assert!(root.join("nodejs.gypi").exists());
}

#[test]
fn second_build_skips_to_gn() {
  let env = TestEnv::new();
  env.build_cmd().assert().success();
  let first = env.tool_calls().len();

  env
    .build_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("skipped"));

  assert_eq!(env.tool_calls()[first..], ["gn gen", "ninja -C"]);
}

#[test]
fn status_after_build_lists_milestones() {
  let env = TestEnv::new();
  env.build_cmd().assert().success();

  let status = env.status_json();
  for milestone in ["toolchain", "workspace", "sync", "artifact"] {
    assert!(status["milestones"][milestone].is_u64(), "{milestone} not recorded");
  }
}

#[test]
fn failing_gn_stops_before_ninja() {
  let env = TestEnv::new();
  env.break_gn();

  env
    .build_cmd()
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("generate-build-files"));

  let calls = env.tool_calls();
  assert_eq!(calls.last().map(String::as_str), Some("gn gen"));
  assert!(!calls.iter().any(|c| c.starts_with("ninja")));
}

#[test]
fn modern_runtime_keeps_default_compiler() {
  let env = TestEnv::new();
  env.build_cmd().assert().success();

  assert!(env.tool_log().contains(&"CXX=".to_string()));
}

#[test]
fn install_links_artifact_without_credentials() {
  let env = TestEnv::new();

  env.build_cmd().arg("--install").assert().success();

  assert!(env.root().join("build/Release/webrtc.node").exists());
}
