//! The build pipeline.
//!
//! Stages run strictly in [`Stage`] order. Each stage either spawns one
//! subprocess or does in-process work; the driver stops at the first
//! failure and nothing after it runs.

mod context;
pub mod gates;
mod stage;

use std::fs;
use std::time::Instant;

use tracing::{error, info, warn};

pub use context::{BuildContext, ContextError};
pub use stage::{PipelineError, PipelineReport, Stage, StageError, StageOutcome, StageReport};

use crate::env::BuildEnvironment;
use crate::execute::{CommandRunner, StageCommand};
use crate::install;
use crate::prepare;
use crate::progress::{Milestone, ProgressStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
  /// Run the install/upload stage after a successful compile.
  pub install: bool,
}

pub struct Pipeline<'a, R> {
  ctx: &'a BuildContext,
  runner: &'a R,
  progress: ProgressStore,
  options: PipelineOptions,
}

impl<'a, R: CommandRunner> Pipeline<'a, R> {
  pub fn new(ctx: &'a BuildContext, runner: &'a R, options: PipelineOptions) -> Self {
    Self {
      ctx,
      runner,
      progress: ProgressStore::for_root(&ctx.layout.root),
      options,
    }
  }

  /// Stages this pipeline will run, in order.
  pub fn stages(&self) -> Vec<Stage> {
    Stage::ALL
      .into_iter()
      .filter(|stage| *stage != Stage::InstallArtifact || self.options.install)
      .collect()
  }

  /// Run every stage, stopping at the first failure.
  pub async fn run(&self) -> Result<PipelineReport, PipelineError> {
    let mut env = self.ctx.bootstrap_environment();
    let mut report = PipelineReport::default();

    for stage in self.stages() {
      let started = Instant::now();

      let outcome = self.run_stage(stage, &mut env).await.map_err(|source| {
        error!(%stage, error = %source, "stage failed");
        PipelineError { stage, source }
      })?;

      let elapsed = started.elapsed();
      info!(%stage, ?outcome, elapsed_ms = elapsed.as_millis() as u64, "stage finished");
      report.stages.push(StageReport {
        stage,
        outcome,
        elapsed,
      });
    }

    Ok(report)
  }

  async fn run_stage(&self, stage: Stage, env: &mut BuildEnvironment) -> Result<StageOutcome, StageError> {
    match stage {
      Stage::EnsureToolchain => self.ensure_toolchain(env).await,
      Stage::EnsureWorkspaceConfig => self.ensure_workspace_config(env).await,
      Stage::DeriveBuildEnvironment => {
        *env = self.derive_build_environment()?;
        Ok(StageOutcome::Completed)
      }
      Stage::SyncSources => self.sync_sources(env).await,
      Stage::GenerateBuildFiles => self.generate_build_files(env).await,
      Stage::Compile => self.compile(env).await,
      Stage::InstallArtifact => self.install_artifact(env).await,
    }
  }

  async fn ensure_toolchain(&self, env: &BuildEnvironment) -> Result<StageOutcome, StageError> {
    let layout = &self.ctx.layout;
    if gates::toolchain_ready(layout) {
      info!(path = %layout.depot_tools.display(), "toolchain present, skipping clone");
      return Ok(StageOutcome::Skipped);
    }

    let command = StageCommand::new("git", &layout.third_party)
      .arg("clone")
      .arg(&self.ctx.settings.depot_tools_repo)
      .arg(layout.depot_tools.display().to_string());
    self.runner.run(&command, env).await?;

    self.progress.record(Milestone::Toolchain)?;
    Ok(StageOutcome::Ran)
  }

  async fn ensure_workspace_config(&self, env: &BuildEnvironment) -> Result<StageOutcome, StageError> {
    let layout = &self.ctx.layout;
    if gates::workspace_configured(layout) {
      info!(path = %layout.webrtc.display(), "workspace configured, skipping gclient config");
      return Ok(StageOutcome::Skipped);
    }

    fs::create_dir_all(&layout.webrtc).map_err(|source| StageError::Io {
      action: "create",
      path: layout.webrtc.clone(),
      source,
    })?;
    // A new workspace invalidates any recorded sync, legacy marker included.
    self.progress.invalidate_from(Milestone::Workspace)?;
    let marker = layout.sync_marker();
    match fs::remove_file(&marker) {
      Ok(()) => info!(path = %marker.display(), "removed stale sync marker"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(source) => {
        return Err(StageError::Io {
          action: "remove",
          path: marker,
          source,
        });
      }
    }

    let command = StageCommand::new(layout.gclient(), &layout.webrtc)
      .arg("config")
      .arg("--name=src")
      .arg(self.ctx.settings.webrtc_solution());
    self.runner.run(&command, env).await?;

    self.progress.record(Milestone::Workspace)?;
    Ok(StageOutcome::Ran)
  }

  fn derive_build_environment(&self) -> Result<BuildEnvironment, StageError> {
    prepare::remove_stale_artifact(&self.ctx.layout)?;
    let env = self.ctx.derive_environment();

    let target = &self.ctx.target;
    info!(
      target_arch = %target.arch,
      host_arch = %target.host_arch,
      configuration = %target.configuration,
      cross_compile = target.cross_compile,
      "configured build"
    );
    Ok(env)
  }

  async fn sync_sources(&self, env: &BuildEnvironment) -> Result<StageOutcome, StageError> {
    let layout = &self.ctx.layout;
    let state = self.progress.load()?;
    if gates::sync_completed(layout, &state) {
      info!("sources already synced, skipping gclient sync");
      return Ok(StageOutcome::Skipped);
    }

    self.progress.invalidate_from(Milestone::Sync)?;

    let command = StageCommand::new(layout.gclient(), &layout.webrtc)
      .arg("sync")
      .arg("--with_branch_heads");
    self.runner.run(&command, env).await?;

    self.progress.record(Milestone::Sync)?;
    let marker = layout.sync_marker();
    fs::write(&marker, "").map_err(|source| StageError::Io {
      action: "write",
      path: marker,
      source,
    })?;
    Ok(StageOutcome::Ran)
  }

  async fn generate_build_files(&self, env: &BuildEnvironment) -> Result<StageOutcome, StageError> {
    let layout = &self.ctx.layout;
    let command = StageCommand::new("gn", &layout.webrtc_src)
      .arg("gen")
      .arg(layout.out_dir_relative());
    self.runner.run(&command, env).await?;
    Ok(StageOutcome::Ran)
  }

  async fn compile(&self, env: &BuildEnvironment) -> Result<StageOutcome, StageError> {
    let layout = &self.ctx.layout;
    let command = StageCommand::new("ninja", &layout.webrtc_src)
      .arg("-C")
      .arg(layout.out_dir.display().to_string());
    self.runner.run(&command, env).await?;

    if layout.built_artifact().is_file() {
      self.progress.record(Milestone::Artifact)?;
    } else {
      warn!(path = %layout.built_artifact().display(), "compile succeeded but produced no artifact");
    }
    Ok(StageOutcome::Ran)
  }

  async fn install_artifact(&self, env: &BuildEnvironment) -> Result<StageOutcome, StageError> {
    let artifact = self.ctx.artifact();
    let upload = install::install(&artifact, &self.ctx.settings, env).await?;
    Ok(StageOutcome::Installed(upload))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::env::{GYP_DEFINES, PATH};
  use crate::install::UploadOutcome;
  use crate::platform::{Arch, Os, Platform};
  use crate::settings::Settings;
  use crate::target::{BuildTarget, Configuration, Invocation, RuntimeVersion};
  use crate::util::testutil::{FakeRunner, touch};
  use std::path::{Path, PathBuf};
  use tempfile::TempDir;

  fn context(root: &Path) -> BuildContext {
    let host = Platform::new(Os::Linux, Arch::X64);
    let version = RuntimeVersion::new(6, 2, 1);
    let invocation = Invocation {
      target_arch: Arch::X64,
      runtime_dir: PathBuf::from("/home/u/.node-gyp/6.2.1"),
      runtime_lib: "node".to_string(),
      gyp_dir: PathBuf::from("/usr/lib/node_modules/node-gyp"),
      runtime_version: Some(version),
    };
    let target = BuildTarget::new(&host, Arch::X64, version, Configuration::Release);
    let seed = BuildEnvironment::from_vars([(PATH, "/usr/bin")]);
    BuildContext::from_parts(root, invocation, target, Settings::default(), "1.4.0".to_string(), seed)
  }

  fn with_toolchain(ctx: &BuildContext) {
    fs::create_dir_all(&ctx.layout.depot_tools).unwrap();
  }

  fn with_workspace(ctx: &BuildContext) {
    touch(&ctx.layout.gclient_file());
    fs::create_dir_all(&ctx.layout.webrtc_src).unwrap();
  }

  fn progress(ctx: &BuildContext) -> ProgressStore {
    ProgressStore::for_root(&ctx.layout.root)
  }

  #[tokio::test]
  async fn fresh_project_runs_every_stage_in_order() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    fs::create_dir_all(&ctx.layout.third_party).unwrap();
    let runner = FakeRunner::new();

    let report = Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();

    assert_eq!(
      runner.heads(),
      vec!["git clone", "gclient config", "gclient sync", "gn gen", "ninja -C"]
    );
    assert_eq!(report.stages.len(), 6);
    assert_eq!(report.outcome(Stage::DeriveBuildEnvironment), Some(&StageOutcome::Completed));
    assert_eq!(report.outcome(Stage::InstallArtifact), None);

    let state = progress(&ctx).load().unwrap();
    assert!(state.is_recorded(Milestone::Toolchain));
    assert!(state.is_recorded(Milestone::Workspace));
    assert!(state.is_recorded(Milestone::Sync));
    assert!(!state.is_recorded(Milestone::Artifact));
    assert!(ctx.layout.sync_marker().exists());
  }

  #[tokio::test]
  async fn commands_use_expected_arguments_and_directories() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    fs::create_dir_all(&ctx.layout.third_party).unwrap();
    let runner = FakeRunner::new();

    Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();
    let calls = runner.recorded();
    let layout = &ctx.layout;

    assert_eq!(calls[0].command.cwd, layout.third_party);
    assert_eq!(
      calls[0].command.args[1],
      "https://chromium.googlesource.com/chromium/tools/depot_tools.git"
    );

    assert_eq!(calls[1].command.program, layout.gclient());
    assert_eq!(calls[1].command.cwd, layout.webrtc);
    assert_eq!(calls[1].command.args[1], "--name=src");
    assert!(calls[1].command.args[2].ends_with("@6294a7eb71c891e9ea41273a7a94113f6802d0da"));

    assert_eq!(calls[2].command.args, vec!["sync", "--with_branch_heads"]);
    assert_eq!(calls[2].command.cwd, layout.webrtc);

    assert_eq!(calls[3].command.args, vec!["gen", "out/Release"]);
    assert_eq!(calls[3].command.cwd, layout.webrtc_src);

    assert_eq!(calls[4].command.args, vec!["-C".to_string(), layout.out_dir.display().to_string()]);
    assert_eq!(calls[4].command.cwd, layout.webrtc_src);
  }

  #[tokio::test]
  async fn early_stages_get_bootstrap_environment() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    fs::create_dir_all(&ctx.layout.third_party).unwrap();
    let runner = FakeRunner::new();

    Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();
    let calls = runner.recorded();
    let expected_path = format!("/usr/bin:{}", ctx.layout.depot_tools.display());

    for call in &calls[..2] {
      assert_eq!(call.env.get(PATH), Some(expected_path.as_str()));
      assert_eq!(call.env.get(GYP_DEFINES), None);
    }
    for call in &calls[2..] {
      assert_eq!(call.env.get(PATH), Some(expected_path.as_str()));
      let defines = call.env.defines();
      assert_eq!(defines.get("target_arch"), Some("x64"));
      assert_eq!(defines.get("ConfigurationName"), Some("Release"));
    }
  }

  #[tokio::test]
  async fn existing_toolchain_skips_clone() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    with_toolchain(&ctx);
    let runner = FakeRunner::new();

    let report = Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();

    assert_eq!(runner.heads()[0], "gclient config");
    assert!(runner.heads().iter().all(|h| h != "git clone"));
    assert_eq!(report.outcome(Stage::EnsureToolchain), Some(&StageOutcome::Skipped));
  }

  #[tokio::test]
  async fn synced_checkout_goes_straight_to_generation() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    with_toolchain(&ctx);
    with_workspace(&ctx);
    touch(&ctx.layout.sync_marker());
    let runner = FakeRunner::new();

    let report = Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();

    assert_eq!(runner.heads(), vec!["gn gen", "ninja -C"]);
    assert_eq!(report.outcome(Stage::SyncSources), Some(&StageOutcome::Skipped));
    assert_eq!(report.outcome(Stage::EnsureWorkspaceConfig), Some(&StageOutcome::Skipped));
  }

  #[tokio::test]
  async fn reconfigured_workspace_forces_sync() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    with_toolchain(&ctx);
    progress(&ctx).record(Milestone::Sync).unwrap();
    let runner = FakeRunner::new();

    Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();

    assert!(runner.heads().contains(&"gclient sync".to_string()));
  }

  #[tokio::test]
  async fn lost_checkout_is_synced_again() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    fs::create_dir_all(&ctx.layout.third_party).unwrap();
    let src = ctx.layout.webrtc_src.clone();
    let toolchain = ctx.layout.depot_tools.clone();
    let gclient_file = ctx.layout.gclient_file();
    let runner = FakeRunner::new().with_effect(move |cmd| match cmd.args.first().map(String::as_str) {
      Some("clone") => fs::create_dir_all(&toolchain).unwrap(),
      Some("config") => touch(&gclient_file),
      Some("sync") => fs::create_dir_all(&src).unwrap(),
      _ => {}
    });

    Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();
    assert!(ctx.layout.sync_marker().exists());

    fs::remove_dir_all(&ctx.layout.webrtc_src).unwrap();
    let rerun = FakeRunner::new();
    Pipeline::new(&ctx, &rerun, PipelineOptions::default()).run().await.unwrap();

    assert_eq!(rerun.heads(), vec!["gclient config", "gclient sync", "gn gen", "ninja -C"]);
    assert!(ctx.layout.sync_marker().exists());
  }

  #[tokio::test]
  async fn failed_sync_stops_pipeline() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    with_toolchain(&ctx);
    with_workspace(&ctx);
    let runner = FakeRunner::failing_on("gclient");

    let err = Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap_err();

    assert_eq!(err.stage, Stage::SyncSources);
    assert_eq!(runner.heads(), vec!["gclient sync"]);
    assert!(!progress(&ctx).load().unwrap().is_recorded(Milestone::Sync));
    assert!(!ctx.layout.sync_marker().exists());
  }

  #[tokio::test]
  async fn failed_clone_spawns_nothing_else() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    fs::create_dir_all(&ctx.layout.third_party).unwrap();
    let runner = FakeRunner::failing_on("git");

    let err = Pipeline::new(&ctx, &runner, PipelineOptions { install: true }).run().await.unwrap_err();

    assert_eq!(err.stage, Stage::EnsureToolchain);
    assert_eq!(runner.heads(), vec!["git clone"]);
  }

  #[tokio::test]
  async fn failed_generation_skips_compile() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    with_toolchain(&ctx);
    with_workspace(&ctx);
    touch(&ctx.layout.sync_marker());
    let runner = FakeRunner::failing_on("gn");

    let err = Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap_err();

    assert_eq!(err.stage, Stage::GenerateBuildFiles);
    assert_eq!(runner.heads(), vec!["gn gen"]);
  }

  #[tokio::test]
  async fn stale_artifact_removed_before_build() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    with_toolchain(&ctx);
    with_workspace(&ctx);
    touch(&ctx.layout.sync_marker());
    touch(&ctx.layout.built_artifact());
    let runner = FakeRunner::new();

    Pipeline::new(&ctx, &runner, PipelineOptions::default()).run().await.unwrap();

    assert!(!ctx.layout.built_artifact().exists());
    assert!(!progress(&ctx).load().unwrap().is_recorded(Milestone::Artifact));
  }

  #[tokio::test]
  async fn install_links_compiled_artifact() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path());
    with_toolchain(&ctx);
    with_workspace(&ctx);
    touch(&ctx.layout.sync_marker());
    let built = ctx.layout.built_artifact();
    let runner = FakeRunner::new().with_effect(move |cmd| {
      if cmd.program_name() == "ninja" {
        fs::create_dir_all(built.parent().unwrap()).unwrap();
        fs::write(&built, "addon").unwrap();
      }
    });

    let pipeline = Pipeline::new(&ctx, &runner, PipelineOptions { install: true });
    assert_eq!(pipeline.stages().last(), Some(&Stage::InstallArtifact));
    let report = pipeline.run().await.unwrap();

    assert_eq!(
      report.outcome(Stage::InstallArtifact),
      Some(&StageOutcome::Installed(UploadOutcome::Skipped))
    );
    assert!(progress(&ctx).load().unwrap().is_recorded(Milestone::Artifact));
    assert_eq!(fs::read_to_string(ctx.artifact().local_output_path).unwrap(), "addon");
  }
}
