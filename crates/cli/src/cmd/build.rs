//! Implementation of the `rtcbuild build` command.
//!
//! Runs the full bootstrap pipeline for one target: toolchain, workspace,
//! environment, sync, gn, ninja and (with `--install`) installation.

use anyhow::{Context, Result};
use tracing::info;

use rtcbuild_lib::execute::SystemRunner;
use rtcbuild_lib::install::UploadOutcome;
use rtcbuild_lib::lock::{LockMode, ProjectLock};
use rtcbuild_lib::pipeline::{Pipeline, PipelineOptions, PipelineReport, StageOutcome};

use super::InvocationArgs;
use crate::output::{format_duration, print_info, print_stat, print_success, print_warning};

pub fn cmd_build(args: &InvocationArgs, install: bool) -> Result<()> {
  let ctx = args.load_context()?;
  let _lock = ProjectLock::acquire(&ctx.layout.root, LockMode::Exclusive, "build")?;

  ctx.prepare().context("Failed to prepare project")?;

  print_info(&format!(
    "Building for {} {} ({}, runtime {})",
    ctx.target.platform, ctx.target.arch, ctx.target.configuration, ctx.target.runtime_version
  ));

  let runner = SystemRunner;
  let pipeline = Pipeline::new(&ctx, &runner, PipelineOptions { install });

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(pipeline.run())?;

  print_report(&report);
  info!(out_dir = %ctx.layout.out_dir.display(), "build finished");

  Ok(())
}

fn print_report(report: &PipelineReport) {
  println!();
  for stage in &report.stages {
    let outcome = match &stage.outcome {
      StageOutcome::Ran => "ran",
      StageOutcome::Skipped => "skipped",
      StageOutcome::Completed => "done",
      StageOutcome::Installed(UploadOutcome::Uploaded) => "installed, uploaded",
      StageOutcome::Installed(UploadOutcome::Skipped) => "installed",
      StageOutcome::Installed(UploadOutcome::Failed(reason)) => {
        print_warning(&format!("Upload failed: {reason}"));
        "installed, upload failed"
      }
    };
    print_stat(stage.stage.as_str(), &format!("{} ({})", outcome, format_duration(stage.elapsed)));
  }

  println!();
  print_success(&format!("Build complete in {}", format_duration(report.elapsed())));
}
