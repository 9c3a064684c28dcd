mod build;
mod env;
mod reset;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use rtcbuild_lib::env::BuildEnvironment;
use rtcbuild_lib::pipeline::BuildContext;
use rtcbuild_lib::platform::Arch;
use rtcbuild_lib::target::{Invocation, RuntimeVersion};

pub use build::cmd_build;
pub use env::cmd_env;
pub use reset::cmd_reset;
pub use status::cmd_status;

/// Arguments node-gyp passes when it runs the build action.
#[derive(Debug, Args)]
pub struct InvocationArgs {
  /// Target architecture (x64, ia32, arm, arm64)
  #[arg(long = "target_arch")]
  pub target_arch: Arch,

  /// Runtime headers directory (node-gyp's nodedir)
  pub runtime_dir: PathBuf,

  /// Runtime library file, e.g. `node.lib` or `libnode.so.48`
  pub runtime_lib: String,

  /// node-gyp installation directory
  pub gyp_dir: PathBuf,

  /// Project root (default: current directory)
  #[arg(long, default_value = ".")]
  pub root: PathBuf,

  /// Runtime version; read from the runtime headers when omitted
  #[arg(long)]
  pub runtime_version: Option<RuntimeVersion>,
}

impl InvocationArgs {
  fn invocation(&self) -> Result<Invocation> {
    Invocation::new(
      self.target_arch.clone(),
      &self.runtime_dir,
      &self.runtime_lib,
      &self.gyp_dir,
      self.runtime_version,
    )
    .context("Invalid build arguments")
  }

  /// Load the build context, seeded from this process's environment.
  fn load_context(&self) -> Result<BuildContext> {
    let invocation = self.invocation()?;
    BuildContext::load(&self.root, invocation, BuildEnvironment::from_process())
      .with_context(|| format!("Failed to load project at {}", self.root.display()))
  }
}

/// Resolve a `--root` argument to an absolute path.
fn project_root(root: &std::path::Path) -> PathBuf {
  dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
