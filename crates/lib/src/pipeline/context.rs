//! Everything a run knows before its first stage.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::env::{self, BuildEnvironment, DeriveInputs};
use crate::install::ArtifactDescriptor;
use crate::layout::ProjectLayout;
use crate::prepare::{self, PrepareError};
use crate::settings::{Settings, SettingsError};
use crate::target::{BuildTarget, Invocation, TargetError};

#[derive(Debug, Error)]
pub enum ContextError {
  #[error(transparent)]
  Prepare(#[from] PrepareError),

  #[error(transparent)]
  Settings(#[from] SettingsError),

  #[error(transparent)]
  Target(#[from] TargetError),
}

/// Immutable inputs shared by every stage of a run.
#[derive(Debug, Clone)]
pub struct BuildContext {
  pub invocation: Invocation,
  pub target: BuildTarget,
  pub layout: ProjectLayout,
  pub settings: Settings,
  pub package_version: String,
  /// Environment the run started with.
  pub seed: BuildEnvironment,
}

impl BuildContext {
  /// Assemble the context for a project root without touching the
  /// filesystem beyond reads.
  ///
  /// Fails if node-gyp has not configured the project yet.
  pub fn load(root: &Path, invocation: Invocation, seed: BuildEnvironment) -> Result<Self, ContextError> {
    let root = dunce::canonicalize(root).unwrap_or_else(|_| PathBuf::from(root));

    prepare::check_gyp_config(&root)?;
    let settings = Settings::load(&root)?;
    let package_version = prepare::read_package_version(&root)?;
    let target = BuildTarget::detect(&invocation, &root)?;

    Ok(Self::from_parts(&root, invocation, target, settings, package_version, seed))
  }

  pub fn from_parts(
    root: &Path,
    invocation: Invocation,
    target: BuildTarget,
    settings: Settings,
    package_version: String,
    seed: BuildEnvironment,
  ) -> Self {
    let layout = ProjectLayout::new(root, &target);
    debug!(root = %root.display(), target_arch = %target.arch, "build context ready");

    Self {
      invocation,
      target,
      layout,
      settings,
      package_version,
      seed,
    }
  }

  /// One-time project setup: link the runtime's gyp configuration and make
  /// sure `third_party/` exists.
  pub fn prepare(&self) -> Result<(), ContextError> {
    prepare::link_common_gypi(&self.layout, &self.invocation.runtime_dir)?;
    prepare::ensure_third_party(&self.layout)?;
    Ok(())
  }

  /// Environment for the stages before derivation: the seed with depot_tools
  /// on `PATH`.
  pub fn bootstrap_environment(&self) -> BuildEnvironment {
    env::bootstrap(&self.seed, &self.layout, self.target.platform)
  }

  /// Derive the full build environment, probing the real filesystem.
  pub fn derive_environment(&self) -> BuildEnvironment {
    env::derive(
      DeriveInputs {
        target: &self.target,
        layout: &self.layout,
        invocation: &self.invocation,
        settings: &self.settings,
      },
      &self.seed,
      Path::exists,
    )
  }

  pub fn artifact(&self) -> ArtifactDescriptor {
    ArtifactDescriptor::new(&self.settings, &self.package_version, &self.target, &self.layout)
  }
}
