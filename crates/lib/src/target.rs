//! Build target derivation.
//!
//! A [`BuildTarget`] is computed once from the invocation arguments and host
//! queries and never changes afterwards.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::platform::{Arch, Os, Platform};

#[derive(Debug, Error)]
pub enum TargetError {
  #[error("invalid runtime version '{0}' (expected vMAJOR.MINOR.PATCH)")]
  InvalidVersion(String),

  #[error("failed to read runtime version header '{path}': {source}")]
  ReadVersionHeader {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("runtime version header '{0}' does not define NODE_MAJOR/MINOR/PATCH_VERSION")]
  IncompleteVersionHeader(PathBuf),

  #[error("invalid runtime library identifier '{0}'")]
  InvalidLibrary(String),

  #[error("unsupported host operating system: {0}")]
  UnsupportedHost(String),
}

/// Output configuration of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Configuration {
  Release,
  Debug,
}

impl Configuration {
  /// `Debug` when node-gyp already created a `build/Debug` directory.
  pub fn detect(root: &Path) -> Self {
    if root.join("build").join("Debug").exists() {
      Self::Debug
    } else {
      Self::Release
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Release => "Release",
      Self::Debug => "Debug",
    }
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Version of the JavaScript runtime the addon is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeVersion {
  pub major: u32,
  pub minor: u32,
  pub patch: u32,
}

impl RuntimeVersion {
  pub fn new(major: u32, minor: u32, patch: u32) -> Self {
    Self { major, minor, patch }
  }

  /// Pre-1.0 runtimes need the old gcc toolchain on Linux.
  pub fn is_legacy(&self) -> bool {
    self.major == 0
  }

  /// Version with the patch component replaced by `x`, e.g. `v6.2.x`.
  pub fn wildcard(&self) -> String {
    format!("v{}.{}.x", self.major, self.minor)
  }

  /// Read the version from `<runtime>/include/node/node_version.h`.
  pub fn from_header(runtime_dir: &Path) -> Result<Self, TargetError> {
    let path = runtime_dir.join("include").join("node").join("node_version.h");
    let content = fs::read_to_string(&path).map_err(|source| TargetError::ReadVersionHeader {
      path: path.clone(),
      source,
    })?;

    let define = |name: &str| {
      content.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
          (Some("#define"), Some(n), Some(value)) if n == name => value.parse::<u32>().ok(),
          _ => None,
        }
      })
    };

    match (
      define("NODE_MAJOR_VERSION"),
      define("NODE_MINOR_VERSION"),
      define("NODE_PATCH_VERSION"),
    ) {
      (Some(major), Some(minor), Some(patch)) => Ok(Self::new(major, minor, patch)),
      _ => Err(TargetError::IncompleteVersionHeader(path)),
    }
  }
}

impl FromStr for RuntimeVersion {
  type Err = TargetError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || TargetError::InvalidVersion(s.to_string());
    let trimmed = s.trim().trim_start_matches('v');
    let mut parts = trimmed.split('.').map(|p| p.parse::<u32>().map_err(|_| invalid()));

    let major = parts.next().ok_or_else(invalid)??;
    let minor = parts.next().ok_or_else(invalid)??;
    let patch = parts.next().ok_or_else(invalid)??;
    if parts.next().is_some() {
      return Err(invalid());
    }

    Ok(Self::new(major, minor, patch))
  }
}

impl fmt::Display for RuntimeVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
  }
}

/// Extract the library name from a runtime library file name.
///
/// `libnode.60.dylib` becomes `node`.
pub fn runtime_lib_name(file: &str) -> Result<String, TargetError> {
  let stem = file.strip_prefix("lib").unwrap_or(file);
  let name = stem.split('.').next().unwrap_or_default();
  if name.is_empty() {
    return Err(TargetError::InvalidLibrary(file.to_string()));
  }
  Ok(name.to_string())
}

/// Raw arguments the build was invoked with.
#[derive(Debug, Clone)]
pub struct Invocation {
  pub target_arch: Arch,
  /// Runtime headers directory (node-gyp's `nodedir`), absolute.
  pub runtime_dir: PathBuf,
  /// Library name derived from the runtime library file.
  pub runtime_lib: String,
  /// node-gyp installation directory.
  pub gyp_dir: PathBuf,
  /// Explicit runtime version; read from the runtime headers when absent.
  pub runtime_version: Option<RuntimeVersion>,
}

impl Invocation {
  pub fn new(
    target_arch: Arch,
    runtime_dir: &Path,
    runtime_lib_file: &str,
    gyp_dir: &Path,
    runtime_version: Option<RuntimeVersion>,
  ) -> Result<Self, TargetError> {
    Ok(Self {
      target_arch,
      runtime_dir: absolute(runtime_dir),
      runtime_lib: runtime_lib_name(runtime_lib_file)?,
      gyp_dir: gyp_dir.to_path_buf(),
      runtime_version,
    })
  }

  pub fn resolve_runtime_version(&self) -> Result<RuntimeVersion, TargetError> {
    match self.runtime_version {
      Some(version) => Ok(version),
      None => RuntimeVersion::from_header(&self.runtime_dir),
    }
  }
}

fn absolute(path: &Path) -> PathBuf {
  dunce::canonicalize(path).unwrap_or_else(|_| {
    std::env::current_dir()
      .map(|cwd| cwd.join(path))
      .unwrap_or_else(|_| path.to_path_buf())
  })
}

/// Everything the environment deriver needs to know about what is being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
  /// Host platform; WebRTC is always built on the platform it targets.
  pub platform: Os,
  pub arch: Arch,
  pub host_arch: Arch,
  pub runtime_version: RuntimeVersion,
  pub configuration: Configuration,
  pub cross_compile: bool,
}

impl BuildTarget {
  pub fn new(host: &Platform, arch: Arch, runtime_version: RuntimeVersion, configuration: Configuration) -> Self {
    let cross_compile = arch != host.arch;
    Self {
      platform: host.os,
      arch,
      host_arch: host.arch.clone(),
      runtime_version,
      configuration,
      cross_compile,
    }
  }

  /// Derive the target for the current host from the invocation.
  pub fn detect(invocation: &Invocation, root: &Path) -> Result<Self, TargetError> {
    let host = Platform::current().ok_or_else(|| TargetError::UnsupportedHost(std::env::consts::OS.to_string()))?;
    let version = invocation.resolve_runtime_version()?;
    Ok(Self::new(
      &host,
      invocation.target_arch.clone(),
      version,
      Configuration::detect(root),
    ))
  }

  /// Name of the ninja output directory under `src/out/`.
  pub fn out_dir_name(&self) -> String {
    if self.platform == Os::Windows && self.arch == Arch::X64 {
      format!("{}_x64", self.configuration)
    } else {
      self.configuration.to_string()
    }
  }
}
