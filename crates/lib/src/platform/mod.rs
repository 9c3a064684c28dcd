//! Host platform detection.

pub mod arch;
pub mod os;

use std::fmt;

pub use arch::Arch;
pub use os::Os;

/// Host identifier combining OS and architecture (e.g., "linux-x64")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current(),
    })
  }

  /// Returns the platform string used in artifact names (e.g., "darwin-arm64")
  pub fn pair(&self) -> String {
    format!("{}-{}", self.os, self.arch)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.pair())
  }
}
