use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// CPU architecture, named the way node-gyp and the WebRTC gyp files name it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
  X64,
  Ia32,
  Arm,
  Arm64,
  /// Any other name passed through verbatim (e.g. `ppc64`).
  Other(String),
}

impl Arch {
  /// Detect the host CPU architecture at runtime
  pub fn current() -> Self {
    Self::from_rust_arch(std::env::consts::ARCH)
  }

  /// Map a Rust `target_arch` name to the runtime naming scheme.
  pub fn from_rust_arch(name: &str) -> Self {
    match name {
      "x86_64" => Self::X64,
      "x86" => Self::Ia32,
      "arm" => Self::Arm,
      "aarch64" => Self::Arm64,
      other => Self::Other(other.to_string()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::X64 => "x64",
      Self::Ia32 => "ia32",
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
      Self::Other(name) => name,
    }
  }
}

impl FromStr for Arch {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s {
      "x64" => Self::X64,
      "ia32" => Self::Ia32,
      "arm" => Self::Arm,
      "arm64" => Self::Arm64,
      other => Self::Other(other.to_string()),
    })
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
