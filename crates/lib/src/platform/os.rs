use std::fmt;

/// Operating system variants rtcbuild knows how to configure.
///
/// Identifiers follow the JavaScript runtime's `process.platform` naming,
/// which is what artifact names and build defines expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
  FreeBsd,
  OpenBsd,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    Self::from_rust_os(std::env::consts::OS)
  }

  /// Map a Rust `target_os` name to an `Os`.
  pub fn from_rust_os(name: &str) -> Option<Self> {
    match name {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      "freebsd" => Some(Self::FreeBsd),
      "openbsd" => Some(Self::OpenBsd),
      _ => None,
    }
  }

  /// Returns the runtime-style identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "win32",
      Self::FreeBsd => "freebsd",
      Self::OpenBsd => "openbsd",
    }
  }

  /// Separator used between entries of `PATH`-like variables.
  pub fn path_delimiter(&self) -> char {
    match self {
      Self::Windows => ';',
      _ => ':',
    }
  }

  /// Name of a depot_tools script on this OS (`gclient` vs `gclient.bat`).
  pub fn script_name(&self, base: &str) -> String {
    match self {
      Self::Windows => format!("{}.bat", base),
      _ => base.to_string(),
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
