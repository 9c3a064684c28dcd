//! Build environment derivation.
//!
//! The deriver computes every variable the external toolchain reads
//! (`GYP_DEFINES`, compiler overrides, `JAVA_HOME`, the Windows toolchain
//! switches) from the build target and a seed environment. The result is an
//! immutable [`BuildEnvironment`] that each stage hands to its subprocess;
//! nothing here touches the orchestrator's own process environment.

mod defines;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

pub use defines::Defines;

use crate::layout::ProjectLayout;
use crate::platform::Os;
use crate::settings::Settings;
use crate::target::{BuildTarget, Invocation};

pub const GYP_DEFINES: &str = "GYP_DEFINES";
pub const CPATH: &str = "CPATH";
pub const CXX: &str = "CXX";
pub const JAVA_HOME: &str = "JAVA_HOME";
pub const PATH: &str = "PATH";
pub const GYP_CROSSCOMPILE: &str = "GYP_CROSSCOMPILE";
pub const DEPOT_TOOLS_WIN_TOOLCHAIN: &str = "DEPOT_TOOLS_WIN_TOOLCHAIN";
pub const GYP_MSVS_VERSION: &str = "GYP_MSVS_VERSION";

const CROSS_CXX: &str = "arm-linux-gnueabihf-g++-5";
const CROSS_INCLUDE_PATHS: [&str; 3] = [
  "/usr/arm-linux-gnueabihf/include/c++/5/",
  "/usr/arm-linux-gnueabihf/include/c++/5/arm-linux-gnueabihf/",
  "/usr/arm-linux-gnueabihf/include/c++/5/backward/",
];

const LEGACY_CXX: &str = "g++-4.8";
const LEGACY_INCLUDE_PATHS: [&str; 3] = [
  "/usr/include/c++/4.8/",
  "/usr/include/x86_64-linux-gnu/c++/4.8/",
  "/usr/include/c++/4.8/backward/",
];

const JAVA_HOME_CANDIDATES: [&str; 2] = ["/usr/lib/jvm/java", "/usr/lib/jvm/default-java"];

const MSVS_VERSION: &str = "2013";

/// Environment handed to every build subprocess.
///
/// Holds the full variable set (seed plus overrides) and remembers which
/// variables the deriver set, so they can be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
  vars: BTreeMap<String, String>,
  overridden: Vec<String>,
}

impl BuildEnvironment {
  /// Environment with the given variables and no overrides.
  pub fn from_vars<I, K, V>(vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
      overridden: Vec::new(),
    }
  }

  /// Snapshot of the current process environment.
  ///
  /// Variables that are not valid unicode are skipped.
  pub fn from_process() -> Self {
    Self::from_vars(std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))))
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Variables set by the deriver, in the order they were first set.
  pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .overridden
      .iter()
      .filter_map(|key| self.vars.get_key_value(key))
      .map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Parsed `GYP_DEFINES`.
  pub fn defines(&self) -> Defines {
    Defines::parse(self.get(GYP_DEFINES).unwrap_or_default())
  }

  fn set(&mut self, key: &str, value: impl Into<String>) {
    if !self.overridden.iter().any(|k| k == key) {
      self.overridden.push(key.to_string());
    }
    self.vars.insert(key.to_string(), value.into());
  }
}

/// Inputs to [`derive`].
#[derive(Debug, Clone, Copy)]
pub struct DeriveInputs<'a> {
  pub target: &'a BuildTarget,
  pub layout: &'a ProjectLayout,
  pub invocation: &'a Invocation,
  pub settings: &'a Settings,
}

/// Compute the build environment.
///
/// `probe` reports whether a path exists; it is used to pick a `JAVA_HOME`
/// on Linux.
pub fn derive<P>(inputs: DeriveInputs<'_>, seed: &BuildEnvironment, probe: P) -> BuildEnvironment
where
  P: Fn(&Path) -> bool,
{
  let DeriveInputs {
    target,
    layout,
    invocation,
    settings,
  } = inputs;

  let mut env = BuildEnvironment {
    vars: seed.vars.clone(),
    overridden: Vec::new(),
  };
  let mut defines = seed.defines();

  defines.set("target_arch", target.arch.as_str());
  defines.set("host_arch", target.host_arch.as_str());
  defines.set("node_root_dir", escape_backslashes(&invocation.runtime_dir));
  defines.set("node_lib_file", invocation.runtime_lib.as_str());
  defines.set("node_gyp_dir", escape_backslashes(&invocation.gyp_dir));
  defines.set_bool("build_with_chromium", false);
  defines.set_bool("use_openssl", settings.use_openssl);
  defines.set_bool("use_gtk", settings.use_gtk);
  defines.set_bool("use_x11", settings.use_x11);
  defines.set("ConfigurationName", target.configuration.as_str());
  defines.set_bool("include_tests", false);

  match target.platform {
    Os::MacOs => {
      defines.set_bool("clang", true);
    }
    Os::Windows => {
      env.set(DEPOT_TOOLS_WIN_TOOLCHAIN, "0");
      env.set(GYP_MSVS_VERSION, MSVS_VERSION);
    }
    Os::Linux => {
      if target.cross_compile {
        env.set(GYP_CROSSCOMPILE, "1");
        defines.set_bool("clang", false);
        defines.set_bool("use_system_expat", false);
        env.set(CXX, CROSS_CXX);
        let cpath = prepend_include_paths(&CROSS_INCLUDE_PATHS, seed.get(CPATH));
        env.set(CPATH, cpath);
      } else if target.runtime_version.is_legacy() {
        defines.set_bool("clang", false);
        env.set(CXX, LEGACY_CXX);
        let cpath = prepend_include_paths(&LEGACY_INCLUDE_PATHS, seed.get(CPATH));
        env.set(CPATH, cpath);
      } else {
        defines.set_bool("clang", true);
      }

      if seed.get(JAVA_HOME).is_none_or(str::is_empty) {
        if let Some(java_home) = JAVA_HOME_CANDIDATES.iter().find(|c| probe(Path::new(c))) {
          env.set(JAVA_HOME, *java_home);
        }
      }
    }
    Os::FreeBsd | Os::OpenBsd => {}
  }

  env.set(GYP_DEFINES, defines.render());
  append_depot_tools(&mut env, seed, layout, target.platform);

  debug!(defines = %defines, "derived build environment");
  env
}

/// Seed environment with only depot_tools appended to `PATH`.
///
/// Used by the stages that run before the full environment is derived.
pub fn bootstrap(seed: &BuildEnvironment, layout: &ProjectLayout, os: Os) -> BuildEnvironment {
  let mut env = BuildEnvironment {
    vars: seed.vars.clone(),
    overridden: Vec::new(),
  };
  append_depot_tools(&mut env, seed, layout, os);
  env
}

fn append_depot_tools(env: &mut BuildEnvironment, seed: &BuildEnvironment, layout: &ProjectLayout, os: Os) {
  let path = match seed.get(PATH) {
    Some(path) if !path.is_empty() => format!("{}{}{}", path, os.path_delimiter(), layout.depot_tools.display()),
    _ => layout.depot_tools.display().to_string(),
  };
  env.set(PATH, path);
}

fn escape_backslashes(path: &Path) -> String {
  path.display().to_string().replace('\\', "\\\\")
}

fn prepend_include_paths(paths: &[&str], prior: Option<&str>) -> String {
  let mut value = paths.join(":");
  if let Some(prior) = prior.filter(|p| !p.is_empty()) {
    value.push(':');
    value.push_str(prior);
  }
  value
}
