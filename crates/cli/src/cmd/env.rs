//! Implementation of the `rtcbuild env` command.

use std::collections::BTreeMap;

use anyhow::Result;

use super::InvocationArgs;
use crate::output::print_json;

/// Print the environment `build` would hand to gclient, gn and ninja.
///
/// Nothing is spawned and nothing on disk changes.
pub fn cmd_env(args: &InvocationArgs, all: bool, json: bool) -> Result<()> {
  let ctx = args.load_context()?;
  let env = ctx.derive_environment();

  let vars: BTreeMap<&str, &str> = if all { env.iter().collect() } else { env.overrides().collect() };

  if json {
    print_json(&vars)?;
  } else {
    for (key, value) in vars {
      println!("{key}={value}");
    }
  }

  Ok(())
}
