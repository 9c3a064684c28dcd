mod cmd;
mod output;
mod prompts;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::InvocationArgs;
use output::print_error;

/// rtcbuild - bootstrap and build the WebRTC node addon
#[derive(Parser)]
#[command(name = "rtcbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Log filter (e.g. `debug`, `rtcbuild_lib=trace`); overrides RUST_LOG
  #[arg(long, global = true)]
  log_level: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch sources and compile the addon
  Build {
    #[command(flatten)]
    args: InvocationArgs,

    /// Install the compiled addon and upload it when credentials are set
    #[arg(long)]
    install: bool,
  },

  /// Print the derived build environment without running anything
  Env {
    #[command(flatten)]
    args: InvocationArgs,

    /// Print every variable, not only the ones rtcbuild sets
    #[arg(long)]
    all: bool,

    #[arg(long)]
    json: bool,
  },

  /// Show recorded build progress
  Status {
    /// Project root (default: current directory)
    #[arg(long, default_value = ".")]
    root: std::path::PathBuf,

    #[arg(long)]
    json: bool,
  },

  /// Forget recorded progress so the next build re-runs every stage
  Reset {
    /// Project root (default: current directory)
    #[arg(long, default_value = ".")]
    root: std::path::PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    force: bool,
  },
}

fn init_tracing(log_level: Option<&str>) {
  let filter = match log_level {
    Some(level) => EnvFilter::new(level),
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  match cli.command {
    Commands::Build { args, install } => cmd::cmd_build(&args, install),
    Commands::Env { args, all, json } => cmd::cmd_env(&args, all, json),
    Commands::Status { root, json } => cmd::cmd_status(&root, json),
    Commands::Reset { root, force } => cmd::cmd_reset(&root, force),
  }
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.log_level.as_deref());

  if let Err(err) = run(cli) {
    print_error(&format!("{err:#}"));
    std::process::exit(1);
  }
}
