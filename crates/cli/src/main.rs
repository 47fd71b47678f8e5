mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_build, cmd_clean, cmd_plan};
use crate::output::OutputFormat;

/// grist - incremental package builder
#[derive(Parser)]
#[command(name = "grist")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  /// Workspace root containing grist.json
  #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
  dir: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build packages and link commands
  Build {
    /// Import paths to build (default: every command package)
    paths: Vec<String>,

    /// Rebuild everything, ignoring installed packages
    #[arg(short, long)]
    force: bool,

    /// Build test binaries instead of packages
    #[arg(long)]
    test: bool,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the build order and what is out of date
  Plan {
    /// Import paths to plan (default: every command package)
    paths: Vec<String>,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Remove the object and package directories
  Clean,
}

fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match cli.command {
    Commands::Build {
      paths,
      force,
      test,
      output,
    } => cmd_build(&cli.dir, &paths, force, test, output),
    Commands::Plan { paths, output } => cmd_plan(&cli.dir, &paths, output),
    Commands::Clean => cmd_clean(&cli.dir),
  }
}
