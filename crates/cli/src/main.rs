mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anvil_lib::build::MsvcRuntime;

use crate::output::{OutputFormat, print_error};

/// anvil - build and install packages from source
#[derive(Parser)]
#[command(name = "anvil")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch, build and install a package
  Forge {
    /// Index name, repository URL or local directory
    target: String,

    /// MSVC runtime library for this build (MD or MT)
    #[arg(long, value_parser = parse_runtime)]
    msvc_runtime: Option<MsvcRuntime>,

    /// Build with position-independent code
    #[arg(long, overrides_with = "no_force_pic")]
    force_pic: bool,

    /// Build without position-independent code, overriding ANVIL_FORCE_PIC
    #[arg(long, overrides_with = "force_pic")]
    no_force_pic: bool,

    /// Always build from source
    #[arg(long)]
    no_release_check: bool,
  },

  /// Add a repository to the local index and print its submission link
  Submit {
    /// Repository URL
    url: String,
  },

  /// Search the index by name or description
  Search {
    query: String,
  },

  /// Remove an installed package and its entry points
  Uninstall {
    name: String,
  },

  /// Sync the registry checkout
  Update,

  /// List installed packages
  List,

  /// Clear build workspaces and orphaned entry points
  Housekeeping,

  /// Inspect or repair the index checkout
  Index {
    #[command(subcommand)]
    command: IndexCommands,
  },
}

#[derive(Subcommand)]
enum IndexCommands {
  /// Report problems with the index checkout
  Check,
  /// Re-clone an invalid checkout, keeping the local store
  Repair,
}

fn parse_runtime(value: &str) -> Result<MsvcRuntime, String> {
  MsvcRuntime::parse(value).ok_or_else(|| format!("invalid runtime '{}', expected MD or MT", value))
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_env("ANVIL_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let cli = Cli::parse();

  if let Err(e) = run(cli) {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let output = cli.output;
  match cli.command {
    Commands::Forge {
      target,
      msvc_runtime,
      force_pic,
      no_force_pic,
      no_release_check,
    } => {
      let force_pic = pic_override(force_pic, no_force_pic);
      cmd::cmd_forge(&target, msvc_runtime, force_pic, no_release_check, output)
    }
    Commands::Submit { url } => cmd::cmd_submit(&url, output),
    Commands::Search { query } => cmd::cmd_search(&query, output),
    Commands::Uninstall { name } => cmd::cmd_uninstall(&name),
    Commands::Update => cmd::cmd_update(),
    Commands::List => cmd::cmd_list(output),
    Commands::Housekeeping => cmd::cmd_housekeeping(output),
    Commands::Index { command } => match command {
      IndexCommands::Check => cmd::cmd_index_check(output),
      IndexCommands::Repair => cmd::cmd_index_repair(output),
    },
  }
}

/// `None` leaves the choice to the manifest and environment.
fn pic_override(force: bool, disable: bool) -> Option<bool> {
  match (force, disable) {
    (true, _) => Some(true),
    (_, true) => Some(false),
    _ => None,
  }
}
