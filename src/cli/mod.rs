//! Command-line interface definition.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(
    name = "skillsync",
    version,
    about = "Install and update a git-tracked skills directory",
    long_about = "Keeps a personal skills directory in sync with a fork of a shared \
                  repository. Entries under skills/ whose names start with the private \
                  prefix are never synced and survive every install and update."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit JSON on stdout instead of human-readable text
    #[arg(long, global = true, env = "SKILLSYNC_ROBOT")]
    pub robot: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use this config file instead of the global one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the managed directory
    #[arg(long, global = true, value_name = "DIR")]
    pub managed_dir: Option<PathBuf>,
}
