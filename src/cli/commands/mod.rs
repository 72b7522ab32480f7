//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod backups;
pub mod doctor;
pub mod install;
pub mod status;
pub mod update;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clone your fork into the managed directory (or update it if already installed)
    Install(install::InstallArgs),

    /// Rebase the managed directory onto your fork, or onto upstream
    Update(update::UpdateArgs),

    /// Show the state of the managed directory
    Status(status::StatusArgs),

    /// Check tools, authentication and configuration
    Doctor(doctor::DoctorArgs),

    /// List backup snapshots
    Backups(backups::BackupsArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Install(args) => install::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
        Commands::Status(args) => status::run(ctx, args),
        Commands::Doctor(args) => doctor::run(ctx, args),
        Commands::Backups(args) => backups::run(ctx, args),
    }
}
