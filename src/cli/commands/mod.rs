//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod auth;
pub mod install;
pub mod list;
pub mod publish;
pub mod sync;
pub mod update;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Login(args) => auth::login(ctx, args),
        Commands::Logout => auth::logout(ctx),
        Commands::Whoami => auth::whoami(ctx),
        Commands::Install(args) => install::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
        Commands::List => list::run(ctx),
        Commands::Publish(args) => publish::run(ctx, args),
        Commands::Sync(args) => sync::run(ctx, args),
    }
}
