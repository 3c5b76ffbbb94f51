//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;
pub mod progress;
pub mod prompt;

/// ClawdHub - publish, install, and sync agent skills
#[derive(Parser, Debug)]
#[command(name = "clawdhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Working directory (default: current directory)
    #[arg(long, global = true, env = "CLAWDHUB_WORKDIR", value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Skills directory, relative to the workdir (default: skills)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Site base URL
    #[arg(long, global = true, env = "CLAWDHUB_SITE", value_name = "URL")]
    pub site: Option<String>,

    /// Registry API base URL
    #[arg(long, global = true, env = "CLAWDHUB_REGISTRY", value_name = "URL")]
    pub registry: Option<String>,

    /// Never prompt; use defaults or fail
    #[arg(long, global = true)]
    pub no_input: bool,

    /// Machine-readable JSON output on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    #[must_use]
    pub const fn output_format(&self) -> OutputFormat {
        OutputFormat::from_json_flag(self.json)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store an API token after validating it with the registry
    Login(commands::auth::LoginArgs),

    /// Remove the stored API token
    Logout,

    /// Show the account the stored token belongs to
    Whoami,

    /// Install a skill into the skills directory
    Install(commands::install::InstallArgs),

    /// Update installed skills
    Update(commands::update::UpdateArgs),

    /// List skills recorded in the lockfile
    List,

    /// Publish one skill folder
    Publish(commands::publish::PublishArgs),

    /// Publish new and changed local skills
    Sync(commands::sync::SyncArgs),
}
