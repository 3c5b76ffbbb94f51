//! clawdhub - skill registry client
//!
//! Publish local skill folders, install published ones, and keep both in sync.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use clawdhub::app::AppContext;
use clawdhub::cli::Cli;
use clawdhub::cli::output::{emit_json, robot_error_structured};
use clawdhub::{HubError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            eprintln!("Canceled");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if cli.json {
                // a partial-failure document was already written by the command
                if !matches!(e, HubError::PartialFailure { .. }) {
                    let _ = emit_json(&robot_error_structured(&e));
                }
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    clawdhub::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info,clawdhub=debug",
        2 => "debug,clawdhub=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
