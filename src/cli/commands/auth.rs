//! Token management
//!
//! - `clawdhub login --token <t>` - Validate and store a token
//! - `clawdhub logout`            - Remove the stored token
//! - `clawdhub whoami`            - Show the token's account

use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::GlobalConfig;
use crate::error::{HubError, Result};
use crate::registry::{HttpRegistry, SkillRegistry};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// API token issued by the site
    #[arg(long, env = "CLAWDHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

pub fn login(ctx: &AppContext, args: &LoginArgs) -> Result<()> {
    let token = match args.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => {
            return Err(HubError::ValidationFailed(
                "--token required (create one on the site under Settings)".to_string(),
            ));
        }
    };

    let registry = HttpRegistry::new(&ctx.settings.registry, Some(&token))?;
    let spinner = ctx.progress().spinner("Verifying token");
    let whoami = match registry.whoami() {
        Ok(whoami) => whoami,
        Err(err) => {
            spinner.abandon_with_message("Token rejected");
            return Err(err);
        }
    };
    spinner.finish();

    let config = GlobalConfig {
        registry: Some(ctx.settings.registry.clone()),
        token: Some(token),
    };
    config.save(&ctx.settings.config_path)?;
    let handle = whoami.user.handle.unwrap_or_default();
    info!(handle = %handle, "logged in");

    if ctx.robot_mode() {
        return emit_json(&robot_ok(serde_json::json!({
            "handle": handle,
            "registry": ctx.settings.registry,
            "configPath": ctx.settings.config_path,
        })));
    }
    let mut layout = HumanLayout::new();
    layout
        .push_line(format!("OK. Logged in as {}", display_handle(&handle)))
        .kv("Registry", &ctx.settings.registry);
    emit_human(layout);
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    let had_token = ctx.config.token.is_some();
    if had_token {
        let config = GlobalConfig {
            token: None,
            ..ctx.config.clone()
        };
        config.save(&ctx.settings.config_path)?;
    }

    if ctx.robot_mode() {
        return emit_json(&robot_ok(serde_json::json!({ "loggedOut": had_token })));
    }
    if had_token {
        println!("OK. Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    let registry = ctx.authed_registry()?;
    let whoami = registry.whoami()?;
    let handle = whoami.user.handle.unwrap_or_default();

    if ctx.robot_mode() {
        return emit_json(&robot_ok(serde_json::json!({
            "handle": handle,
            "registry": ctx.settings.registry,
        })));
    }
    println!("{}", display_handle(&handle));
    Ok(())
}

fn display_handle(handle: &str) -> &str {
    if handle.is_empty() { "user" } else { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn parse_login_token() {
        let cli = Cli::try_parse_from(["clawdhub", "login", "--token", "abc"]).unwrap();
        match cli.command {
            Commands::Login(args) => assert_eq!(args.token.as_deref(), Some("abc")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn blank_handle_falls_back() {
        assert_eq!(display_handle(""), "user");
        assert_eq!(display_handle("steipete"), "steipete");
    }
}
