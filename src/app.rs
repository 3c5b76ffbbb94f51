//! Per-invocation application context.

use std::io::IsTerminal;

use tracing::debug;

use crate::cli::Cli;
use crate::cli::output::OutputFormat;
use crate::cli::progress::ProgressReporter;
use crate::config::{GlobalConfig, Overrides, Settings, TOKEN_ENV, env_string};
use crate::error::Result;
use crate::registry::HttpRegistry;

pub struct AppContext {
    pub settings: Settings,
    pub config: GlobalConfig,
    pub output_format: OutputFormat,
    /// Prompts may be shown
    pub input_allowed: bool,
    pub verbosity: u8,
    pub quiet: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = GlobalConfig::default_path()?;
        let config = GlobalConfig::load(&config_path)?;
        let cwd = std::env::current_dir()?;
        let overrides = Overrides {
            workdir: cli.workdir.clone(),
            dir: cli.dir.clone(),
            site: cli.site.clone(),
            registry: cli.registry.clone(),
        };
        let settings = Settings::resolve(
            &overrides,
            &config,
            config_path,
            env_string(TOKEN_ENV),
            &cwd,
        );
        debug!(
            workdir = %settings.workdir.display(),
            dir = %settings.dir.display(),
            registry = %settings.registry,
            "resolved settings"
        );

        let output_format = cli.output_format();
        let input_allowed = !cli.no_input
            && !output_format.is_machine_readable()
            && std::io::stdin().is_terminal()
            && std::io::stderr().is_terminal();

        Ok(Self {
            settings,
            config,
            output_format,
            input_allowed,
            verbosity: cli.verbose,
            quiet: cli.quiet,
        })
    }

    #[must_use]
    pub const fn robot_mode(&self) -> bool {
        self.output_format.is_machine_readable()
    }

    /// Client for the configured registry, authenticated when a token exists.
    pub fn registry(&self) -> Result<HttpRegistry> {
        HttpRegistry::new(&self.settings.registry, self.settings.token.as_deref())
    }

    /// Client that requires a token.
    pub fn authed_registry(&self) -> Result<HttpRegistry> {
        let token = self.settings.require_token()?;
        HttpRegistry::new(&self.settings.registry, Some(token))
    }

    #[must_use]
    pub fn progress(&self) -> ProgressReporter {
        ProgressReporter::new(self.robot_mode(), self.quiet)
    }
}
