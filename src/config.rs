//! Configuration for clawdhub.
//!
//! Two layers: the global JSON config file (registry and token, written by
//! `login`) and the per-invocation [`Settings`] resolved from flags,
//! environment, the config file, and defaults, in that order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HubError, Result};
use crate::registry::{DEFAULT_REGISTRY, DEFAULT_SITE};
use crate::utils::fs::{resolve_against, write_atomic};

pub const CONFIG_PATH_ENV: &str = "CLAWDHUB_CONFIG_PATH";
pub const TOKEN_ENV: &str = "CLAWDHUB_TOKEN";
pub const DEFAULT_SKILLS_DIR: &str = "skills";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl GlobalConfig {
    /// `$CLAWDHUB_CONFIG_PATH`, else `<config_dir>/clawdhub/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env_string(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("clawdhub").join("config.json"))
            .ok_or_else(|| HubError::Config("config directory not found".to_string()))
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| HubError::Config(format!("read config {}: {err}", path.display())))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_json::from_str(&raw)
            .map_err(|err| HubError::Config(format!("parse config {}: {err}", path.display())))?;
        debug!(path = %path.display(), "loaded global config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        write_atomic(path, content.as_bytes())
    }
}

/// Values supplied on the command line (or through their clap env fallbacks).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workdir: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub site: Option<String>,
    pub registry: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub workdir: PathBuf,
    pub dir: PathBuf,
    pub site: String,
    pub registry: String,
    #[serde(skip)]
    pub token: Option<String>,
    pub config_path: PathBuf,
}

impl Settings {
    /// Resolve settings. `cwd` anchors relative paths; `env_token` is the
    /// value of `CLAWDHUB_TOKEN`, if any.
    #[must_use]
    pub fn resolve(
        overrides: &Overrides,
        config: &GlobalConfig,
        config_path: PathBuf,
        env_token: Option<String>,
        cwd: &Path,
    ) -> Self {
        let workdir = overrides
            .workdir
            .as_deref()
            .map_or_else(|| resolve_against(cwd, Path::new(".")), |w| resolve_against(cwd, w));
        let dir = resolve_against(
            &workdir,
            overrides
                .dir
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_SKILLS_DIR)),
        );
        let site = non_empty(overrides.site.as_deref())
            .unwrap_or(DEFAULT_SITE)
            .to_string();
        let registry = non_empty(overrides.registry.as_deref())
            .or_else(|| non_empty(config.registry.as_deref()))
            .unwrap_or(DEFAULT_REGISTRY)
            .trim_end_matches('/')
            .to_string();
        let token = non_empty(env_token.as_deref())
            .or_else(|| non_empty(config.token.as_deref()))
            .map(ToString::to_string);

        Self {
            workdir,
            dir,
            site,
            registry,
            token,
            config_path,
        }
    }

    /// Token or [`HubError::NotLoggedIn`].
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(HubError::NotLoggedIn)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
