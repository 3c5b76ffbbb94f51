//! Next-version selection and changelog resolution for publishing.

use clap::ValueEnum;
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};

use crate::cli::prompt::Prompter;
use crate::error::{HubError, Result};
use crate::sync::reconcile::SyncStatus;

/// Version of a skill's first release.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Changelog used for updates when prompting is not possible.
pub const DEFAULT_UPDATE_CHANGELOG: &str = "Sync update";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpClass {
    #[default]
    Patch,
    Minor,
    Major,
}

#[must_use]
pub fn initial_version() -> Version {
    Version::new(1, 0, 0)
}

/// Parse a registry version string, tolerating a leading `v`.
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).map_err(|err| HubError::InvalidVersion(format!("{raw}: {err}")))
}

/// Increment `latest` by `bump`. Pre-release and build metadata are dropped.
///
/// A pre-release whose lower segments are already zero releases the version
/// it leads up to: `1.3.0-rc.1` bumped by minor is `1.3.0`.
pub fn bump_version(latest: &str, bump: BumpClass) -> Result<Version> {
    let mut version = parse_version(latest)?;
    let pre = !version.pre.is_empty();
    let overflow = || HubError::InvalidVersion(format!("{latest}: segment overflow"));
    match bump {
        BumpClass::Patch => {
            if !pre {
                version.patch = version.patch.checked_add(1).ok_or_else(overflow)?;
            }
        }
        BumpClass::Minor => {
            if !pre || version.patch != 0 {
                version.minor = version.minor.checked_add(1).ok_or_else(overflow)?;
            }
            version.patch = 0;
        }
        BumpClass::Major => {
            if !pre || version.minor != 0 || version.patch != 0 {
                version.major = version.major.checked_add(1).ok_or_else(overflow)?;
            }
            version.minor = 0;
            version.patch = 0;
        }
    }
    version.pre = Prerelease::EMPTY;
    version.build = BuildMetadata::EMPTY;
    Ok(version)
}

/// Pick the version to publish for a skill in `status`.
///
/// New skills always start at [`INITIAL_VERSION`]; anything else bumps the
/// registry's latest version and fails when that is absent or not semver.
pub fn resolve_next_version(
    status: SyncStatus,
    latest: Option<&str>,
    bump: BumpClass,
) -> Result<Version> {
    match status {
        SyncStatus::New => Ok(initial_version()),
        SyncStatus::Update | SyncStatus::Synced => {
            let latest = latest.ok_or_else(|| {
                HubError::InvalidVersion("no latest version for a published skill".to_string())
            })?;
            bump_version(latest, bump)
        }
    }
}

/// Resolve the changelog that accompanies a publish.
///
/// A non-empty flag value always wins. New skills otherwise publish with an
/// empty changelog. Updates fall back to [`DEFAULT_UPDATE_CHANGELOG`] when
/// prompting is disabled, and otherwise ask; an empty answer is an error and
/// an aborted prompt is [`HubError::Cancelled`].
pub fn resolve_changelog(
    status: SyncStatus,
    flag: Option<&str>,
    prompter: Option<&mut dyn Prompter>,
    slug: &str,
    version: &Version,
) -> Result<String> {
    let flag = flag.map(str::trim).unwrap_or_default();
    if !flag.is_empty() {
        return Ok(flag.to_string());
    }
    if status == SyncStatus::New {
        return Ok(String::new());
    }
    let Some(prompter) = prompter else {
        return Ok(DEFAULT_UPDATE_CHANGELOG.to_string());
    };

    let answer = prompter
        .text(&format!("Changelog for {slug}@{version}"))?
        .ok_or(HubError::Cancelled)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(HubError::MissingChangelog(slug.to_string()));
    }
    Ok(answer.to_string())
}
