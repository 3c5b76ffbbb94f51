//! Registry API surface.
//!
//! The sync and install flows talk to the registry only through
//! [`SkillRegistry`] and [`SkillPublisher`]; [`HttpRegistry`] is the
//! production implementation.

mod client;
#[cfg(test)]
pub(crate) mod fake;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::skills::collect::collect_files;
use crate::skills::hash::{HashedFile, hash_skill_files};

pub use client::HttpRegistry;

pub const DEFAULT_SITE: &str = "https://clawdhub.com";
pub const DEFAULT_REGISTRY: &str = "https://clawdhub.com";

/// API paths relative to the registry base URL.
pub mod routes {
    pub const DOWNLOAD: &str = "/api/download";
    pub const SKILL: &str = "/api/skill";
    pub const SKILL_RESOLVE: &str = "/api/skill/resolve";
    pub const CLI_WHOAMI: &str = "/api/cli/whoami";
    pub const CLI_UPLOAD_URL: &str = "/api/cli/upload-url";
    pub const CLI_PUBLISH: &str = "/api/cli/publish";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub version: String,
}

/// `GET /api/skill?slug=`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMeta {
    #[serde(default)]
    pub latest_version: Option<VersionRef>,
}

impl SkillMeta {
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.latest_version.as_ref().map(|v| v.version.as_str())
    }
}

/// `GET /api/skill/resolve?slug=&hash=`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResult {
    #[serde(default, rename = "match")]
    pub matched: Option<VersionRef>,
    #[serde(default)]
    pub latest_version: Option<VersionRef>,
}

impl ResolveResult {
    #[must_use]
    pub fn match_version(&self) -> Option<&str> {
        self.matched.as_ref().map(|v| v.version.as_str())
    }

    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.latest_version.as_ref().map(|v| v.version.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoamiUser {
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoamiResponse {
    #[serde(default)]
    pub user: WhoamiUser,
}

/// A file ready for upload.
#[derive(Debug, Clone)]
pub struct PublishFile {
    pub meta: HashedFile,
    pub bytes: Vec<u8>,
}

/// Everything needed to publish one skill version.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub slug: String,
    pub display_name: String,
    pub version: String,
    pub changelog: String,
    pub tags: Vec<String>,
    pub fingerprint: String,
    pub files: Vec<PublishFile>,
}

impl PublishRequest {
    /// Collect and hash `folder` into a publish request.
    pub fn from_folder(
        folder: &Path,
        slug: &str,
        display_name: &str,
        version: &str,
        changelog: &str,
        tags: Vec<String>,
    ) -> Result<Self> {
        let collected = collect_files(folder)?;
        let hashed = hash_skill_files(&collected);
        let files = hashed
            .files
            .into_iter()
            .zip(collected)
            .map(|(meta, file)| PublishFile {
                meta,
                bytes: file.bytes,
            })
            .collect();
        Ok(Self {
            slug: slug.to_string(),
            display_name: display_name.to_string(),
            version: version.to_string(),
            changelog: changelog.to_string(),
            tags,
            fingerprint: hashed.fingerprint,
            files,
        })
    }
}

/// Split a comma-separated tag list, dropping blanks.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
}

/// Read side of the registry.
///
/// Lookups for unknown skills fail with
/// [`HubError::SkillNotFound`](crate::error::HubError::SkillNotFound) so
/// callers can tell "not published" apart from transport failures.
pub trait SkillRegistry {
    fn whoami(&self) -> Result<WhoamiResponse>;

    fn skill_meta(&self, slug: &str) -> Result<SkillMeta>;

    fn resolve(&self, slug: &str, fingerprint: &str) -> Result<ResolveResult>;

    /// Zip payload of `slug` at `version` (latest when `None`).
    fn download(&self, slug: &str, version: Option<&str>) -> Result<Vec<u8>>;
}

pub trait SkillPublisher {
    fn publish(&self, request: &PublishRequest) -> Result<PublishResponse>;
}
