//! Classification of local skills against the registry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HubError, Result};
use crate::registry::SkillRegistry;
use crate::skills::collect::collect_files;
use crate::skills::hash::hash_skill_files;
use crate::skills::scan::SkillFolder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Local content equals a published version
    Synced,
    /// Nothing published under the slug yet
    New,
    /// Published, but no version matches the local content
    Update,
}

impl SyncStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::New => "new",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local skill folder with its fingerprint and registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(flatten)]
    pub skill: SkillFolder,
    pub fingerprint: String,
    pub file_count: usize,
    pub status: SyncStatus,
    pub match_version: Option<String>,
    pub latest_version: Option<String>,
}

impl Candidate {
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.skill.slug
    }
}

/// Pure status decision from what the registry reported.
#[must_use]
pub const fn classify(latest: Option<&str>, matched: Option<&str>) -> SyncStatus {
    match (latest, matched) {
        (None, _) => SyncStatus::New,
        (Some(_), Some(_)) => SyncStatus::Synced,
        (Some(_), None) => SyncStatus::Update,
    }
}

/// Latest published version, `None` when the registry does not know the slug.
pub fn latest_published<R: SkillRegistry + ?Sized>(
    registry: &R,
    slug: &str,
) -> Result<Option<String>> {
    match registry.skill_meta(slug) {
        Ok(meta) => Ok(meta.latest().map(ToString::to_string)),
        Err(HubError::SkillNotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Version whose fingerprint equals `fingerprint`.
///
/// Only a "skill not found" answer counts as no match; every other failure
/// propagates so an unreachable registry never looks like an update.
pub fn matching_version<R: SkillRegistry + ?Sized>(
    registry: &R,
    slug: &str,
    fingerprint: &str,
) -> Result<Option<String>> {
    match registry.resolve(slug, fingerprint) {
        Ok(resolved) => Ok(resolved.match_version().map(ToString::to_string)),
        Err(HubError::SkillNotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Fingerprint one folder and classify it.
pub fn reconcile_skill<R: SkillRegistry + ?Sized>(
    registry: &R,
    skill: SkillFolder,
) -> Result<Candidate> {
    let files = collect_files(&skill.folder)?;
    let hashed = hash_skill_files(&files);

    let latest_version = latest_published(registry, &skill.slug)?;
    let match_version = match latest_version {
        Some(_) => matching_version(registry, &skill.slug, &hashed.fingerprint)?,
        None => None,
    };
    let status = classify(latest_version.as_deref(), match_version.as_deref());
    debug!(slug = %skill.slug, %status, fingerprint = %hashed.fingerprint, "reconciled");

    Ok(Candidate {
        skill,
        fingerprint: hashed.fingerprint,
        file_count: files.len(),
        status,
        match_version,
        latest_version,
    })
}

/// Reconcile every skill in scan order. The first hard failure aborts.
pub fn reconcile_all<R, F>(
    registry: &R,
    skills: Vec<SkillFolder>,
    mut on_skill: F,
) -> Result<Vec<Candidate>>
where
    R: SkillRegistry + ?Sized,
    F: FnMut(&SkillFolder),
{
    let mut candidates = Vec::with_capacity(skills.len());
    for skill in skills {
        on_skill(&skill);
        candidates.push(reconcile_skill(registry, skill)?);
    }
    Ok(candidates)
}

/// Split into (already synced, actionable), keeping order within each side.
#[must_use]
pub fn partition(candidates: Vec<Candidate>) -> (Vec<Candidate>, Vec<Candidate>) {
    candidates
        .into_iter()
        .partition(|candidate| candidate.status == SyncStatus::Synced)
}
