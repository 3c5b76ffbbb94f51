//! In-memory registry for tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{
    PublishRequest, PublishResponse, ResolveResult, SkillMeta, SkillPublisher, SkillRegistry,
    VersionRef, WhoamiResponse, WhoamiUser,
};
use crate::error::{HubError, Result};

#[derive(Debug, Clone)]
pub struct FakeVersion {
    pub version: String,
    pub fingerprint: String,
    pub archive: Vec<u8>,
}

/// Registry double. Published versions become visible to later lookups, so
/// a publish followed by a reconcile behaves like the real service.
#[derive(Debug, Default)]
pub struct FakeRegistry {
    pub skills: RefCell<BTreeMap<String, Vec<FakeVersion>>>,
    pub published: RefCell<Vec<PublishRequest>>,
    /// Answer resolve misses with a "skill not found" error instead of a null match
    pub resolve_miss_is_error: bool,
    /// Fail every resolve call with this HTTP status
    pub resolve_status: Option<u16>,
    /// Fail publishing of these slugs
    pub reject_publish: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeRegistry {
    pub fn with_version(self, slug: &str, version: &str, fingerprint: &str) -> Self {
        self.add_version(slug, version, fingerprint, Vec::new());
        self
    }

    pub fn add_version(&self, slug: &str, version: &str, fingerprint: &str, archive: Vec<u8>) {
        self.skills
            .borrow_mut()
            .entry(slug.to_string())
            .or_default()
            .push(FakeVersion {
                version: version.to_string(),
                fingerprint: fingerprint.to_string(),
                archive,
            });
    }

    fn latest(&self, slug: &str) -> Option<VersionRef> {
        self.skills
            .borrow()
            .get(slug)
            .and_then(|versions| versions.last())
            .map(|v| VersionRef {
                version: v.version.clone(),
            })
    }
}

impl SkillRegistry for FakeRegistry {
    fn whoami(&self) -> Result<WhoamiResponse> {
        self.calls.borrow_mut().push("whoami".into());
        Ok(WhoamiResponse {
            user: WhoamiUser {
                handle: Some("tester".into()),
            },
        })
    }

    fn skill_meta(&self, slug: &str) -> Result<SkillMeta> {
        self.calls.borrow_mut().push(format!("meta {slug}"));
        match self.latest(slug) {
            Some(latest) => Ok(SkillMeta {
                latest_version: Some(latest),
            }),
            None => Err(HubError::SkillNotFound(slug.to_string())),
        }
    }

    fn resolve(&self, slug: &str, fingerprint: &str) -> Result<ResolveResult> {
        self.calls.borrow_mut().push(format!("resolve {slug}"));
        if let Some(status) = self.resolve_status {
            return Err(HubError::Registry {
                status,
                message: "unavailable".into(),
            });
        }
        let matched = self.skills.borrow().get(slug).and_then(|versions| {
            versions
                .iter()
                .rev()
                .find(|v| v.fingerprint == fingerprint)
                .map(|v| VersionRef {
                    version: v.version.clone(),
                })
        });
        if matched.is_none() && self.resolve_miss_is_error {
            return Err(HubError::SkillNotFound(slug.to_string()));
        }
        Ok(ResolveResult {
            matched,
            latest_version: self.latest(slug),
        })
    }

    fn download(&self, slug: &str, version: Option<&str>) -> Result<Vec<u8>> {
        self.calls
            .borrow_mut()
            .push(format!("download {slug}@{}", version.unwrap_or("latest")));
        let skills = self.skills.borrow();
        let versions = skills
            .get(slug)
            .ok_or_else(|| HubError::SkillNotFound(slug.to_string()))?;
        let found = match version {
            Some(version) => versions.iter().find(|v| v.version == version),
            None => versions.last(),
        };
        found
            .map(|v| v.archive.clone())
            .ok_or_else(|| HubError::SkillNotFound(slug.to_string()))
    }
}

impl SkillPublisher for FakeRegistry {
    fn publish(&self, request: &PublishRequest) -> Result<PublishResponse> {
        if self.reject_publish.contains(&request.slug) {
            return Err(HubError::Registry {
                status: 400,
                message: format!("rejected {}", request.slug),
            });
        }
        self.add_version(
            &request.slug,
            &request.version,
            &request.fingerprint,
            Vec::new(),
        );
        self.published.borrow_mut().push(request.clone());
        Ok(PublishResponse {
            ok: true,
            skill_id: Some(request.slug.clone()),
            version_id: Some(request.version.clone()),
        })
    }
}
