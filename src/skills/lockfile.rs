//! Local record of installed skill versions (`.clawdhub/lock.json`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::utils::fs::write_atomic;

pub const LOCKFILE_DIR: &str = ".clawdhub";
pub const LOCKFILE_NAME: &str = "lock.json";
pub const LOCKFILE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockfileEntry {
    pub version: String,
    /// Milliseconds since the Unix epoch
    pub installed_at: i64,
}

impl LockfileEntry {
    #[must_use]
    pub fn now(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            installed_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub version: u32,
    #[serde(default)]
    pub skills: BTreeMap<String, LockfileEntry>,
}

impl Default for Lockfile {
    fn default() -> Self {
        Self {
            version: LOCKFILE_VERSION,
            skills: BTreeMap::new(),
        }
    }
}

impl Lockfile {
    #[must_use]
    pub fn path(workdir: &Path) -> PathBuf {
        workdir.join(LOCKFILE_DIR).join(LOCKFILE_NAME)
    }

    /// Read the lockfile under `workdir`.
    ///
    /// A missing, unreadable, or malformed file yields an empty lockfile.
    #[must_use]
    pub fn read(workdir: &Path) -> Self {
        let path = Self::path(workdir);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %err, "lockfile unreadable, treating as empty");
                }
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(lock) if lock.version == LOCKFILE_VERSION => lock,
            Ok(lock) => {
                debug!(version = lock.version, "unknown lockfile version, treating as empty");
                Self::default()
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "lockfile corrupt, treating as empty");
                Self::default()
            }
        }
    }

    /// Persist under `workdir` via a temp file and rename.
    pub fn write(&self, workdir: &Path) -> Result<()> {
        let path = Self::path(workdir);
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        write_atomic(&path, content.as_bytes())?;
        debug!(path = %path.display(), skills = self.skills.len(), "lockfile written");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&LockfileEntry> {
        self.skills.get(slug)
    }

    pub fn record(&mut self, slug: impl Into<String>, entry: LockfileEntry) {
        self.skills.insert(slug.into(), entry);
    }

    pub fn remove(&mut self, slug: &str) -> Option<LockfileEntry> {
        self.skills.remove(slug)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_and_reads_lockfile() {
        let workdir = tempdir().unwrap();
        let mut lock = Lockfile::default();
        lock.record(
            "demo",
            LockfileEntry {
                version: "1.0.0".to_string(),
                installed_at: 1,
            },
        );
        lock.write(workdir.path()).unwrap();

        let read = Lockfile::read(workdir.path());
        assert_eq!(read.get("demo").unwrap().version, "1.0.0");
        assert_eq!(read.get("demo").unwrap().installed_at, 1);
        assert!(!Lockfile::path(workdir.path()).with_extension("json.tmp").exists());
    }

    #[test]
    fn returns_empty_lockfile_on_invalid_json() {
        let workdir = tempdir().unwrap();
        std::fs::create_dir_all(workdir.path().join(".clawdhub")).unwrap();
        std::fs::write(workdir.path().join(".clawdhub/lock.json"), "{").unwrap();

        assert_eq!(Lockfile::read(workdir.path()), Lockfile::default());
    }

    #[test]
    fn returns_empty_lockfile_when_missing() {
        let workdir = tempdir().unwrap();
        let lock = Lockfile::read(workdir.path());
        assert_eq!(lock.version, 1);
        assert!(lock.is_empty());
    }

    #[test]
    fn wrong_shape_is_treated_as_empty() {
        let workdir = tempdir().unwrap();
        std::fs::create_dir_all(workdir.path().join(".clawdhub")).unwrap();
        std::fs::write(
            workdir.path().join(".clawdhub/lock.json"),
            r#"{"version":1,"skills":{"demo":{"version":3}}}"#,
        )
        .unwrap();
        assert!(Lockfile::read(workdir.path()).is_empty());

        std::fs::write(
            workdir.path().join(".clawdhub/lock.json"),
            r#"{"version":2,"skills":{}}"#,
        )
        .unwrap();
        assert_eq!(Lockfile::read(workdir.path()), Lockfile::default());
    }

    #[test]
    fn serializes_camel_case_shape() {
        let mut lock = Lockfile::default();
        lock.record(
            "demo",
            LockfileEntry {
                version: "1.0.0".into(),
                installed_at: 1,
            },
        );
        let value = serde_json::to_value(&lock).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"version": 1, "skills": {"demo": {"version": "1.0.0", "installedAt": 1}}})
        );
    }
}
