//! Content digests and order-independent skill fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::skills::collect::CollectedFile;

/// A (relative path, content digest) pair that feeds the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    pub path: String,
    pub sha256: String,
}

/// Per-file hashing result kept alongside the fingerprint for publishing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedFile {
    pub path: String,
    pub size: u64,
    pub sha256: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HashedSkill {
    pub files: Vec<HashedFile>,
    pub fingerprint: String,
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Fold digests into one fingerprint.
///
/// Entries are sorted by path (then digest) before folding, so the result
/// only depends on the set of pairs, never on the order they were listed.
#[must_use]
pub fn build_fingerprint(entries: &[FileDigest]) -> String {
    let mut sorted: Vec<&FileDigest> = entries.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.sha256.cmp(&b.sha256)));

    let mut payload = String::new();
    for entry in sorted {
        payload.push_str(&entry.path);
        payload.push('\n');
        payload.push_str(&entry.sha256);
        payload.push('\n');
    }
    sha256_hex(payload.as_bytes())
}

/// Hash every collected file and derive the skill fingerprint.
#[must_use]
pub fn hash_skill_files(files: &[CollectedFile]) -> HashedSkill {
    let hashed: Vec<HashedFile> = files
        .iter()
        .map(|file| HashedFile {
            path: file.rel_path.clone(),
            size: file.bytes.len() as u64,
            sha256: sha256_hex(&file.bytes),
            content_type: file.content_type.to_string(),
        })
        .collect();

    let digests: Vec<FileDigest> = hashed
        .iter()
        .map(|file| FileDigest {
            path: file.path.clone(),
            sha256: file.sha256.clone(),
        })
        .collect();

    HashedSkill {
        fingerprint: build_fingerprint(&digests),
        files: hashed,
    }
}
