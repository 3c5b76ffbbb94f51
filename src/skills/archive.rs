//! Zip extraction for downloaded skill archives.
//!
//! Archive contents come from the network. Every entry name is normalized
//! lexically and entries that would land outside the destination are skipped
//! without aborting the rest of the extraction.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{HubError, Result};

/// Outcome of an extraction, listing written and skipped entry names.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExtractReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Normalize an archive entry name into a relative path under the destination.
///
/// Returns `None` for empty names, absolute paths, drive prefixes, and any
/// `..` that would climb above the destination root.
#[must_use]
pub fn safe_entry_path(name: &str) -> Option<PathBuf> {
    if name.contains('\0') {
        return None;
    }
    let unified = name.replace('\\', "/");
    if unified.starts_with('/') {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    // "C:foo" style names survive component parsing on unix
    if parts.first().is_some_and(|first| first.contains(':')) {
        return None;
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.iter().collect())
}

/// Extract `bytes` (a zip payload) into `dest`, creating parents as needed
/// and overwriting existing files.
///
/// Only an unreadable archive is an error. Unsafe or unreadable entries are
/// skipped and listed in the report.
pub fn extract_zip_to_dir(bytes: &[u8], dest: &Path) -> Result<ExtractReport> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| HubError::Archive(err.to_string()))?;
    std::fs::create_dir_all(dest)?;

    let mut report = ExtractReport::default();
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable archive entry");
                report.skipped.push(format!("#{index}"));
                continue;
            }
        };
        let name = entry.name().to_string();
        let Some(rel) = safe_entry_path(&name) else {
            warn!(entry = %name, "skipping archive entry outside destination");
            report.skipped.push(name);
            continue;
        };
        let target = dest.join(&rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }

        let mut contents = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        if let Err(err) = entry.read_to_end(&mut contents) {
            warn!(entry = %name, error = %err, "skipping corrupt archive entry");
            report.skipped.push(name);
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, contents)?;
        debug!(entry = %name, "extracted");
        report.written.push(rel.to_string_lossy().replace('\\', "/"));
    }

    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, bytes) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_zip_and_skips_traversal() {
        let root = tempdir().unwrap();
        let dest = root.path().join("skill");
        let zip = build_zip(&[("SKILL.md", b"hello"), ("../evil.txt", b"nope")]);

        let report = extract_zip_to_dir(&zip, &dest).unwrap();

        let content = std::fs::read_to_string(dest.join("SKILL.md")).unwrap();
        assert_eq!(content.trim(), "hello");
        assert!(!dest.join("..").join("evil.txt").exists());
        assert!(!root.path().join("evil.txt").exists());
        assert_eq!(report.written, vec!["SKILL.md".to_string()]);
        assert_eq!(report.skipped, vec!["../evil.txt".to_string()]);
    }

    #[test]
    fn creates_nested_dirs_and_overwrites() {
        let dest = tempdir().unwrap();
        std::fs::create_dir_all(dest.path().join("refs")).unwrap();
        std::fs::write(dest.path().join("refs/a.md"), "old").unwrap();

        let zip = build_zip(&[("refs/a.md", b"new"), ("refs/deep/b.md", b"b")]);
        extract_zip_to_dir(&zip, dest.path()).unwrap();

        assert_eq!(std::fs::read_to_string(dest.path().join("refs/a.md")).unwrap(), "new");
        assert!(dest.path().join("refs/deep/b.md").exists());
    }

    #[test]
    fn rejects_garbage_payload() {
        let dest = tempdir().unwrap();
        let err = extract_zip_to_dir(b"not a zip", dest.path()).unwrap_err();
        assert!(matches!(err, HubError::Archive(_)));
    }

    #[test]
    fn safe_entry_path_cases() {
        assert_eq!(safe_entry_path("SKILL.md"), Some(PathBuf::from("SKILL.md")));
        assert_eq!(safe_entry_path("./a/./b.md"), Some(PathBuf::from("a/b.md")));
        assert_eq!(safe_entry_path("a/../b.md"), Some(PathBuf::from("b.md")));
        assert_eq!(safe_entry_path("../evil.txt"), None);
        assert_eq!(safe_entry_path("a/../../evil.txt"), None);
        assert_eq!(safe_entry_path("/etc/passwd"), None);
        assert_eq!(safe_entry_path("..\\evil.txt"), None);
        assert_eq!(safe_entry_path("C:/evil.txt"), None);
        assert_eq!(safe_entry_path(""), None);
        assert_eq!(safe_entry_path("."), None);
    }
}
