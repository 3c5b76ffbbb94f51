//! Filesystem utilities.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{HubError, Result};

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
///
/// Does not touch the filesystem, so symlinks are not resolved.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `base` (when relative) and normalize it.
#[must_use]
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Write `contents` through a sibling temp file and rename it into place.
///
/// A crash leaves either the old file or the new one, never a torn write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = std::fs::File::create(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&temp_path, path).map_err(|err| {
        let _ = std::fs::remove_file(&temp_path);
        HubError::Io(err)
    })
}

/// Remove a directory tree if present.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn normalize_folds_parent_and_current() {
        assert_eq!(
            normalize_path(Path::new("/work/./skills/../other")),
            PathBuf::from("/work/other")
        );
        assert_eq!(normalize_path(Path::new("a/b/..")), PathBuf::from("a"));
    }

    #[test]
    fn resolve_against_keeps_absolute() {
        let base = Path::new("/work");
        assert_eq!(
            resolve_against(base, Path::new("/abs/x")),
            PathBuf::from("/abs/x")
        );
        assert_eq!(
            resolve_against(base, Path::new("skills")),
            PathBuf::from("/work/skills")
        );
    }

    #[test]
    fn write_atomic_replaces_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/state.json");

        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        assert!(!temp.path().join("nested/state.json.tmp").exists());
    }

    #[test]
    fn remove_dir_if_exists_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("gone");
        std::fs::create_dir_all(dir.join("inner")).unwrap();

        remove_dir_if_exists(&dir).unwrap();
        assert!(!dir.exists());
        remove_dir_if_exists(&dir).unwrap();
    }
}
