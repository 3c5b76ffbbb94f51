//! Discovery of skill folders under scan roots.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::utils::fs::{normalize_path, resolve_against};

/// Marker files that make a directory a skill folder.
pub const SKILL_MARKERS: &[&str] = &["SKILL.md", "skill.md"];

/// A local skill folder found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillFolder {
    pub slug: String,
    /// Absolute path; identity of the folder within a scan
    pub folder: PathBuf,
    pub display_name: String,
}

/// Derive a URL-safe slug from a folder name.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, and trims dashes at both ends.
#[must_use]
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Whether `slug` is already in canonical form.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && sanitize_slug(slug) == slug
}

/// Title-case the words of a slug ("pdf-tools" -> "Pdf Tools").
#[must_use]
pub fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_marker(dir: &Path) -> bool {
    SKILL_MARKERS.iter().any(|marker| dir.join(marker).is_file())
}

fn folder_from_dir(dir: &Path) -> Option<SkillFolder> {
    let name = dir.file_name()?.to_string_lossy();
    let slug = sanitize_slug(&name);
    if slug.is_empty() {
        debug!(folder = %dir.display(), "skipping folder without usable slug");
        return None;
    }
    Some(SkillFolder {
        display_name: title_case(&slug),
        slug,
        folder: normalize_path(dir),
    })
}

/// Find skill folders under `root`.
///
/// The root itself counts when it carries a marker; otherwise each
/// immediate non-dot subdirectory with a marker does, in file-name order.
/// A missing or unreadable root yields nothing.
#[must_use]
pub fn find_skill_folders(root: &Path) -> Vec<SkillFolder> {
    if !root.is_dir() {
        return Vec::new();
    }
    if has_marker(root) {
        return folder_from_dir(root).into_iter().collect();
    }

    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|ty| ty.is_dir()))
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();

    dirs.iter()
        .filter(|dir| has_marker(dir))
        .filter_map(|dir| folder_from_dir(dir))
        .collect()
}

/// Roots for a sync run: `workdir`, `dir`, then `extra` (relative entries
/// resolve against `workdir`), normalized and de-duplicated in order.
#[must_use]
pub fn build_scan_roots(workdir: &Path, dir: &Path, extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    [workdir.to_path_buf(), dir.to_path_buf()]
        .into_iter()
        .chain(extra.iter().cloned())
        .map(|root| resolve_against(workdir, &root))
        .filter(|root| seen.insert(root.clone()))
        .collect()
}

/// Scan every root in order, keeping the first occurrence of each folder.
#[must_use]
pub fn scan_roots(roots: &[PathBuf]) -> Vec<SkillFolder> {
    let mut seen = HashSet::new();
    let mut all = Vec::new();
    for root in roots {
        for folder in find_skill_folders(root) {
            if seen.insert(folder.folder.clone()) {
                all.push(folder);
            }
        }
    }
    all
}

/// Legacy skill locations checked when the workdir has none.
#[must_use]
pub fn fallback_skill_roots(home: Option<&Path>) -> Vec<PathBuf> {
    let Some(home) = home else {
        return Vec::new();
    };
    ["clawd/skills", ".clawd/skills", "clawdis/skills", ".clawdis/skills"]
        .iter()
        .map(|rel| home.join(rel))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sanitize_slug_cases() {
        assert_eq!(sanitize_slug("PDF Tools"), "pdf-tools");
        assert_eq!(sanitize_slug("  --weird__name!! "), "weird-name");
        assert_eq!(sanitize_slug("gog"), "gog");
        assert_eq!(sanitize_slug("v2.0"), "v2-0");
        assert_eq!(sanitize_slug("___"), "");
    }

    #[test]
    fn slug_validity() {
        assert!(is_valid_slug("pdf-tools"));
        assert!(!is_valid_slug("PDF"));
        assert!(!is_valid_slug("-x"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("pdf-tools"), "Pdf Tools");
        assert_eq!(title_case("gog"), "Gog");
    }

    #[test]
    fn root_with_marker_is_single_skill() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("My Skill");
        fs::create_dir_all(root.join("child")).unwrap();
        fs::write(root.join("SKILL.md"), "x").unwrap();
        fs::write(root.join("child/SKILL.md"), "x").unwrap();

        let found = find_skill_folders(&root);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "my-skill");
        assert_eq!(found[0].display_name, "My Skill");
    }

    #[test]
    fn child_folders_in_name_order() {
        let dir = tempdir().unwrap();
        for name in ["zeta", "alpha", ".hidden", "no-marker"] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("zeta/SKILL.md"), "x").unwrap();
        fs::write(dir.path().join("alpha/skill.md"), "x").unwrap();
        fs::write(dir.path().join(".hidden/SKILL.md"), "x").unwrap();

        let slugs: Vec<String> = find_skill_folders(dir.path())
            .into_iter()
            .map(|f| f.slug)
            .collect();
        assert_eq!(slugs, vec!["alpha", "zeta"]);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(find_skill_folders(&dir.path().join("absent")).is_empty());
    }

    #[test]
    fn scan_roots_dedupes_by_folder() {
        let dir = tempdir().unwrap();
        let skills = dir.path().join("skills");
        fs::create_dir_all(skills.join("demo")).unwrap();
        fs::write(skills.join("demo/SKILL.md"), "x").unwrap();

        let found = scan_roots(&[skills.clone(), skills.join("demo"), skills]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "demo");
    }

    #[test]
    fn scan_roots_are_resolved_and_deduped() {
        let roots = build_scan_roots(
            Path::new("/work"),
            Path::new("/work/skills"),
            &[
                PathBuf::from("skills"),
                PathBuf::from("./extra/../more"),
                PathBuf::from("/work"),
            ],
        );
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/work"),
                PathBuf::from("/work/skills"),
                PathBuf::from("/work/more"),
            ]
        );
    }

    #[test]
    fn fallback_roots_under_home() {
        let roots = fallback_skill_roots(Some(Path::new("/home/u")));
        assert_eq!(roots[0], PathBuf::from("/home/u/clawd/skills"));
        assert_eq!(roots.len(), 4);
        assert!(fallback_skill_roots(None).is_empty());
    }
}
