//! Ignore-aware file collection for a skill folder.
//!
//! Walks a folder and returns every regular file that survives the exclusion
//! rules: dot entries, a fixed set of dependency/build directories, and the
//! patterns from `.gitignore` and `.clawdhubignore` at the folder root.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{HubError, Result};

/// Tool-specific ignore file, same syntax as `.gitignore`.
pub const CLAWDHUB_IGNORE_FILE: &str = ".clawdhubignore";
pub const GIT_IGNORE_FILE: &str = ".gitignore";

/// Directories that never belong in a published skill.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "coverage",
    "target",
    "__pycache__",
];

pub const OCTET_STREAM: &str = "application/octet-stream";

/// A file read from disk, addressed relative to the skill root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// POSIX-style path relative to the skill root
    pub rel_path: String,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Infer a content type from the file extension.
#[must_use]
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => "application/json",
        "md" | "markdown" | "mdx" => "text/markdown",
        "txt" | "text" | "log" => "text/plain",
        "yaml" | "yml" => "text/yaml",
        "toml" => "text/toml",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "xml" | "svg" => "text/xml",
        "js" | "mjs" | "cjs" => "text/javascript",
        "ts" | "tsx" | "jsx" | "py" | "rb" | "rs" | "go" | "java" | "kt" | "swift" | "c"
        | "h" | "cpp" | "hpp" | "sh" | "bash" | "zsh" | "fish" | "ps1" | "sql" | "lua"
        | "ini" | "cfg" | "conf" | "env" => "text/plain",
        _ => OCTET_STREAM,
    }
}

/// Build a gitignore matcher from `.gitignore` then `.clawdhubignore` at
/// `root`. Missing files contribute nothing; unreadable files or bad lines
/// are logged and skipped.
#[must_use]
pub fn load_ignore(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    for name in [GIT_IGNORE_FILE, CLAWDHUB_IGNORE_FILE] {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        if let Some(err) = builder.add(&path) {
            debug!(file = name, error = %err, "ignore file partially loaded");
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!(root = %root.display(), error = %err, "ignore rules unusable");
        Gitignore::empty()
    })
}

fn rel_posix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn keep_entry(root: &Path, entry: &DirEntry, rules: &Gitignore) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }
    let is_dir = entry.file_type().is_dir();
    if is_dir && IGNORED_DIRS.contains(&name.as_ref()) {
        return false;
    }
    match rel_posix(root, entry.path()) {
        Some(rel) => !rules.matched(rel, is_dir).is_ignore(),
        None => false,
    }
}

/// Collect every publishable file under `root`, sorted by relative path.
///
/// Fails with [`HubError::NotFound`] when `root` is not a directory. Files
/// that cannot be read are skipped with a warning.
pub fn collect_files(root: &Path) -> Result<Vec<CollectedFile>> {
    if !root.is_dir() {
        return Err(HubError::NotFound(root.display().to_string()));
    }
    let rules = load_ignore(root);

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(root, entry, &rules));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel_path) = rel_posix(root, entry.path()) else {
            continue;
        };
        match std::fs::read(entry.path()) {
            Ok(bytes) => {
                let content_type = content_type_for(&rel_path);
                files.push(CollectedFile {
                    rel_path,
                    bytes,
                    content_type,
                });
            }
            Err(err) => warn!(path = %entry.path().display(), error = %err, "skipping unreadable file"),
        }
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    debug!(root = %root.display(), files = files.len(), "collected skill files");
    Ok(files)
}
