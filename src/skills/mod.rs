//! Local skill packages: discovery, collection, hashing, extraction, and
//! the lockfile.

pub mod archive;
pub mod collect;
pub mod hash;
pub mod lockfile;
pub mod scan;
pub mod version;

pub use archive::{ExtractReport, extract_zip_to_dir};
pub use collect::{CollectedFile, collect_files};
pub use hash::{FileDigest, HashedSkill, build_fingerprint, hash_skill_files, sha256_hex};
pub use lockfile::{Lockfile, LockfileEntry};
pub use scan::{SkillFolder, find_skill_folders, sanitize_slug};
pub use version::BumpClass;
