//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Skill errors
//! - 3xx: Config errors
//! - 5xx: Network errors
//! - 6xx: Storage errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for `--json` output.
///
/// Each variant maps to a numeric code (e.g., `SkillNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Skill errors (1xx)
    // ========================================
    /// E101: Registry has no skill with this slug
    SkillNotFound,
    /// E102: Folder name cannot be turned into a slug
    SkillInvalidSlug,
    /// E103: Skill folder already exists locally
    SkillAlreadyInstalled,
    /// E104: Local files match no published version
    SkillLocalChanges,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: No token stored
    ConfigNotLoggedIn,

    // ========================================
    // Network errors (5xx)
    // ========================================
    /// E501: Registry could not be reached
    NetworkUnreachable,
    /// E502: Registry answered with a non-success status
    RegistryError,
    /// E503: Registry rejected the token
    NetworkAuthFailed,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Archive payload could not be read
    ArchiveInvalid,
    /// E605: Serialization/deserialization failed
    SerializationError,
    /// E606: IO operation failed
    IoError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Input failed validation
    ValidationFailed,
    /// E802: Version string is not valid semver
    InvalidVersion,
    /// E803: Update published without a changelog
    MissingChangelog,
    /// E804: Some skills in a batch failed
    PartialFailure,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: User canceled an interactive prompt
    Cancelled,
    /// E905: Generic not found (missing folder or file)
    NotFound,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `SkillNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::SkillNotFound => 101,
            Self::SkillInvalidSlug => 102,
            Self::SkillAlreadyInstalled => 103,
            Self::SkillLocalChanges => 104,

            Self::ConfigInvalid => 302,
            Self::ConfigNotLoggedIn => 304,

            Self::NetworkUnreachable => 501,
            Self::RegistryError => 502,
            Self::NetworkAuthFailed => 503,

            Self::ArchiveInvalid => 601,
            Self::SerializationError => 605,
            Self::IoError => 606,

            Self::ValidationFailed => 801,
            Self::InvalidVersion => 802,
            Self::MissingChangelog => 803,
            Self::PartialFailure => 804,

            Self::Cancelled => 901,
            Self::NotFound => 905,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::SkillNotFound => "Check the slug for typos. The skill may not be published yet",
            Self::SkillInvalidSlug => "Rename the folder or pass --slug with lowercase letters, digits and dashes",
            Self::SkillAlreadyInstalled => "Pass --force to overwrite the existing folder",
            Self::SkillLocalChanges => "Local files were edited. Pass --force to overwrite them with the registry version",

            Self::ConfigInvalid => "Fix or delete the config file. It must be a JSON object",
            Self::ConfigNotLoggedIn => "Run `clawdhub login --token <token>`",

            Self::NetworkUnreachable => "Check your network connection and the --registry URL",
            Self::RegistryError => "The registry rejected the request. Retry later or check the message",
            Self::NetworkAuthFailed => "Your token may be expired. Run `clawdhub login` again",

            Self::ArchiveInvalid => "The downloaded archive is corrupt. Retry the download",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",

            Self::ValidationFailed => "Review the reported problem and adjust the arguments",
            Self::InvalidVersion => "Use a semantic version such as 1.2.3",
            Self::MissingChangelog => "Pass --changelog <text> or enter a changelog at the prompt",
            Self::PartialFailure => "Review the per-skill failures above and rerun sync for those skills",

            Self::Cancelled => "Nothing was changed",
            Self::NotFound => "The requested path was not found. Check --workdir and --dir",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SerializationError)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "skill",
            3 => "config",
            5 => "network",
            6 => "storage",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
