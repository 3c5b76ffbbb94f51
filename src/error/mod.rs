//! Error handling for clawdhub.
//!
//! This module provides:
//! - [`HubError`]: The main error enum for all operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for clawdhub operations.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Registry error ({status}): {message}")]
    Registry { status: u16, message: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid archive: {0}")]
    Archive(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not logged in. Run: clawdhub login")]
    NotLoggedIn,

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Local changes in {0} do not match any published version")]
    LocalChanges(String),

    #[error("--changelog required for updates ({0})")]
    MissingChangelog(String),

    #[error("Canceled")]
    Cancelled,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("{failed} of {total} skill(s) failed")]
    PartialFailure { failed: usize, total: usize },
}

impl HubError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Self::InvalidSlug(_) => ErrorCode::SkillInvalidSlug,
            Self::Http(_) => ErrorCode::NetworkUnreachable,
            Self::Registry { status: 401 | 403, .. } => ErrorCode::NetworkAuthFailed,
            Self::Registry { .. } => ErrorCode::RegistryError,
            Self::InvalidVersion(_) => ErrorCode::InvalidVersion,
            Self::Archive(_) => ErrorCode::ArchiveInvalid,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::NotLoggedIn => ErrorCode::ConfigNotLoggedIn,
            Self::AlreadyExists(_) => ErrorCode::SkillAlreadyInstalled,
            Self::LocalChanges(_) => ErrorCode::SkillLocalChanges,
            Self::MissingChangelog(_) => ErrorCode::MissingChangelog,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::PartialFailure { .. } => ErrorCode::PartialFailure,
        }
    }

    /// True when the user aborted at a prompt.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::SkillNotFound(slug) => Some(serde_json::json!({ "slug": slug })),
            Self::Registry { status, .. } => Some(serde_json::json!({ "status": status })),
            Self::LocalChanges(slug) | Self::MissingChangelog(slug) => {
                Some(serde_json::json!({ "slug": slug }))
            }
            Self::PartialFailure { failed, total } => {
                Some(serde_json::json!({ "failed": failed, "total": total }))
            }
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_hub_error(self)
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SKILL_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    pub recoverable: bool,

    /// Error category (e.g., "skill", "config", "network")
    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_hub_error(err: &HubError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&HubError> for StructuredError {
    fn from(err: &HubError) -> Self {
        Self::from_hub_error(err)
    }
}

/// Result type alias using `HubError`.
pub type Result<T> = std::result::Result<T, HubError>;
