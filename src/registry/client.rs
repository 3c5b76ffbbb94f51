//! Blocking HTTP client for the ClawdHub registry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    PublishRequest, PublishResponse, ResolveResult, SkillMeta, SkillPublisher, SkillRegistry,
    WhoamiResponse, routes,
};
use crate::error::{HubError, Result};

/// Error body returned by the registry, either `{error}` or `{message}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    storage_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishFileBody<'a> {
    path: &'a str,
    size: u64,
    sha256: &'a str,
    content_type: &'a str,
    storage_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishBody<'a> {
    slug: &'a str,
    display_name: &'a str,
    version: &'a str,
    changelog: &'a str,
    tags: &'a [String],
    files: Vec<PublishFileBody<'a>>,
}

fn is_skill_not_found(message: &str) -> bool {
    message.to_ascii_lowercase().contains("skill not found")
}

/// What counts as "the skill does not exist" for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotFound {
    /// A 404 status or a "skill not found" message
    StatusOrMessage,
    /// Only a "skill not found" message; a bare 404 stays a registry error
    MessageOnly,
}

/// Map a non-success response onto the error taxonomy.
///
/// A body whose message says "skill not found" becomes
/// [`HubError::SkillNotFound`] for `subject`, as does a 404 under
/// [`NotFound::StatusOrMessage`].
fn error_for_status(status: u16, body: &str, subject: &str, not_found: NotFound) -> HubError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.message))
        .unwrap_or_else(|| body.trim().to_string());
    let missing = match not_found {
        NotFound::StatusOrMessage => status == 404 || is_skill_not_found(&message),
        NotFound::MessageOnly => is_skill_not_found(&message),
    };
    if missing {
        return HubError::SkillNotFound(subject.to_string());
    }
    let message = if message.is_empty() {
        format!("HTTP {status}")
    } else {
        message
    };
    HubError::Registry { status, message }
}

pub struct HttpRegistry {
    base_url: String,
    token: Option<String>,
    http_client: reqwest::blocking::Client,
}

impl HttpRegistry {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(format!("clawdhub/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HubError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.map(ToString::to_string),
            http_client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Send an authenticated registry request.
    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
        subject: &str,
        not_found: NotFound,
    ) -> Result<reqwest::blocking::Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        Self::execute(request, subject, not_found)
    }

    /// Send without credentials, for hosts the registry points us at.
    fn execute(
        request: reqwest::blocking::RequestBuilder,
        subject: &str,
        not_found: NotFound,
    ) -> Result<reqwest::blocking::Response> {
        let request_id = format!(
            "clawdhub-{}",
            Uuid::new_v4().to_string().split('-').next().unwrap_or("0")
        );
        let request = request.header("X-Request-ID", &request_id);

        let response = request.send()?;
        let status = response.status();
        debug!(request_id = %request_id, status = status.as_u16(), "registry response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(error_for_status(status.as_u16(), &body, subject, not_found))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        subject: &str,
        not_found: NotFound,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.send(self.http_client.get(&url), subject, not_found)?;
        Ok(response.json()?)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        subject: &str,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self.send(
            self.http_client.post(&url).json(body),
            subject,
            NotFound::MessageOnly,
        )?;
        Ok(response.json()?)
    }

    fn upload(&self, slug: &str, content_type: &str, bytes: &[u8]) -> Result<String> {
        let target: UploadUrlResponse =
            self.post_json(routes::CLI_UPLOAD_URL, &serde_json::json!({}), slug)?;
        let request = self
            .http_client
            .post(self.url(&target.upload_url))
            .header("Content-Type", content_type)
            .body(bytes.to_vec());
        let uploaded: UploadResponse =
            Self::execute(request, slug, NotFound::MessageOnly)?.json()?;
        Ok(uploaded.storage_id)
    }
}

impl SkillRegistry for HttpRegistry {
    fn whoami(&self) -> Result<WhoamiResponse> {
        if self.token.is_none() {
            return Err(HubError::NotLoggedIn);
        }
        self.get_json(routes::CLI_WHOAMI, "whoami", NotFound::MessageOnly)
    }

    fn skill_meta(&self, slug: &str) -> Result<SkillMeta> {
        let path = format!("{}?slug={}", routes::SKILL, urlencoding::encode(slug));
        self.get_json(&path, slug, NotFound::StatusOrMessage)
    }

    fn resolve(&self, slug: &str, fingerprint: &str) -> Result<ResolveResult> {
        let path = format!(
            "{}?slug={}&hash={}",
            routes::SKILL_RESOLVE,
            urlencoding::encode(slug),
            urlencoding::encode(fingerprint)
        );
        self.get_json(&path, slug, NotFound::MessageOnly)
    }

    fn download(&self, slug: &str, version: Option<&str>) -> Result<Vec<u8>> {
        let mut path = format!("{}?slug={}", routes::DOWNLOAD, urlencoding::encode(slug));
        if let Some(version) = version {
            path.push_str("&version=");
            path.push_str(&urlencoding::encode(version));
        }
        let url = self.url(&path);
        debug!(url = %url, "GET");
        let response = self.send(self.http_client.get(&url), slug, NotFound::StatusOrMessage)?;
        Ok(response.bytes()?.to_vec())
    }
}

impl SkillPublisher for HttpRegistry {
    fn publish(&self, request: &PublishRequest) -> Result<PublishResponse> {
        if self.token.is_none() {
            return Err(HubError::NotLoggedIn);
        }
        let mut files = Vec::with_capacity(request.files.len());
        for file in &request.files {
            let storage_id = self.upload(&request.slug, &file.meta.content_type, &file.bytes)?;
            debug!(slug = %request.slug, path = %file.meta.path, "uploaded");
            files.push(PublishFileBody {
                path: &file.meta.path,
                size: file.meta.size,
                sha256: &file.meta.sha256,
                content_type: &file.meta.content_type,
                storage_id,
            });
        }

        let body = PublishBody {
            slug: &request.slug,
            display_name: &request.display_name,
            version: &request.version,
            changelog: &request.changelog,
            tags: &request.tags,
            files,
        };
        let response: PublishResponse = self.post_json(routes::CLI_PUBLISH, &body, &request.slug)?;
        info!(slug = %request.slug, version = %request.version, "published");
        Ok(response)
    }
}
