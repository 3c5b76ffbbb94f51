//! clawdhub publish - Upload one skill folder as a new version

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::Settings;
use crate::error::{HubError, Result};
use crate::registry::{PublishRequest, SkillPublisher, parse_tags};
use crate::skills::scan::{SKILL_MARKERS, is_valid_slug, sanitize_slug, title_case};
use crate::skills::version::parse_version;
use crate::sync::PublishedSkill;
use crate::utils::fs::resolve_against;

#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct PublishArgs {
    /// Skill folder (relative to the workdir)
    pub path: PathBuf,

    /// Semver version to publish
    #[arg(long)]
    pub version: String,

    /// Slug (default: derived from the folder name)
    #[arg(long)]
    pub slug: Option<String>,

    /// Display name (default: title-cased slug)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value = "")]
    pub changelog: String,

    /// Comma-separated tags
    #[arg(long, default_value = "latest")]
    pub tags: String,
}

pub fn run(ctx: &AppContext, args: &PublishArgs) -> Result<()> {
    let request = prepare(&ctx.settings, args)?;
    let registry = ctx.authed_registry()?;

    let spinner = ctx
        .progress()
        .spinner(&format!("Publishing {}@{}", request.slug, request.version));
    let published = match publish(&registry, &request) {
        Ok(published) => published,
        Err(err) => {
            spinner.abandon_with_message(&err.to_string());
            return Err(err);
        }
    };
    spinner.finish();

    if ctx.robot_mode() {
        return emit_json(&robot_ok(&published));
    }
    let mut layout = HumanLayout::new();
    layout
        .push_line(format!("OK. Published {}@{}", published.slug, published.version))
        .kv("Files", &request.files.len().to_string());
    emit_human(layout);
    Ok(())
}

/// Validate arguments and build the request for the folder at `args.path`.
pub fn prepare(settings: &Settings, args: &PublishArgs) -> Result<PublishRequest> {
    let folder = resolve_against(&settings.workdir, &args.path);
    if !folder.is_dir() {
        return Err(HubError::NotFound(folder.display().to_string()));
    }
    if !SKILL_MARKERS.iter().any(|marker| folder.join(marker).is_file()) {
        return Err(HubError::ValidationFailed(format!(
            "SKILL.md required in {}",
            folder.display()
        )));
    }

    let slug = match args.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug.to_string(),
        None => folder
            .file_name()
            .map(|name| sanitize_slug(&name.to_string_lossy()))
            .unwrap_or_default(),
    };
    if !is_valid_slug(&slug) {
        return Err(HubError::InvalidSlug(slug));
    }
    let display_name = args
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| title_case(&slug), ToString::to_string);
    let version = parse_version(&args.version)?;

    PublishRequest::from_folder(
        &folder,
        &slug,
        &display_name,
        &version.to_string(),
        args.changelog.trim(),
        parse_tags(&args.tags),
    )
}

pub fn publish<P: SkillPublisher + ?Sized>(
    publisher: &P,
    request: &PublishRequest,
) -> Result<PublishedSkill> {
    let response = publisher.publish(request)?;
    debug!(slug = %request.slug, version_id = ?response.version_id, "publish acknowledged");
    Ok(PublishedSkill {
        slug: request.slug.clone(),
        version: request.version.clone(),
    })
}
