//! clawdhub install - Download a published skill into the skills directory

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::Settings;
use crate::error::{HubError, Result};
use crate::registry::SkillRegistry;
use crate::skills::archive::extract_zip_to_dir;
use crate::skills::lockfile::{Lockfile, LockfileEntry};
use crate::skills::scan::is_valid_slug;
use crate::sync::reconcile::latest_published;
use crate::utils::fs::remove_dir_if_exists;

#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct InstallArgs {
    /// Skill slug
    pub slug: String,

    /// Version to install (default: latest)
    #[arg(long)]
    pub version: Option<String>,

    /// Overwrite an existing folder
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallOutcome {
    pub slug: String,
    pub version: String,
    pub path: PathBuf,
    pub files: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &InstallArgs) -> Result<()> {
    let registry = ctx.registry()?;
    let mut lockfile = Lockfile::read(&ctx.settings.workdir);

    let spinner = ctx.progress().spinner(&format!("Installing {}", args.slug.trim()));
    let outcome = match install_skill(
        &registry,
        &ctx.settings,
        &mut lockfile,
        &args.slug,
        args.version.as_deref(),
        args.force,
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            spinner.abandon_with_message(&err.to_string());
            return Err(err);
        }
    };
    lockfile.write(&ctx.settings.workdir)?;
    spinner.finish();

    if ctx.robot_mode() {
        return emit_json(&robot_ok(&outcome));
    }
    let mut layout = HumanLayout::new();
    layout
        .push_line(format!("OK. Installed {}@{}", outcome.slug, outcome.version))
        .kv("Path", &outcome.path.display().to_string())
        .kv("Files", &outcome.files.to_string());
    for name in &outcome.skipped {
        layout.bullet(&format!("skipped unsafe entry {name}"));
    }
    emit_human(layout);
    Ok(())
}

/// Download and extract `slug` into `<dir>/<slug>`, recording it in `lockfile`.
///
/// The lockfile is only updated in memory; callers persist it.
pub fn install_skill<R: SkillRegistry + ?Sized>(
    registry: &R,
    settings: &Settings,
    lockfile: &mut Lockfile,
    slug: &str,
    version: Option<&str>,
    force: bool,
) -> Result<InstallOutcome> {
    let slug = slug.trim();
    if !is_valid_slug(slug) {
        return Err(HubError::InvalidSlug(slug.to_string()));
    }
    let target = settings.dir.join(slug);
    if target.exists() && !force {
        return Err(HubError::AlreadyExists(format!(
            "{} (use --force to overwrite)",
            target.display()
        )));
    }

    let version = match version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(version) => version.to_string(),
        None => latest_published(registry, slug)?
            .ok_or_else(|| HubError::SkillNotFound(slug.to_string()))?,
    };

    let bytes = registry.download(slug, Some(&version))?;
    if force {
        remove_dir_if_exists(&target)?;
    }
    let report = extract_zip_to_dir(&bytes, &target)?;
    lockfile.record(slug, LockfileEntry::now(version.clone()));
    info!(slug, version = %version, files = report.written.len(), "installed");

    Ok(InstallOutcome {
        slug: slug.to_string(),
        version,
        path: target,
        files: report.written.len(),
        skipped: report.skipped,
    })
}
