//! clawdhub update - Bring installed skills up to date
//!
//! The local folder is fingerprinted and resolved against the registry. A
//! folder matching no published version holds local edits and is only
//! replaced with `--force` or after confirmation.

use std::path::Path;

use clap::Args;
use serde::Serialize;
use tracing::{debug, info};

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::cli::prompt::{Prompter, SpinnerPause, TermPrompter};
use crate::config::Settings;
use crate::error::{HubError, Result};
use crate::registry::SkillRegistry;
use crate::skills::archive::extract_zip_to_dir;
use crate::skills::collect::collect_files;
use crate::skills::hash::hash_skill_files;
use crate::skills::lockfile::{Lockfile, LockfileEntry};
use crate::skills::scan::is_valid_slug;
use crate::sync::reconcile::latest_published;
use crate::utils::fs::remove_dir_if_exists;

#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct UpdateArgs {
    /// Skill slug
    #[arg(conflicts_with = "all")]
    pub slug: Option<String>,

    /// Update every skill in the lockfile
    #[arg(long)]
    pub all: bool,

    /// Target version (single slug only)
    #[arg(long, requires = "slug")]
    pub version: Option<String>,

    /// Overwrite local changes
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum UpdateOutcome {
    UpToDate {
        slug: String,
        version: String,
    },
    Updated {
        slug: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        to: String,
    },
}

impl UpdateOutcome {
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    fn describe(&self) -> String {
        match self {
            Self::UpToDate { slug, version } => format!("{slug}: up to date ({version})"),
            Self::Updated { slug, from, to } => match from {
                Some(from) => format!("{slug}: {from} -> {to}"),
                None => format!("{slug}: -> {to}"),
            },
        }
    }
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    let mut lockfile = Lockfile::read(&ctx.settings.workdir);
    let targets: Vec<String> = if args.all {
        lockfile.skills.keys().cloned().collect()
    } else {
        match args.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => vec![slug.to_string()],
            _ => {
                return Err(HubError::ValidationFailed(
                    "provide <slug> or --all".to_string(),
                ));
            }
        }
    };
    if targets.is_empty() {
        if ctx.robot_mode() {
            return emit_json(&robot_ok(Vec::<UpdateOutcome>::new()));
        }
        println!("No installed skills.");
        return Ok(());
    }

    let registry = ctx.registry()?;
    let progress = ctx.progress();
    let mut prompter = ctx.input_allowed.then(TermPrompter::new);
    let mut outcomes = Vec::new();
    let mut failure = None;

    for slug in &targets {
        let spinner = progress.spinner(&format!("Checking {slug}"));
        let mut paused = prompter
            .as_mut()
            .map(|p| SpinnerPause::new(p as &mut dyn Prompter, &spinner));
        match update_skill(
            &registry,
            &ctx.settings,
            &mut lockfile,
            slug,
            args.version.as_deref(),
            args.force,
            paused.as_mut().map(|p| p as &mut dyn Prompter),
        ) {
            Ok(outcome) => {
                spinner.finish();
                outcomes.push(outcome);
            }
            Err(err) => {
                spinner.abandon_with_message(&format!("{slug}: {err}"));
                failure = Some(err);
                break;
            }
        }
    }

    save_lockfile(&lockfile, &ctx.settings.workdir, &outcomes, failure.as_ref())?;
    if let Some(err) = failure {
        return Err(err);
    }

    if ctx.robot_mode() {
        return emit_json(&robot_ok(&outcomes));
    }
    let mut layout = HumanLayout::new();
    for outcome in &outcomes {
        layout.bullet(&outcome.describe());
    }
    emit_human(layout);
    Ok(())
}

/// Write the lockfile once if anything changed. A cancelled run writes
/// nothing, even when earlier skills were already replaced on disk.
fn save_lockfile(
    lockfile: &Lockfile,
    workdir: &Path,
    outcomes: &[UpdateOutcome],
    failure: Option<&HubError>,
) -> Result<()> {
    if failure.is_some_and(HubError::is_cancelled) {
        debug!("update cancelled; lockfile left as is");
        return Ok(());
    }
    if outcomes.iter().any(UpdateOutcome::changed) {
        lockfile.write(workdir)?;
    }
    Ok(())
}

/// Update one installed skill, recording the new version in `lockfile`.
///
/// `prompter` is asked before local edits are overwritten; without one the
/// update fails with [`HubError::LocalChanges`] unless `force` is set.
pub fn update_skill<R: SkillRegistry + ?Sized>(
    registry: &R,
    settings: &Settings,
    lockfile: &mut Lockfile,
    slug: &str,
    version: Option<&str>,
    force: bool,
    prompter: Option<&mut dyn Prompter>,
) -> Result<UpdateOutcome> {
    if !is_valid_slug(slug) {
        return Err(HubError::InvalidSlug(slug.to_string()));
    }
    let target = settings.dir.join(slug);

    let (matched, latest) = if target.is_dir() {
        let fingerprint = hash_skill_files(&collect_files(&target)?).fingerprint;
        let resolved = registry.resolve(slug, &fingerprint)?;
        debug!(slug, fingerprint = %fingerprint, matched = ?resolved.match_version(), "resolved local copy");
        (
            resolved.match_version().map(ToString::to_string),
            resolved.latest().map(ToString::to_string),
        )
    } else {
        (None, latest_published(registry, slug)?)
    };

    let wanted = version
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .or(latest)
        .ok_or_else(|| HubError::SkillNotFound(slug.to_string()))?;

    if matched.as_deref() == Some(wanted.as_str()) {
        return Ok(UpdateOutcome::UpToDate {
            slug: slug.to_string(),
            version: wanted,
        });
    }

    if target.is_dir() && matched.is_none() && !force {
        let Some(prompter) = prompter else {
            return Err(HubError::LocalChanges(format!(
                "{} (use --force to overwrite)",
                target.display()
            )));
        };
        let question = format!("{slug}: local changes (no match). Overwrite?");
        match prompter.confirm(&question, false)? {
            Some(true) => {}
            Some(false) => return Err(HubError::LocalChanges(target.display().to_string())),
            None => return Err(HubError::Cancelled),
        }
    }

    let bytes = registry.download(slug, Some(&wanted))?;
    remove_dir_if_exists(&target)?;
    extract_zip_to_dir(&bytes, &target)?;

    let from = matched.or_else(|| lockfile.get(slug).map(|entry| entry.version.clone()));
    lockfile.record(slug, LockfileEntry::now(wanted.clone()));
    info!(slug, from = ?from, to = %wanted, "updated");

    Ok(UpdateOutcome::Updated {
        slug: slug.to_string(),
        from,
        to: wanted,
    })
}
