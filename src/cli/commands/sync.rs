//! clawdhub sync - Publish new and changed local skills
//!
//! Scans the workdir, the skills dir, and any `--root`, asks the registry
//! which folders are already published, then publishes the rest with bumped
//! versions and records them in the lockfile.

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok, robot_partial};
use crate::cli::prompt::{Prompter, SpinnerPause, TermPrompter};
use crate::error::Result;
use crate::registry::{SkillRegistry, parse_tags};
use crate::skills::version::BumpClass;
use crate::sync::engine::selection_label;
use crate::sync::{SyncEngine, SyncOptions, SyncReport};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Additional directory to scan (repeatable)
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Upload everything without prompting
    #[arg(long)]
    pub all: bool,

    /// Show what would be uploaded
    #[arg(long)]
    pub dry_run: bool,

    /// Version bump for updates
    #[arg(long, value_enum, default_value_t = BumpClass::Patch)]
    pub bump: BumpClass,

    /// Changelog for updates (non-interactive default: "Sync update")
    #[arg(long)]
    pub changelog: Option<String>,

    /// Comma-separated tags
    #[arg(long, default_value = "latest")]
    pub tags: String,
}

impl SyncArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            roots: self.roots.clone(),
            all: self.all,
            dry_run: self.dry_run,
            bump: self.bump,
            changelog: self.changelog.clone(),
            tags: parse_tags(&self.tags),
        }
    }
}

pub fn run(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    let registry = ctx.authed_registry()?;
    let progress = ctx.progress();
    let spinner = progress.spinner("Checking token");
    let whoami = match registry.whoami() {
        Ok(whoami) => whoami,
        Err(err) => {
            spinner.abandon_with_message("Token rejected");
            return Err(err);
        }
    };
    debug!(handle = ?whoami.user.handle, "authenticated");

    let options = args.options();
    let status = |message: &str| spinner.set_message(message.to_string());
    let mut term = ctx.input_allowed.then(TermPrompter::new);
    let mut paused = term
        .as_mut()
        .map(|p| SpinnerPause::new(p as &mut dyn Prompter, &spinner));

    let mut engine = SyncEngine::new(&registry, &ctx.settings.workdir, &ctx.settings.dir)
        .with_home(dirs::home_dir())
        .with_status(&status);
    if let Some(prompter) = paused.as_mut() {
        engine = engine.with_prompter(prompter);
    }
    let report = match engine.run(&options) {
        Ok(report) => report,
        Err(err) => {
            if err.is_cancelled() {
                spinner.finish();
            } else {
                spinner.abandon_with_message(&err.to_string());
            }
            return Err(err);
        }
    };
    spinner.finish();

    if ctx.robot_mode() {
        if report.failed.is_empty() {
            emit_json(&robot_ok(&report))?;
        } else {
            emit_json(&robot_partial(
                &report,
                report.published.len(),
                report.failed.len(),
            ))?;
        }
    } else {
        emit_human(render_report(&report, options.bump));
    }
    report.into_result().map(|_| ())
}

fn render_report(report: &SyncReport, bump: BumpClass) -> HumanLayout {
    let mut layout = HumanLayout::new();
    if let Some(fallback) = &report.fallback_roots {
        layout.push_line("No skills in the selected roots; using fallback locations:");
        for root in fallback {
            layout.bullet(&root.display().to_string());
        }
        layout.blank();
    }
    if !report.synced.is_empty() {
        layout.section("Already synced");
        for candidate in &report.synced {
            let version = candidate.match_version.as_deref().unwrap_or("?");
            layout.bullet(&format!("{}  {version}", candidate.slug()));
        }
        layout.blank();
    }
    if report.dry_run && !report.selected.is_empty() {
        layout.section("Would upload");
        for candidate in report
            .actionable
            .iter()
            .filter(|c| report.selected.iter().any(|slug| slug == c.slug()))
        {
            layout.bullet(&selection_label(candidate, bump));
        }
        layout.blank();
    }
    for published in &report.published {
        layout.bullet(&format!("OK. {}@{}", published.slug, published.version));
    }
    for failure in &report.failed {
        layout.bullet(&format!("FAILED {}: {}", failure.slug, failure.error));
    }
    layout.push_line(report.summary_line());
    layout
}
