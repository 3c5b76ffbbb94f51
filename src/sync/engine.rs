//! The `sync` pipeline: scan, reconcile, select, plan, publish, record.
//!
//! All publish metadata (versions and changelogs) is resolved before the
//! first upload, so aborting at any prompt leaves both the registry and the
//! lockfile untouched. The lockfile is read once and written once.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::prompt::Prompter;
use crate::error::{HubError, Result};
use crate::registry::{PublishRequest, SkillPublisher, SkillRegistry};
use crate::skills::lockfile::{Lockfile, LockfileEntry};
use crate::skills::scan::{SkillFolder, build_scan_roots, fallback_skill_roots, scan_roots};
use crate::skills::version::{BumpClass, bump_version, resolve_changelog, resolve_next_version};
use crate::sync::reconcile::{Candidate, SyncStatus, partition, reconcile_all};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Extra scan roots after workdir and dir
    pub roots: Vec<PathBuf>,
    pub all: bool,
    pub dry_run: bool,
    pub bump: BumpClass,
    pub changelog: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedSkill {
    pub slug: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub slug: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub roots: Vec<PathBuf>,
    /// Set when nothing was found in `roots` and legacy locations were used
    pub fallback_roots: Option<Vec<PathBuf>>,
    pub synced: Vec<Candidate>,
    pub actionable: Vec<Candidate>,
    pub selected: Vec<String>,
    pub dry_run: bool,
    pub published: Vec<PublishedSkill>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    #[must_use]
    pub fn summary_line(&self) -> String {
        if self.actionable.is_empty() {
            return "Everything is already synced.".to_string();
        }
        if self.selected.is_empty() {
            return "Nothing selected.".to_string();
        }
        if self.dry_run {
            return format!("Dry run: would upload {} skill(s).", self.selected.len());
        }
        if self.failed.is_empty() {
            format!("Uploaded {} skill(s).", self.published.len())
        } else {
            format!(
                "Uploaded {} skill(s), {} failed.",
                self.published.len(),
                self.failed.len()
            )
        }
    }

    /// Turn per-skill failures into the run's exit status.
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(HubError::PartialFailure {
                failed: self.failed.len(),
                total: self.selected.len(),
            })
        }
    }
}

struct PlannedPublish {
    candidate: Candidate,
    version: Version,
    changelog: String,
}

/// Label shown for an actionable candidate in the selection prompt.
#[must_use]
pub fn selection_label(candidate: &Candidate, bump: BumpClass) -> String {
    let status = match (candidate.status, candidate.latest_version.as_deref()) {
        (SyncStatus::New, _) => "NEW".to_string(),
        (_, Some(latest)) => match bump_version(latest, bump) {
            Ok(next) => format!("UPDATE {latest} → {next}"),
            Err(_) => "UPDATE".to_string(),
        },
        (_, None) => "UPDATE".to_string(),
    };
    format!("{}  {status}", candidate.slug())
}

pub struct SyncEngine<'a, R: SkillRegistry + SkillPublisher + ?Sized> {
    registry: &'a R,
    workdir: PathBuf,
    dir: PathBuf,
    home: Option<PathBuf>,
    prompter: Option<&'a mut dyn Prompter>,
    status: Option<&'a dyn Fn(&str)>,
}

impl<'a, R: SkillRegistry + SkillPublisher + ?Sized> SyncEngine<'a, R> {
    pub fn new(registry: &'a R, workdir: &Path, dir: &Path) -> Self {
        Self {
            registry,
            workdir: workdir.to_path_buf(),
            dir: dir.to_path_buf(),
            home: None,
            prompter: None,
            status: None,
        }
    }

    /// Home directory used to locate legacy skill roots.
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Enable interactive selection and changelog prompts.
    #[must_use]
    pub fn with_prompter(mut self, prompter: &'a mut dyn Prompter) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Receive short progress messages ("Checking demo").
    #[must_use]
    pub fn with_status(mut self, status: &'a dyn Fn(&str)) -> Self {
        self.status = Some(status);
        self
    }

    fn prompter(&mut self) -> Option<&mut dyn Prompter> {
        match &mut self.prompter {
            Some(prompter) => Some(&mut **prompter),
            None => None,
        }
    }

    fn report_status(&self, message: &str) {
        if let Some(status) = self.status {
            status(message);
        }
    }

    /// Find local skills, falling back to legacy locations when the selected
    /// roots hold none.
    pub fn discover(&self, options: &SyncOptions, report: &mut SyncReport) -> Result<Vec<SkillFolder>> {
        report.roots = build_scan_roots(&self.workdir, &self.dir, &options.roots);
        self.report_status("Scanning for local skills");
        let skills = scan_roots(&report.roots);
        if !skills.is_empty() {
            return Ok(skills);
        }

        let fallback = fallback_skill_roots(self.home.as_deref());
        let skills = scan_roots(&fallback);
        if skills.is_empty() {
            return Err(HubError::NotFound(
                "no skills found (checked workdir and known Clawdis/Clawd locations)".to_string(),
            ));
        }
        info!(count = skills.len(), "found skills in legacy locations");
        report.fallback_roots = Some(fallback);
        Ok(skills)
    }

    fn select(&mut self, actionable: &[Candidate], options: &SyncOptions) -> Result<Vec<usize>> {
        let all: Vec<usize> = (0..actionable.len()).collect();
        if options.all {
            return Ok(all);
        }
        let Some(prompter) = self.prompter() else {
            return Ok(all);
        };
        let labels: Vec<String> = actionable
            .iter()
            .map(|candidate| selection_label(candidate, options.bump))
            .collect();
        let defaults = vec![true; actionable.len()];
        prompter
            .multi_select("Select skills to upload", &labels, &defaults)?
            .ok_or(HubError::Cancelled)
    }

    fn plan(
        &mut self,
        selected: Vec<Candidate>,
        options: &SyncOptions,
        report: &mut SyncReport,
    ) -> Result<Vec<PlannedPublish>> {
        let mut plans = Vec::with_capacity(selected.len());
        for candidate in selected {
            let version = match resolve_next_version(
                candidate.status,
                candidate.latest_version.as_deref(),
                options.bump,
            ) {
                Ok(version) => version,
                Err(err) => {
                    warn!(slug = %candidate.slug(), error = %err, "cannot resolve next version");
                    report.failed.push(SyncFailure {
                        slug: candidate.skill.slug.clone(),
                        error: err.to_string(),
                    });
                    continue;
                }
            };
            let changelog = resolve_changelog(
                candidate.status,
                options.changelog.as_deref(),
                self.prompter(),
                candidate.slug(),
                &version,
            )?;
            plans.push(PlannedPublish {
                candidate,
                version,
                changelog,
            });
        }
        Ok(plans)
    }

    fn publish_one(&self, plan: &PlannedPublish, options: &SyncOptions) -> Result<()> {
        let skill = &plan.candidate.skill;
        let request = PublishRequest::from_folder(
            &skill.folder,
            &skill.slug,
            &skill.display_name,
            &plan.version.to_string(),
            &plan.changelog,
            options.tags.clone(),
        )?;
        self.registry.publish(&request)?;
        Ok(())
    }

    /// Run the whole pipeline.
    ///
    /// Registry failures while reconciling, a cancelled prompt, and a missing
    /// interactive changelog abort the run. Version and publish failures are
    /// recorded per skill in [`SyncReport::failed`].
    pub fn run(&mut self, options: &SyncOptions) -> Result<SyncReport> {
        let mut report = SyncReport {
            dry_run: options.dry_run,
            ..SyncReport::default()
        };
        let skills = self.discover(options, &mut report)?;

        let registry = self.registry;
        let candidates = reconcile_all(registry, skills, |skill| {
            self.report_status(&format!("Checking {}", skill.slug));
        })?;
        let (synced, actionable) = partition(candidates);
        report.synced = synced;
        report.actionable = actionable;
        if report.actionable.is_empty() {
            return Ok(report);
        }

        let picked = self.select(&report.actionable, options)?;
        let selected: Vec<Candidate> = picked
            .into_iter()
            .filter_map(|index| report.actionable.get(index).cloned())
            .collect();
        report.selected = selected.iter().map(|c| c.skill.slug.clone()).collect();
        if selected.is_empty() || options.dry_run {
            return Ok(report);
        }

        let plans = self.plan(selected, options, &mut report)?;

        let mut lockfile = Lockfile::read(&self.workdir);
        for plan in &plans {
            let slug = plan.candidate.slug();
            self.report_status(&format!("Publishing {slug}@{}", plan.version));
            match self.publish_one(plan, options) {
                Ok(()) => {
                    info!(slug, version = %plan.version, "synced");
                    lockfile.record(slug, LockfileEntry::now(plan.version.to_string()));
                    report.published.push(PublishedSkill {
                        slug: slug.to_string(),
                        version: plan.version.to_string(),
                    });
                }
                Err(err) => {
                    warn!(slug, error = %err, "publish failed");
                    report.failed.push(SyncFailure {
                        slug: slug.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
        if !report.published.is_empty() {
            lockfile.write(&self.workdir)?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::prompt::ScriptedPrompter;
    use crate::registry::fake::FakeRegistry;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    struct Workspace {
        _dir: TempDir,
        workdir: PathBuf,
        skills: PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let workdir = dir.path().to_path_buf();
            let skills = workdir.join("skills");
            fs::create_dir_all(&skills).unwrap();
            Self {
                _dir: dir,
                workdir,
                skills,
            }
        }

        fn add_skill(&self, name: &str, body: &str) {
            let folder = self.skills.join(name);
            fs::create_dir_all(&folder).unwrap();
            fs::write(folder.join("SKILL.md"), body).unwrap();
        }

        fn engine<'a>(&self, registry: &'a FakeRegistry) -> SyncEngine<'a, FakeRegistry> {
            SyncEngine::new(registry, &self.workdir, &self.skills).with_home(None)
        }
    }

    fn options() -> SyncOptions {
        SyncOptions {
            tags: vec!["latest".into()],
            ..SyncOptions::default()
        }
    }

    #[test]
    fn publishes_new_skill_and_records_lockfile() {
        let ws = Workspace::new();
        ws.add_skill("demo", "# Demo");
        let registry = FakeRegistry::default();

        let report = ws.engine(&registry).run(&options()).unwrap();

        assert_eq!(report.selected, vec!["demo"]);
        assert_eq!(
            report.published,
            vec![PublishedSkill {
                slug: "demo".into(),
                version: "1.0.0".into()
            }]
        );
        let published = registry.published.borrow();
        assert_eq!(published[0].display_name, "Demo");
        assert_eq!(published[0].changelog, "");
        assert_eq!(published[0].tags, vec!["latest"]);
        assert_eq!(Lockfile::read(&ws.workdir).get("demo").unwrap().version, "1.0.0");
    }

    #[test]
    fn second_run_reports_everything_synced() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "a");
        ws.add_skill("beta", "b");
        let registry = FakeRegistry::default().with_version("beta", "0.4.0", "stale");

        let first = ws.engine(&registry).run(&options()).unwrap();
        assert_eq!(first.published.len(), 2);
        assert_eq!(first.published[1].version, "0.4.1");

        let second = ws.engine(&registry).run(&options()).unwrap();
        assert!(second.actionable.is_empty());
        assert_eq!(second.synced.len(), 2);
        assert!(second.synced.iter().all(|c| c.status == SyncStatus::Synced));
        assert_eq!(second.summary_line(), "Everything is already synced.");
    }

    #[test]
    fn dry_run_publishes_nothing() {
        let ws = Workspace::new();
        ws.add_skill("demo", "x");
        let registry = FakeRegistry::default();

        let report = ws
            .engine(&registry)
            .run(&SyncOptions {
                dry_run: true,
                ..options()
            })
            .unwrap();

        assert_eq!(report.selected, vec!["demo"]);
        assert!(registry.published.borrow().is_empty());
        assert!(!Lockfile::path(&ws.workdir).exists());
        assert_eq!(report.summary_line(), "Dry run: would upload 1 skill(s).");
    }

    #[test]
    fn cancelled_selection_changes_nothing() {
        let ws = Workspace::new();
        ws.add_skill("demo", "x");
        let registry = FakeRegistry::default();
        let mut prompter = ScriptedPrompter::default();

        let err = ws
            .engine(&registry)
            .with_prompter(&mut prompter)
            .run(&options())
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(registry.published.borrow().is_empty());
        assert!(!Lockfile::path(&ws.workdir).exists());
    }

    #[test]
    fn cancelled_changelog_aborts_before_any_publish() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "new content");
        ws.add_skill("beta", "new content");
        let registry = FakeRegistry::default()
            .with_version("alpha", "1.0.0", "old")
            .with_version("beta", "1.0.0", "old");
        let mut prompter = ScriptedPrompter::with_texts(["alpha notes"]);
        prompter.selections.push_back(Some(vec![0, 1]));

        let err = ws
            .engine(&registry)
            .with_prompter(&mut prompter)
            .run(&options())
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(registry.published.borrow().is_empty());
        assert!(!Lockfile::path(&ws.workdir).exists());
    }

    #[test]
    fn prompted_selection_and_changelog() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "a2");
        ws.add_skill("beta", "b");
        let registry = FakeRegistry::default().with_version("alpha", "2.3.1", "old");
        let mut prompter = ScriptedPrompter::with_texts(["better alpha"]);
        prompter.selections.push_back(Some(vec![0]));

        let report = ws
            .engine(&registry)
            .with_prompter(&mut prompter)
            .run(&SyncOptions {
                bump: BumpClass::Minor,
                ..options()
            })
            .unwrap();

        assert_eq!(report.selected, vec!["alpha"]);
        assert_eq!(report.published[0].version, "2.4.0");
        assert_eq!(registry.published.borrow()[0].changelog, "better alpha");
        assert_eq!(
            prompter.asked,
            vec!["Select skills to upload", "Changelog for alpha@2.4.0"]
        );
    }

    #[test]
    fn empty_interactive_changelog_fails() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "a2");
        let registry = FakeRegistry::default().with_version("alpha", "1.0.0", "old");
        let mut prompter = ScriptedPrompter::with_texts(["  "]);
        prompter.selections.push_back(Some(vec![0]));

        let err = ws
            .engine(&registry)
            .with_prompter(&mut prompter)
            .run(&options())
            .unwrap_err();
        assert!(matches!(err, HubError::MissingChangelog(_)));
        assert!(registry.published.borrow().is_empty());
    }

    #[test]
    fn invalid_latest_version_skips_only_that_skill() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "a");
        ws.add_skill("beta", "b");
        let registry = FakeRegistry::default().with_version("alpha", "not-semver", "old");

        let report = ws
            .engine(&registry)
            .run(&SyncOptions {
                changelog: Some("notes".into()),
                ..options()
            })
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].slug, "alpha");
        assert_eq!(report.published.len(), 1);
        assert_eq!(report.published[0].slug, "beta");
        let lock = Lockfile::read(&ws.workdir);
        assert!(lock.get("alpha").is_none());
        assert!(lock.get("beta").is_some());

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, HubError::PartialFailure { failed: 1, total: 2 }));
    }

    #[test]
    fn publish_failure_is_recorded_per_skill() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "a");
        ws.add_skill("beta", "b");
        let registry = FakeRegistry {
            reject_publish: vec!["alpha".into()],
            ..FakeRegistry::default()
        };

        let report = ws.engine(&registry).run(&options()).unwrap();
        assert_eq!(report.failed[0].slug, "alpha");
        assert_eq!(report.published[0].slug, "beta");
        assert!(Lockfile::read(&ws.workdir).get("alpha").is_none());
    }

    #[test]
    fn registry_outage_aborts_run() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "a");
        let registry = FakeRegistry {
            resolve_status: Some(502),
            ..FakeRegistry::default()
        }
        .with_version("alpha", "1.0.0", "old");

        let err = ws.engine(&registry).run(&options()).unwrap_err();
        assert!(matches!(err, HubError::Registry { status: 502, .. }));
        assert!(!Lockfile::path(&ws.workdir).exists());
    }

    #[test]
    fn falls_back_to_legacy_roots() {
        let ws = Workspace::new();
        let home = tempdir().unwrap();
        let legacy = home.path().join(".clawd/skills/legacy");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("SKILL.md"), "x").unwrap();
        let registry = FakeRegistry::default();

        let report = SyncEngine::new(&registry, &ws.workdir, &ws.skills)
            .with_home(Some(home.path().to_path_buf()))
            .run(&SyncOptions {
                dry_run: true,
                ..options()
            })
            .unwrap();

        assert!(report.fallback_roots.is_some());
        assert_eq!(report.selected, vec!["legacy"]);
    }

    #[test]
    fn no_skills_anywhere_is_not_found() {
        let ws = Workspace::new();
        let registry = FakeRegistry::default();
        let err = ws.engine(&registry).run(&options()).unwrap_err();
        assert!(matches!(err, HubError::NotFound(_)));
    }

    #[test]
    fn selection_labels() {
        let ws = Workspace::new();
        ws.add_skill("alpha", "a");
        let registry = FakeRegistry::default();
        let mut report = SyncReport::default();
        let mut candidate = reconcile_all(
            &registry,
            ws.engine(&registry).discover(&options(), &mut report).unwrap(),
            |_| {},
        )
        .unwrap()
        .remove(0);

        assert_eq!(selection_label(&candidate, BumpClass::Patch), "alpha  NEW");
        candidate.status = SyncStatus::Update;
        candidate.latest_version = Some("1.2.3".into());
        assert_eq!(
            selection_label(&candidate, BumpClass::Major),
            "alpha  UPDATE 1.2.3 → 2.0.0"
        );
        candidate.latest_version = Some("bogus".into());
        assert_eq!(selection_label(&candidate, BumpClass::Patch), "alpha  UPDATE");
    }
}
