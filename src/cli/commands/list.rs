//! clawdhub list - Show skills recorded in the lockfile

use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;
use crate::skills::lockfile::Lockfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSkill {
    pub slug: String,
    pub version: String,
    pub installed_at: i64,
}

/// Lockfile entries in slug order.
#[must_use]
pub fn installed_skills(lockfile: &Lockfile) -> Vec<InstalledSkill> {
    lockfile
        .skills
        .iter()
        .map(|(slug, entry)| InstalledSkill {
            slug: slug.clone(),
            version: entry.version.clone(),
            installed_at: entry.installed_at,
        })
        .collect()
}

pub fn run(ctx: &AppContext) -> Result<()> {
    let lockfile = Lockfile::read(&ctx.settings.workdir);
    let skills = installed_skills(&lockfile);

    if ctx.robot_mode() {
        return emit_json(&robot_ok(&skills));
    }
    if skills.is_empty() {
        println!("No installed skills.");
        return Ok(());
    }
    for skill in &skills {
        println!("{}  {}", skill.slug, skill.version);
    }
    Ok(())
}
