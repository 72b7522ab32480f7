//! skillsync status - Show the state of the managed directory

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::reconcile::snapshot::BackupSnapshot;
use crate::remote::RemoteBinding;
use crate::utils::format_names;

#[derive(Args, Debug)]
pub struct StatusArgs {}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub managed_dir: PathBuf,
    pub installed: bool,
    pub branch: Option<String>,
    pub remotes: Vec<RemoteBinding>,
    pub uncommitted_changes: bool,
    pub private_entries: Vec<String>,
    pub backup_root: PathBuf,
    pub backups: usize,
}

pub fn run(ctx: &AppContext, _args: &StatusArgs) -> Result<()> {
    let settings = ctx.settings()?;
    let sync = ctx.sync_context(&settings);
    let vcs = sync.vcs;
    let dir = &settings.managed_dir;

    let installed = vcs.is_working_copy(dir);
    let (branch, remotes, uncommitted_changes) = if installed {
        (
            vcs.current_branch(dir).ok(),
            vcs.remotes(dir)?,
            vcs.has_uncommitted_changes(dir)?,
        )
    } else {
        (None, Vec::new(), false)
    };
    let private_entries = sync
        .reconciler()
        .scan()?
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    let backups = BackupSnapshot::list(&settings.backup_root, dir)?.len();

    let report = StatusReport {
        managed_dir: dir.clone(),
        installed,
        branch,
        remotes,
        uncommitted_changes,
        private_entries,
        backup_root: settings.backup_root.clone(),
        backups,
    };

    if ctx.robot_mode {
        return emit_json(&robot_ok(&report));
    }

    let mut layout = HumanLayout::new();
    layout.title("skillsync status");
    layout.kv("managed dir", &report.managed_dir.display().to_string());
    layout.check(
        report.installed,
        "installed",
        if report.installed {
            ""
        } else {
            "run `skillsync install`"
        },
    );
    if report.installed {
        layout.kv("branch", report.branch.as_deref().unwrap_or("(detached)"));
        layout.kv(
            "local edits",
            if report.uncommitted_changes {
                "yes"
            } else {
                "none"
            },
        );
        layout.blank().section("Remotes");
        for remote in &report.remotes {
            layout.bullet(&format!("{}  {}", remote.name, remote.url));
        }
    }
    layout.blank().section("Private entries");
    layout.push_line(format_names(&report.private_entries));
    layout.blank();
    layout.kv(
        "backups",
        &format!("{} in {}", report.backups, report.backup_root.display()),
    );
    emit_human(layout);
    Ok(())
}
