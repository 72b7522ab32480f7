//! Steady-state sync of an installed managed directory.

use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;

use super::SyncContext;
use crate::error::{Result, SyncError};
use crate::remote::{ORIGIN, RemoteAction, UPSTREAM};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Rebase onto the user's fork.
    #[default]
    Origin,
    /// Rebase onto the canonical repository.
    Upstream,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub managed_dir: PathBuf,
    pub mode: UpdateMode,
    /// Remote the new history came from.
    pub synced_from: String,
    pub branch: Option<String>,
    pub registered_upstream: bool,
    /// Name of the stash holding local edits during the sync.
    pub stash: Option<String>,
    pub snapshot: Option<PathBuf>,
    pub restored: Vec<String>,
    pub kept: Vec<String>,
    pub push_hint: Option<String>,
}

pub struct UpdateWorkflow<'c, 'a> {
    ctx: &'c SyncContext<'a>,
}

impl<'c, 'a> UpdateWorkflow<'c, 'a> {
    #[must_use]
    pub const fn new(ctx: &'c SyncContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn run(&self, mode: UpdateMode) -> Result<UpdateReport> {
        let settings = self.ctx.settings;
        let vcs = self.ctx.vcs;
        let dir = &settings.managed_dir;

        if !vcs.is_working_copy(dir) {
            return Err(SyncError::NotInstalled(dir.clone()));
        }
        vcs.ensure_available()?;

        let reconciler = self.ctx.reconciler();
        let snapshot = reconciler.scan_and_preserve()?;

        let stash_name = format!("skillsync-update-{}", Local::now().format("%Y%m%d-%H%M%S"));
        let stashed = vcs.stash_push(dir, &stash_name)?;
        if stashed {
            tracing::info!("set aside local edits as stash \"{stash_name}\"");
        }

        let synced = self.sync(mode);

        let restore = reconciler.restore(snapshot.as_ref())?;
        let (synced_from, branch, registered_upstream) =
            synced.map_err(|err| self.note_stash(err, stashed.then_some(stash_name.as_str())))?;

        if stashed {
            vcs.stash_pop(dir, &stash_name)?;
            tracing::info!("reapplied local edits");
        }

        let push_hint = (mode == UpdateMode::Upstream).then(|| {
            format!(
                "the result is not pushed automatically; run `git -C {} push {ORIGIN} {}` to update your fork",
                dir.display(),
                branch.as_deref().unwrap_or("HEAD")
            )
        });

        Ok(UpdateReport {
            managed_dir: dir.clone(),
            mode,
            synced_from,
            branch,
            registered_upstream,
            stash: stashed.then_some(stash_name),
            snapshot: snapshot.map(|s| s.path),
            restored: restore.restored,
            kept: restore.kept,
            push_hint,
        })
    }

    fn sync(&self, mode: UpdateMode) -> Result<(String, Option<String>, bool)> {
        let settings = self.ctx.settings;
        let vcs = self.ctx.vcs;
        let dir = &settings.managed_dir;

        match mode {
            UpdateMode::Origin => {
                tracing::info!("rebasing onto {ORIGIN}");
                vcs.pull_rebase(dir, ORIGIN)?;
                Ok((ORIGIN.to_string(), None, false))
            }
            UpdateMode::Upstream => {
                let action = self.ctx.remote_client().register_remote(
                    dir,
                    UPSTREAM,
                    &settings.canonical_clone_url(),
                )?;
                vcs.fetch(dir, UPSTREAM)?;
                let branch = match &settings.upstream_branch {
                    Some(branch) => branch.clone(),
                    None => vcs.current_branch(dir)?,
                };
                tracing::info!("rebasing onto {UPSTREAM}/{branch}");
                vcs.rebase_onto(dir, UPSTREAM, &branch)?;
                Ok((
                    UPSTREAM.to_string(),
                    Some(branch),
                    action == RemoteAction::Added,
                ))
            }
        }
    }

    fn note_stash(&self, err: SyncError, stash: Option<&str>) -> SyncError {
        let Some(stash) = stash else {
            return err;
        };
        let note = format!(
            "your uncommitted edits are saved as stash \"{stash}\"; run `git -C {} stash pop` once the tree is clean",
            self.ctx.settings.managed_dir.display()
        );
        err.with_note(note)
    }
}
