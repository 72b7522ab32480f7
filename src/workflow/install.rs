//! First-time setup of the managed directory.
//!
//! Also the recovery path when the directory exists but is not a working
//! copy: its previous contents are moved into a backup snapshot before the
//! fresh clone, and private entries are copied back afterwards.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::SyncContext;
use super::update::{UpdateMode, UpdateReport, UpdateWorkflow};
use crate::error::{Result, SyncError};
use crate::reconcile::BackupSnapshot;
use crate::remote::{ORIGIN, UPSTREAM, same_repository};
use crate::utils::{ensure_dir, is_empty_dir, set_executable};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InstallOutcome {
    /// The directory was cloned fresh.
    Installed,
    /// The directory was already installed; an update ran instead.
    Updated { update: UpdateReport },
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub managed_dir: PathBuf,
    pub outcome: InstallOutcome,
    pub origin: Option<String>,
    pub upstream: Option<String>,
    pub snapshot: Option<PathBuf>,
    /// The previous directory contents were moved into the snapshot.
    pub moved_aside: bool,
    pub restored: Vec<String>,
    pub kept: Vec<String>,
    pub executables: Vec<String>,
}

pub struct InstallWorkflow<'c, 'a> {
    ctx: &'c SyncContext<'a>,
}

impl<'c, 'a> InstallWorkflow<'c, 'a> {
    #[must_use]
    pub const fn new(ctx: &'c SyncContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn run(&self) -> Result<InstallReport> {
        let settings = self.ctx.settings;
        let vcs = self.ctx.vcs;
        let dir = &settings.managed_dir;

        self.check_dependencies()?;

        let client = self.ctx.remote_client();
        let canonical_url = settings.canonical_clone_url();
        let mut resolved = None;

        if vcs.is_working_copy(dir) {
            let remotes = vcs.remotes(dir)?;
            let tracks = |url: &str| {
                remotes
                    .iter()
                    .filter(|b| b.name == ORIGIN || b.name == UPSTREAM)
                    .any(|b| same_repository(&b.url, url))
            };
            if !tracks(&canonical_url) {
                let origin =
                    client.resolve_origin(&settings.forking, &settings.canonical, &canonical_url)?;
                if !tracks(&origin) {
                    tracing::warn!(
                        "{} is a working copy of another repository; replacing it",
                        dir.display()
                    );
                    resolved = Some(origin);
                }
            }
            if resolved.is_none() {
                return self.delegate_to_update();
            }
        }

        let reconciler = self.ctx.reconciler();
        let mut snapshot = reconciler.scan_and_preserve()?;

        let origin = match resolved {
            Some(origin) => origin,
            None => client.resolve_origin(&settings.forking, &settings.canonical, &canonical_url)?,
        };

        let moved_aside = dir.exists() && !is_empty_dir(dir)?;
        if moved_aside {
            snapshot = Some(reconciler.move_aside(snapshot)?);
        }

        if let Some(parent) = dir.parent() {
            ensure_dir(parent)?;
        }
        tracing::info!("cloning {origin} into {}", dir.display());
        if let Err(err) = vcs.clone_repo(&origin, dir) {
            return Err(match snapshot.as_mut() {
                Some(snapshot) if moved_aside => self.put_back(err, snapshot),
                _ => err,
            });
        }

        let upstream = if origin == canonical_url {
            tracing::debug!("origin is the canonical repository; no upstream remote needed");
            None
        } else {
            client.register_remote(dir, UPSTREAM, &canonical_url)?;
            Some(canonical_url)
        };

        let restore = reconciler.restore(snapshot.as_ref())?;
        let executables = self.mark_entry_points();

        Ok(InstallReport {
            managed_dir: dir.clone(),
            outcome: InstallOutcome::Installed,
            origin: Some(origin),
            upstream,
            snapshot: snapshot.map(|s| s.path),
            moved_aside,
            restored: restore.restored,
            kept: restore.kept,
            executables,
        })
    }

    fn delegate_to_update(&self) -> Result<InstallReport> {
        let dir = &self.ctx.settings.managed_dir;
        tracing::info!("{} is already installed; updating instead", dir.display());
        let update = UpdateWorkflow::new(self.ctx).run(UpdateMode::Origin)?;
        Ok(InstallReport {
            managed_dir: dir.clone(),
            origin: None,
            upstream: None,
            snapshot: update.snapshot.clone(),
            moved_aside: false,
            restored: update.restored.clone(),
            kept: update.kept.clone(),
            executables: Vec::new(),
            outcome: InstallOutcome::Updated { update },
        })
    }

    /// Clone failed after the old tree was moved aside: move it back so a
    /// rerun preserves the same private entries again.
    fn put_back(&self, err: SyncError, snapshot: &mut BackupSnapshot) -> SyncError {
        let dir = &self.ctx.settings.managed_dir;
        let note = match self.ctx.reconciler().move_back(snapshot) {
            Ok(0) => format!(
                "the previous contents of {} were put back; backup kept at {}",
                dir.display(),
                snapshot.path.display()
            ),
            Ok(_) => format!(
                "some previous contents of {} are still in {}",
                dir.display(),
                snapshot.tree_dir().display()
            ),
            Err(move_err) => {
                tracing::warn!("could not move previous contents back: {move_err}");
                format!(
                    "the previous contents of {} are in {}",
                    dir.display(),
                    snapshot.tree_dir().display()
                )
            }
        };
        err.with_note(note)
    }

    fn check_dependencies(&self) -> Result<()> {
        self.ctx.vcs.ensure_available()?;
        if self.ctx.settings.forking.needs_hosting_api() {
            self.ctx.hosting.ensure_available()?;
            self.ctx.hosting.ensure_authenticated()?;
        }
        Ok(())
    }

    fn mark_entry_points(&self) -> Vec<String> {
        self.mark_entry_points_with(set_executable)
    }

    /// Best effort: failures are logged, never returned.
    fn mark_entry_points_with(&self, mark: impl Fn(&Path) -> Result<()>) -> Vec<String> {
        let dir = &self.ctx.settings.managed_dir;
        let mut marked = Vec::new();
        for name in &self.ctx.settings.entry_points {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            match mark(&path) {
                Ok(()) => marked.push(name.clone()),
                Err(err) => tracing::warn!("could not mark {} executable: {err}", path.display()),
            }
        }
        marked
    }
}
