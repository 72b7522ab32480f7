//! `git` integration.
//!
//! Read-only inspection of a working copy goes through `git2`; anything
//! that talks to the network or rewrites history runs the `git` binary so
//! the user's credential helpers and hooks apply.

use std::path::{Path, PathBuf};

use git2::{Repository, StatusOptions};

use super::{RemoteBinding, VersionControlClient, run_command};
use crate::error::{Result, SyncError};

pub struct GitCli {
    binary: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn git(&self, dir: &Path, args: &[&str]) -> Result<String> {
        run_command(self.binary.as_os_str(), args, Some(dir)).map(|out| out.stdout)
    }

    fn open(dir: &Path) -> Result<Repository> {
        Repository::open(dir).map_err(|_| SyncError::NotInstalled(dir.to_path_buf()))
    }

    /// Stash reference (`stash@{n}`) whose subject carries `message`.
    fn find_stash(&self, dir: &Path, message: &str) -> Result<Option<String>> {
        let listing = self.git(dir, &["stash", "list", "--format=%gd%x09%gs"])?;
        Ok(parse_stash_list(&listing, message))
    }
}

impl VersionControlClient for GitCli {
    fn ensure_available(&self) -> Result<()> {
        which::which(&self.binary).map_err(|_| SyncError::DependencyMissing {
            tool: self.binary.display().to_string(),
            hint: "install git (https://git-scm.com/downloads) and make sure it is on PATH"
                .to_string(),
        })?;
        Ok(())
    }

    fn is_working_copy(&self, dir: &Path) -> bool {
        let Ok(repo) = Repository::open(dir) else {
            return false;
        };
        let (Some(workdir), Ok(expected)) = (repo.workdir(), dir.canonicalize()) else {
            return false;
        };
        workdir
            .canonicalize()
            .is_ok_and(|workdir| workdir == expected)
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let dest_str = dest.to_string_lossy();
        run_command(self.binary.as_os_str(), &["clone", url, &dest_str], None)?;
        Ok(())
    }

    fn remotes(&self, dir: &Path) -> Result<Vec<RemoteBinding>> {
        let repo = Self::open(dir)?;
        let names = repo.remotes()?;
        let mut bindings = Vec::new();
        for name in names.iter().flatten() {
            let remote = repo.find_remote(name)?;
            bindings.push(RemoteBinding {
                name: name.to_string(),
                url: remote.url().unwrap_or_default().to_string(),
            });
        }
        Ok(bindings)
    }

    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<()> {
        let repo = Self::open(dir)?;
        repo.remote(name, url)?;
        Ok(())
    }

    fn current_branch(&self, dir: &Path) -> Result<String> {
        let repo = Self::open(dir)?;
        let head = repo.head()?;
        head.shorthand()
            .filter(|_| head.is_branch())
            .map(ToString::to_string)
            .ok_or_else(|| {
                SyncError::Config(format!(
                    "{} has a detached HEAD; check out a branch first",
                    dir.display()
                ))
            })
    }

    fn has_uncommitted_changes(&self, dir: &Path) -> Result<bool> {
        let repo = Self::open(dir)?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);
        let statuses = repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .any(|entry| !entry.status().is_empty() && !entry.status().is_ignored()))
    }

    fn stash_push(&self, dir: &Path, message: &str) -> Result<bool> {
        if !self.has_uncommitted_changes(dir)? {
            return Ok(false);
        }
        self.git(dir, &["stash", "push", "--message", message])?;
        Ok(self.find_stash(dir, message)?.is_some())
    }

    fn stash_pop(&self, dir: &Path, message: &str) -> Result<()> {
        let Some(reference) = self.find_stash(dir, message)? else {
            tracing::debug!("no stash named {message}; nothing to reapply");
            return Ok(());
        };
        self.git(dir, &["stash", "pop", &reference])
            .map(|_| ())
            .map_err(|err| match err {
                SyncError::CommandFailed { stderr, .. } => SyncError::Conflict {
                    message: stderr
                        .lines()
                        .find(|line| !line.trim().is_empty())
                        .unwrap_or("stash could not be reapplied")
                        .to_string(),
                    stash: message.to_string(),
                },
                other => other,
            })
    }

    fn fetch(&self, dir: &Path, remote: &str) -> Result<()> {
        self.git(dir, &["fetch", remote])?;
        Ok(())
    }

    fn pull_rebase(&self, dir: &Path, remote: &str) -> Result<()> {
        self.git(dir, &["pull", "--rebase", remote])
            .map(|_| ())
            .map_err(with_rebase_hint)
    }

    fn rebase_onto(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        let target = format!("{remote}/{branch}");
        self.git(dir, &["rebase", &target])
            .map(|_| ())
            .map_err(with_rebase_hint)
    }
}

fn with_rebase_hint(err: SyncError) -> SyncError {
    match err {
        SyncError::CommandFailed {
            command,
            code,
            stderr,
            ..
        } => SyncError::CommandFailed {
            command,
            code,
            stderr,
            hint: Some(
                "resolve the conflicts and run `git rebase --continue`, or `git rebase --abort` to undo"
                    .to_string(),
            ),
        },
        other => other,
    }
}

fn parse_stash_list(listing: &str, message: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let (reference, subject) = line.split_once('\t')?;
        // Subjects look like "On main: <message>".
        let stored = subject.split_once(": ").map_or(subject, |(_, rest)| rest);
        (stored == message).then(|| reference.to_string())
    })
}
