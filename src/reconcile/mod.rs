//! Keeps private skill entries alive across destructive tree replacement.
//!
//! The reconciler runs in four linear steps: scan the skills directory for
//! entries carrying the private prefix, preserve them into a backup
//! snapshot, let the caller replace the tree, then restore whatever the
//! replacement did not bring back under the same name.

pub mod snapshot;

use std::path::PathBuf;

use serde::Serialize;

use crate::config::SyncSettings;
use crate::error::Result;
use crate::utils::{copy_recursive, ensure_dir, move_entry};

pub use snapshot::{BackupSnapshot, SnapshotManifest, SnapshotReason};

/// A user-local entry directly under the skills directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivateEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Result of the restore step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    /// Copied back from the snapshot.
    pub restored: Vec<String>,
    /// Left alone because the replaced tree already had an entry of that name.
    pub kept: Vec<String>,
}

pub struct LocalTreeReconciler {
    managed_dir: PathBuf,
    skills_path: PathBuf,
    backup_root: PathBuf,
    private_prefix: String,
}

impl LocalTreeReconciler {
    #[must_use]
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            managed_dir: settings.managed_dir.clone(),
            skills_path: settings.skills_path(),
            backup_root: settings.backup_root.clone(),
            private_prefix: settings.private_prefix.clone(),
        }
    }

    /// Private entries currently present, sorted by name.
    pub fn scan(&self) -> Result<Vec<PrivateEntry>> {
        if !self.skills_path.is_dir() {
            tracing::debug!(
                "skills path {} does not exist; nothing to preserve",
                self.skills_path.display()
            );
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.skills_path)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
                tracing::warn!("skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };
            if !name.starts_with(&self.private_prefix) {
                continue;
            }
            entries.push(PrivateEntry {
                name,
                path: entry.path(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Copy `entries` into a new snapshot. No snapshot when `entries` is empty.
    pub fn preserve(&self, entries: &[PrivateEntry]) -> Result<Option<BackupSnapshot>> {
        if entries.is_empty() {
            return Ok(None);
        }

        let mut snapshot = BackupSnapshot::create(
            &self.backup_root,
            &self.managed_dir,
            SnapshotReason::PrivateEntries,
        )?;
        let private_dir = snapshot.private_dir();
        for entry in entries {
            copy_recursive(&entry.path, &private_dir.join(&entry.name))?;
            snapshot.manifest.private_entries.push(entry.name.clone());
            tracing::debug!("preserved {}", entry.name);
        }
        snapshot.save_manifest()?;
        tracing::info!(
            "preserved {} private entr{} in {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            snapshot.path.display()
        );
        Ok(Some(snapshot))
    }

    pub fn scan_and_preserve(&self) -> Result<Option<BackupSnapshot>> {
        let entries = self.scan()?;
        self.preserve(&entries)
    }

    /// Move everything inside the managed directory into `tree/` of a snapshot.
    pub fn move_aside(&self, snapshot: Option<BackupSnapshot>) -> Result<BackupSnapshot> {
        let mut snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => BackupSnapshot::create(
                &self.backup_root,
                &self.managed_dir,
                SnapshotReason::FullTree,
            )?,
        };

        let tree_dir = snapshot.tree_dir();
        for entry in std::fs::read_dir(&self.managed_dir)? {
            let entry = entry?;
            move_entry(&entry.path(), &tree_dir.join(entry.file_name()))?;
        }
        snapshot.manifest.reason = SnapshotReason::FullTree;
        snapshot.manifest.full_tree = true;
        snapshot.save_manifest()?;
        tracing::info!(
            "moved previous contents of {} to {}",
            self.managed_dir.display(),
            tree_dir.display()
        );
        Ok(snapshot)
    }

    /// Undo [`Self::move_aside`]. Names already present in the managed
    /// directory stay in `tree/`; returns how many were left there.
    pub fn move_back(&self, snapshot: &mut BackupSnapshot) -> Result<usize> {
        let tree_dir = snapshot.tree_dir();
        ensure_dir(&self.managed_dir)?;
        let mut left = 0;
        for entry in std::fs::read_dir(&tree_dir)? {
            let entry = entry?;
            let target = self.managed_dir.join(entry.file_name());
            if std::fs::symlink_metadata(&target).is_ok() {
                tracing::warn!(
                    "{} already exists; leaving the old copy in {}",
                    target.display(),
                    tree_dir.display()
                );
                left += 1;
                continue;
            }
            move_entry(&entry.path(), &target)?;
        }
        if left == 0 {
            snapshot.manifest.reason = SnapshotReason::PrivateEntries;
            snapshot.manifest.full_tree = false;
            snapshot.save_manifest()?;
        }
        tracing::info!(
            "moved previous contents back into {}",
            self.managed_dir.display()
        );
        Ok(left)
    }

    /// Copy preserved entries back, never overwriting an existing name.
    pub fn restore(&self, snapshot: Option<&BackupSnapshot>) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        let Some(snapshot) = snapshot else {
            return Ok(report);
        };

        let private_dir = snapshot.private_dir();
        for name in &snapshot.manifest.private_entries {
            let source = private_dir.join(name);
            if std::fs::symlink_metadata(&source).is_err() {
                tracing::warn!("{} is missing from the snapshot", source.display());
                continue;
            }
            let target = self.skills_path.join(name);
            if std::fs::symlink_metadata(&target).is_ok() {
                tracing::debug!("{name} already present after replace; keeping it");
                report.kept.push(name.clone());
                continue;
            }
            copy_recursive(&source, &target)?;
            tracing::debug!("restored {name}");
            report.restored.push(name.clone());
        }
        Ok(report)
    }
}
