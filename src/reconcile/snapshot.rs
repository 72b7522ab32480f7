//! Timestamped backup directories created before destructive steps.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::utils::ensure_dir;

const MANIFEST_FILE: &str = "manifest.json";
const PRIVATE_DIR: &str = "private";
const TREE_DIR: &str = "tree";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotReason {
    /// Only private entries were copied.
    PrivateEntries,
    /// The whole prior managed directory was moved aside.
    FullTree,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub managed_dir: PathBuf,
    pub reason: SnapshotReason,
    #[serde(default)]
    pub private_entries: Vec<String>,
    #[serde(default)]
    pub full_tree: bool,
}

/// A backup directory sitting next to the managed directory.
#[derive(Debug, Clone)]
pub struct BackupSnapshot {
    pub path: PathBuf,
    pub manifest: SnapshotManifest,
}

impl BackupSnapshot {
    /// Claim a fresh `<managed-name>-backup-<timestamp>` directory.
    pub fn create(backup_root: &Path, managed_dir: &Path, reason: SnapshotReason) -> Result<Self> {
        ensure_dir(backup_root)?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let base = format!("{}{stamp}", name_prefix(managed_dir)?);

        let mut attempt = 0u32;
        let (id, path) = loop {
            let id = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            let path = backup_root.join(&id);
            match std::fs::create_dir(&path) {
                Ok(()) => break (id, path),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => return Err(err.into()),
            }
        };

        tracing::info!("created backup snapshot {}", path.display());
        let snapshot = Self {
            path,
            manifest: SnapshotManifest {
                id,
                created_at: Utc::now(),
                managed_dir: managed_dir.to_path_buf(),
                reason,
                private_entries: Vec::new(),
                full_tree: false,
            },
        };
        snapshot.save_manifest()?;
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path.join(MANIFEST_FILE))?;
        let manifest: SnapshotManifest = serde_json::from_str(&raw)?;
        Ok(Self {
            path: path.to_path_buf(),
            manifest,
        })
    }

    pub fn save_manifest(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(self.path.join(MANIFEST_FILE), raw)?;
        Ok(())
    }

    #[must_use]
    pub fn private_dir(&self) -> PathBuf {
        self.path.join(PRIVATE_DIR)
    }

    #[must_use]
    pub fn tree_dir(&self) -> PathBuf {
        self.path.join(TREE_DIR)
    }

    /// Snapshots of `managed_dir` under `backup_root`, oldest first.
    ///
    /// Directories without a readable manifest are skipped.
    pub fn list(backup_root: &Path, managed_dir: &Path) -> Result<Vec<Self>> {
        if !backup_root.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = name_prefix(managed_dir)?;
        let mut snapshots = Vec::new();
        for entry in std::fs::read_dir(backup_root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) || !entry.file_type()?.is_dir() {
                continue;
            }
            match Self::load(&entry.path()) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => tracing::debug!("skipping {}: {err}", entry.path().display()),
            }
        }
        snapshots.sort_by(|a, b| a.manifest.id.cmp(&b.manifest.id));
        Ok(snapshots)
    }
}

fn name_prefix(managed_dir: &Path) -> Result<String> {
    let name = managed_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SyncError::Config(format!(
                "managed directory {} has no final path component",
                managed_dir.display()
            ))
        })?;
    Ok(format!("{name}-backup-"))
}
