//! skillsync backups - List backup snapshots

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::reconcile::snapshot::{BackupSnapshot, SnapshotManifest, SnapshotReason};
use crate::utils::{dir_size, format_names, format_size};

#[derive(Args, Debug)]
pub struct BackupsArgs {
    /// Show only the most recent N snapshots
    #[arg(long, short)]
    pub limit: Option<usize>,
}

#[derive(Debug, serde::Serialize)]
pub struct BackupEntry {
    pub path: String,
    pub size_bytes: u64,
    #[serde(flatten)]
    pub manifest: SnapshotManifest,
}

pub fn run(ctx: &AppContext, args: &BackupsArgs) -> Result<()> {
    let settings = ctx.settings()?;
    let mut snapshots = BackupSnapshot::list(&settings.backup_root, &settings.managed_dir)?;
    // Newest first.
    snapshots.reverse();
    if let Some(limit) = args.limit {
        snapshots.truncate(limit);
    }

    let entries: Vec<BackupEntry> = snapshots
        .into_iter()
        .map(|snapshot| BackupEntry {
            path: snapshot.path.display().to_string(),
            size_bytes: dir_size(&snapshot.path),
            manifest: snapshot.manifest,
        })
        .collect();

    if ctx.robot_mode {
        return emit_json(&robot_ok(&entries));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("Backups in {}", settings.backup_root.display()));
    if entries.is_empty() {
        layout.push_line("No backups yet.");
    }
    for entry in &entries {
        let manifest = &entry.manifest;
        layout.section(&manifest.id);
        layout.kv(
            "created",
            &manifest
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        );
        layout.kv(
            "reason",
            match manifest.reason {
                SnapshotReason::PrivateEntries => "private entries",
                SnapshotReason::FullTree => "full tree moved aside",
            },
        );
        layout.kv("entries", &format_names(&manifest.private_entries));
        layout.kv("size", &format_size(entry.size_bytes));
        layout.blank();
    }
    emit_human(layout);
    Ok(())
}
