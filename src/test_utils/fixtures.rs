use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::fakes::{FakeHosting, FakeVcs};
use crate::config::SyncSettings;
use crate::reconcile::BackupSnapshot;
use crate::remote::{CloneProtocol, ForkingStrategy, RepoSlug, VersionControlClient};

pub const FIXTURE_USER: &str = "me";

/// Files served by the canonical repository of every fixture.
pub const CANONICAL_TREE: &[(&str, &str)] = &[
    ("README.md", "# Shared skills\n"),
    ("install.sh", "#!/bin/sh\nskillsync install\n"),
    ("update.sh", "#!/bin/sh\nskillsync update \"$@\"\n"),
    ("skills/alpha/SKILL.md", "---\nname: alpha\n---\n"),
    ("skills/beta/SKILL.md", "---\nname: beta\n---\n"),
];

/// Isolated home directory with a fake canonical repository and fake clients.
pub struct SyncFixture {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub managed_dir: PathBuf,
    pub canonical: RepoSlug,
    pub canonical_url: String,
    pub vcs: FakeVcs,
    pub hosting: FakeHosting,
}

impl Default for SyncFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("home");
        std::fs::create_dir_all(&home).expect("Failed to create home dir");
        let managed_dir = home.join(".claude");

        let canonical: RepoSlug = "acme/skills".parse().expect("valid slug");
        let canonical_url = "https://example.test/acme/skills.git".to_string();

        let vcs = FakeVcs::new();
        vcs.publish(&canonical_url, CANONICAL_TREE);
        let hosting = FakeHosting::new(&vcs, FIXTURE_USER);
        hosting.add_canonical(&canonical, &canonical_url);

        println!("[FIXTURE] Created home directory: {home:?}");

        Self {
            temp_dir,
            home,
            managed_dir,
            canonical,
            canonical_url,
            vcs,
            hosting,
        }
    }

    #[must_use]
    pub fn settings(&self, forking: ForkingStrategy) -> SyncSettings {
        SyncSettings {
            managed_dir: self.managed_dir.clone(),
            backup_root: self.home.clone(),
            skills_dir: PathBuf::from("skills"),
            private_prefix: "private-".to_string(),
            entry_points: vec!["install.sh".to_string(), "update.sh".to_string()],
            canonical: self.canonical.clone(),
            canonical_url: Some(self.canonical_url.clone()),
            forking,
            protocol: CloneProtocol::Https,
            upstream_branch: None,
        }
    }

    /// URL of the fixture user's fork.
    #[must_use]
    pub fn fork_url(&self) -> String {
        FakeHosting::fork_url(&self.canonical, FIXTURE_USER)
    }

    /// Check out the canonical repository into the managed directory.
    pub fn clone_managed_dir(&self) {
        self.vcs
            .clone_repo(&self.canonical_url, &self.managed_dir)
            .expect("Failed to clone fixture repository");
    }

    /// Create a file relative to the managed directory.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.managed_dir.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Create `skills/<name>/NOTES.md`.
    pub fn create_private(&self, name: &str, content: &str) -> PathBuf {
        self.create_file(&format!("skills/{name}/NOTES.md"), content)
    }

    #[must_use]
    pub fn read(&self, relative_path: &str) -> Option<String> {
        std::fs::read_to_string(self.managed_dir.join(relative_path)).ok()
    }

    /// Names directly under the managed skills directory, sorted.
    #[must_use]
    pub fn skills_entries(&self) -> Vec<String> {
        let skills = self.managed_dir.join("skills");
        let Ok(entries) = std::fs::read_dir(&skills) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<BackupSnapshot> {
        BackupSnapshot::list(&self.home, &self.managed_dir).expect("Failed to list snapshots")
    }

    #[must_use]
    pub fn path(&self, relative_path: &str) -> PathBuf {
        self.managed_dir.join(relative_path)
    }

    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }
}

impl Drop for SyncFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.home);
    }
}
