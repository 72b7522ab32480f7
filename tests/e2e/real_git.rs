//! Install then update against real `git` repositories on disk.
//!
//! Skipped when no `git` binary is on PATH.

use std::path::Path;
use std::process::Command;

use skillsync::remote::{ForkingStrategy, GitCli, VersionControlClient};
use skillsync::test_utils::fixtures::SyncFixture;
use skillsync::workflow::{InstallOutcome, InstallWorkflow, SyncContext, UpdateMode, UpdateWorkflow};

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.test"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn install_and_update_with_real_git() {
    if which::which("git").is_err() {
        eprintln!("git not found; skipping");
        return;
    }

    let fixture = SyncFixture::new();
    let root = fixture.temp_dir.path();

    let seed = root.join("seed");
    std::fs::create_dir_all(&seed).unwrap();
    git(&seed, &["init", "--quiet"]);
    write(&seed, "README.md", "# Shared skills\n");
    write(&seed, "install.sh", "#!/bin/sh\n");
    write(&seed, "skills/alpha/SKILL.md", "alpha v1\n");
    git(&seed, &["add", "."]);
    git(&seed, &["commit", "--quiet", "-m", "initial"]);
    let branch = git(&seed, &["rev-parse", "--abbrev-ref", "HEAD"]);

    let bare = root.join("canonical.git");
    git(root, &["clone", "--quiet", "--bare", "seed", "canonical.git"]);

    let mut settings = fixture.settings(ForkingStrategy::None);
    settings.canonical_url = Some(bare.to_string_lossy().into_owned());
    let vcs = GitCli::default();
    let ctx = SyncContext::new(&settings, &vcs, &fixture.hosting);

    let report = InstallWorkflow::new(&ctx).run().unwrap();
    assert!(matches!(report.outcome, InstallOutcome::Installed));
    assert!(report.upstream.is_none());
    assert!(vcs.is_working_copy(&fixture.managed_dir));
    assert_eq!(vcs.current_branch(&fixture.managed_dir).unwrap(), branch);
    git(&fixture.managed_dir, &["config", "user.name", "Test"]);
    git(&fixture.managed_dir, &["config", "user.email", "test@example.test"]);

    fixture.create_file("README.md", "# Shared skills\n\nlocal notes\n");
    fixture.create_private("private-scratch", "mine");
    assert!(vcs.has_uncommitted_changes(&fixture.managed_dir).unwrap());

    write(&seed, "skills/alpha/SKILL.md", "alpha v2\n");
    git(&seed, &["commit", "--quiet", "-am", "bump alpha"]);
    git(
        &seed,
        &["push", "--quiet", bare.to_str().unwrap(), &format!("HEAD:{branch}")],
    );

    let update = UpdateWorkflow::new(&ctx).run(UpdateMode::Origin).unwrap();

    assert!(update.stash.is_some());
    assert_eq!(fixture.read("skills/alpha/SKILL.md").as_deref(), Some("alpha v2\n"));
    assert_eq!(
        fixture.read("README.md").as_deref(),
        Some("# Shared skills\n\nlocal notes\n")
    );
    assert_eq!(fixture.read("skills/private-scratch/NOTES.md").as_deref(), Some("mine"));
    assert_eq!(git(&fixture.managed_dir, &["stash", "list"]), "");
}
