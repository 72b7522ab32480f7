//! Install scenarios against the fake git and hosting clients.

use skillsync::SyncError;
use skillsync::reconcile::SnapshotReason;
use skillsync::remote::{ForkingStrategy, ORIGIN, UPSTREAM, VersionControlClient};
use skillsync::test_utils::fixtures::SyncFixture;
use skillsync::workflow::{InstallOutcome, InstallWorkflow, SyncContext};

fn remote_url(fixture: &SyncFixture, name: &str) -> Option<String> {
    fixture
        .vcs
        .remotes(&fixture.managed_dir)
        .unwrap()
        .into_iter()
        .find(|r| r.name == name)
        .map(|r| r.url)
}

#[test]
fn fresh_install_forks_clones_and_registers_upstream() {
    let fixture = SyncFixture::new();
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = InstallWorkflow::new(&ctx).run().unwrap();

    assert!(matches!(report.outcome, InstallOutcome::Installed));
    assert_eq!(fixture.hosting.forks_created(), 1);
    assert_eq!(remote_url(&fixture, ORIGIN), Some(fixture.fork_url()));
    assert_eq!(remote_url(&fixture, UPSTREAM), Some(fixture.canonical_url.clone()));
    assert!(fixture.vcs.is_working_copy(&fixture.managed_dir));
    assert_eq!(fixture.skills_entries(), vec!["alpha", "beta"]);
    assert!(report.snapshot.is_none());
    assert!(fixture.snapshots().is_empty());
}

#[test]
fn existing_fork_is_reused() {
    let fixture = SyncFixture::new();
    fixture
        .hosting
        .add_fork(&fixture.canonical, skillsync::test_utils::fixtures::FIXTURE_USER);
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = InstallWorkflow::new(&ctx).run().unwrap();

    assert_eq!(fixture.hosting.forks_created(), 0);
    assert_eq!(report.origin, Some(fixture.fork_url()));
    assert!(
        !fixture
            .hosting
            .calls()
            .iter()
            .any(|c| c.starts_with("repo fork"))
    );
}

#[test]
fn reinstall_over_plain_directory_moves_it_aside() {
    let fixture = SyncFixture::new();
    fixture.create_file("settings.json", "{\"theme\": \"dark\"}");
    fixture.create_file("skills/alpha/SKILL.md", "my old copy");
    fixture.create_private("private-research", "keep me");
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = InstallWorkflow::new(&ctx).run().unwrap();

    assert!(report.moved_aside);
    assert_eq!(report.restored, vec!["private-research"]);
    assert_eq!(
        fixture.read("skills/private-research/NOTES.md").as_deref(),
        Some("keep me")
    );
    assert_eq!(
        fixture.read("skills/alpha/SKILL.md").as_deref(),
        Some("---\nname: alpha\n---\n")
    );
    assert!(fixture.read("settings.json").is_none());

    let snapshots = fixture.snapshots();
    assert_eq!(snapshots.len(), 1);
    let snapshot = &snapshots[0];
    assert_eq!(snapshot.manifest.reason, SnapshotReason::FullTree);
    assert!(snapshot.manifest.full_tree);
    assert_eq!(snapshot.manifest.private_entries, vec!["private-research"]);
    assert!(snapshot.tree_dir().join("settings.json").is_file());
    assert!(
        snapshot
            .private_dir()
            .join("private-research/NOTES.md")
            .is_file()
    );
}

#[test]
fn installing_twice_updates_and_forks_once() {
    let fixture = SyncFixture::new();
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    InstallWorkflow::new(&ctx).run().unwrap();
    fixture.create_private("private-notes", "mine");
    let second = InstallWorkflow::new(&ctx).run().unwrap();

    match &second.outcome {
        InstallOutcome::Updated { update } => assert_eq!(update.synced_from, ORIGIN),
        other => panic!("expected update, got {other:?}"),
    }
    assert_eq!(fixture.hosting.forks_created(), 1);
    let clones = fixture
        .vcs
        .calls()
        .iter()
        .filter(|c| c.starts_with("clone"))
        .count();
    assert_eq!(clones, 1);
    assert_eq!(fixture.snapshots().len(), 1);
    assert_eq!(fixture.read("skills/private-notes/NOTES.md").as_deref(), Some("mine"));
}

#[test]
fn offline_fork_lookup_leaves_directory_untouched() {
    let fixture = SyncFixture::new();
    fixture.create_file("settings.json", "{}");
    fixture.hosting.set_offline(true);
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let err = InstallWorkflow::new(&ctx).run().unwrap_err();

    assert!(matches!(err, SyncError::RemoteUnavailable(_)), "got {err:?}");
    assert_eq!(err.exit_code(), 5);
    assert_eq!(fixture.read("settings.json").as_deref(), Some("{}"));
    assert!(!fixture.vcs.calls().iter().any(|c| c.starts_with("clone")));
}

#[test]
fn checkout_of_unrelated_repository_is_replaced() {
    let fixture = SyncFixture::new();
    let dotfiles = "https://example.test/someone/dotfiles.git";
    fixture.vcs.publish(dotfiles, &[("README.md", "# dotfiles\n")]);
    fixture.vcs.clone_repo(dotfiles, &fixture.managed_dir).unwrap();
    fixture.create_private("private-notes", "mine");
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = InstallWorkflow::new(&ctx).run().unwrap();

    assert!(matches!(report.outcome, InstallOutcome::Installed));
    assert!(report.moved_aside);
    assert_eq!(fixture.hosting.forks_created(), 1);
    assert_eq!(remote_url(&fixture, ORIGIN), Some(fixture.fork_url()));
    assert_eq!(remote_url(&fixture, UPSTREAM), Some(fixture.canonical_url.clone()));
    assert_eq!(fixture.read("README.md").as_deref(), Some("# Shared skills\n"));
    assert_eq!(fixture.read("skills/private-notes/NOTES.md").as_deref(), Some("mine"));

    let snapshots = fixture.snapshots();
    assert_eq!(snapshots.len(), 1);
    let tree = snapshots[0].tree_dir();
    assert_eq!(
        std::fs::read_to_string(tree.join("README.md")).unwrap(),
        "# dotfiles\n"
    );
    assert!(tree.join(".git").is_dir());
}

#[test]
fn failed_clone_puts_previous_contents_back() {
    let fixture = SyncFixture::new();
    fixture.create_file("settings.json", "{}");
    fixture.create_private("private-notes", "mine");
    fixture.vcs.set_offline(true);
    let settings = fixture.settings(ForkingStrategy::None);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let err = InstallWorkflow::new(&ctx).run().unwrap_err();

    assert!(matches!(err.root(), SyncError::RemoteUnavailable(_)), "got {err:?}");
    assert_eq!(err.exit_code(), 5);
    let snapshots = fixture.snapshots();
    assert_eq!(snapshots.len(), 1);
    assert!(!snapshots[0].manifest.full_tree);
    let hint = err.hint().unwrap_or_default();
    assert!(hint.contains("were put back"), "{hint}");
    assert!(hint.contains(&snapshots[0].path.display().to_string()), "{hint}");
    assert_eq!(fixture.read("settings.json").as_deref(), Some("{}"));
    assert_eq!(fixture.read("skills/private-notes/NOTES.md").as_deref(), Some("mine"));

    fixture.vcs.set_offline(false);
    let report = InstallWorkflow::new(&ctx).run().unwrap();

    assert!(report.moved_aside);
    assert_eq!(report.restored, vec!["private-notes"]);
    assert_eq!(fixture.read("skills/private-notes/NOTES.md").as_deref(), Some("mine"));
    assert!(fixture.read("settings.json").is_none());
}
