//! Update scenarios: stash, rebase, reapply, and the upstream variant.

use skillsync::SyncError;
use skillsync::remote::{ForkingStrategy, UPSTREAM, VersionControlClient};
use skillsync::test_utils::fixtures::SyncFixture;
use skillsync::workflow::{InstallWorkflow, SyncContext, UpdateMode, UpdateWorkflow};

/// Install through an auto-created fork and forget the recorded calls.
fn installed_fixture() -> SyncFixture {
    let fixture = SyncFixture::new();
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);
    InstallWorkflow::new(&ctx).run().unwrap();
    fixture.vcs.clear_calls();
    fixture
}

#[test]
fn local_edits_are_stashed_and_reapplied() {
    let fixture = installed_fixture();
    fixture.create_file("README.md", "# my notes on the shared skills\n");
    fixture.create_private("private-drafts", "wip");
    fixture
        .vcs
        .publish_file(&fixture.fork_url(), "skills/alpha/SKILL.md", "alpha v2\n");
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = UpdateWorkflow::new(&ctx).run(UpdateMode::Origin).unwrap();

    assert_eq!(fixture.read("skills/alpha/SKILL.md").as_deref(), Some("alpha v2\n"));
    assert_eq!(
        fixture.read("README.md").as_deref(),
        Some("# my notes on the shared skills\n")
    );
    assert_eq!(fixture.read("skills/private-drafts/NOTES.md").as_deref(), Some("wip"));
    assert!(report.stash.is_some());
    assert_eq!(fixture.vcs.stash_count(&fixture.managed_dir), 0);
    assert!(report.push_hint.is_none());

    let calls = fixture.vcs.calls();
    let position = |prefix: &str| calls.iter().position(|c| c.starts_with(prefix));
    assert!(position("stash push") < position("pull --rebase origin"));
    assert!(position("pull --rebase origin") < position("stash pop"));
}

#[test]
fn default_mode_never_touches_upstream() {
    let fixture = installed_fixture();
    fixture
        .vcs
        .publish_file(&fixture.canonical_url, "skills/gamma/SKILL.md", "gamma\n");
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = UpdateWorkflow::new(&ctx).run(UpdateMode::Origin).unwrap();

    assert_eq!(report.synced_from, "origin");
    assert!(!fixture.path("skills/gamma").exists());
    assert!(!fixture.vcs.calls().iter().any(|c| c.contains(UPSTREAM)));
}

#[test]
fn upstream_mode_rebases_onto_canonical_and_hints_push() {
    let fixture = installed_fixture();
    fixture
        .vcs
        .publish_file(&fixture.canonical_url, "skills/gamma/SKILL.md", "gamma\n");
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = UpdateWorkflow::new(&ctx).run(UpdateMode::Upstream).unwrap();

    assert_eq!(fixture.read("skills/gamma/SKILL.md").as_deref(), Some("gamma\n"));
    assert_eq!(report.synced_from, UPSTREAM);
    assert_eq!(report.branch.as_deref(), Some("main"));
    // Install already registered upstream.
    assert!(!report.registered_upstream);
    let hint = report.push_hint.unwrap();
    assert!(hint.contains("push origin main"), "{hint}");

    let calls = fixture.vcs.calls();
    assert!(calls.contains(&"fetch upstream".to_string()));
    assert!(calls.contains(&"rebase upstream/main".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("remote add")));
}

#[test]
fn upstream_mode_registers_missing_upstream_remote() {
    let fixture = SyncFixture::new();
    fixture
        .vcs
        .copy_remote(&fixture.canonical_url, "https://example.test/me/custom.git");
    fixture
        .vcs
        .clone_repo("https://example.test/me/custom.git", &fixture.managed_dir)
        .unwrap();
    let settings = fixture.settings(ForkingStrategy::FixedUrl(
        "https://example.test/me/custom.git".to_string(),
    ));
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let report = UpdateWorkflow::new(&ctx).run(UpdateMode::Upstream).unwrap();

    assert!(report.registered_upstream);
    let upstream = fixture
        .vcs
        .remotes(&fixture.managed_dir)
        .unwrap()
        .into_iter()
        .find(|r| r.name == UPSTREAM)
        .unwrap();
    assert_eq!(upstream.url, fixture.canonical_url);
}

#[test]
fn conflicting_edit_surfaces_conflict_and_keeps_stash() {
    let fixture = installed_fixture();
    fixture.create_file("README.md", "# local rewrite\n");
    fixture.create_private("private-drafts", "wip");
    fixture
        .vcs
        .publish_file(&fixture.fork_url(), "README.md", "# upstream rewrite\n");
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let err = UpdateWorkflow::new(&ctx).run(UpdateMode::Origin).unwrap_err();

    assert!(matches!(err, SyncError::Conflict { .. }), "got {err:?}");
    assert_eq!(err.exit_code(), 7);
    assert_eq!(fixture.vcs.stash_count(&fixture.managed_dir), 1);
    assert_eq!(fixture.read("skills/private-drafts/NOTES.md").as_deref(), Some("wip"));
    assert_eq!(fixture.snapshots().len(), 1);
}

#[test]
fn update_without_install_is_not_installed() {
    let fixture = SyncFixture::new();
    let settings = fixture.settings(ForkingStrategy::AutoFork);
    let ctx = SyncContext::new(&settings, &fixture.vcs, &fixture.hosting);

    let err = UpdateWorkflow::new(&ctx).run(UpdateMode::Upstream).unwrap_err();

    assert!(matches!(err, SyncError::NotInstalled(_)));
    assert_eq!(err.exit_code(), 6);
    assert!(err.hint().unwrap().contains("skillsync install"));
}
