use std::collections::BTreeMap;
use std::fs;

use proptest::prelude::*;

use skillsync::reconcile::{LocalTreeReconciler, SnapshotReason};
use skillsync::remote::ForkingStrategy;
use skillsync::test_utils::fixtures::SyncFixture;

/// Stand-in for a clone or rebase: the skills directory is rebuilt from scratch.
fn replace_skills(fixture: &SyncFixture) {
    let skills = fixture.path("skills");
    if skills.exists() {
        fs::remove_dir_all(&skills).unwrap();
    }
    fixture.create_file("skills/alpha/SKILL.md", "alpha\n");
}

#[test]
fn private_files_and_directories_survive_replace() {
    let fixture = SyncFixture::new();
    fixture.create_private("private-dir", "nested");
    fixture.create_file("skills/private-note.md", "flat file");
    fixture.create_file("skills/public/SKILL.md", "tracked");
    let reconciler = LocalTreeReconciler::new(&fixture.settings(ForkingStrategy::None));

    let snapshot = reconciler.scan_and_preserve().unwrap().unwrap();
    assert_eq!(snapshot.manifest.reason, SnapshotReason::PrivateEntries);
    assert_eq!(
        snapshot.manifest.private_entries,
        vec!["private-dir", "private-note.md"]
    );

    replace_skills(&fixture);
    let report = reconciler.restore(Some(&snapshot)).unwrap();

    assert_eq!(report.restored, vec!["private-dir", "private-note.md"]);
    assert_eq!(fixture.read("skills/private-dir/NOTES.md").as_deref(), Some("nested"));
    assert_eq!(fixture.read("skills/private-note.md").as_deref(), Some("flat file"));
    assert!(!fixture.path("skills/public").exists());
}

#[test]
fn custom_prefix_is_honoured() {
    let fixture = SyncFixture::new();
    fixture.create_private("mine-tools", "x");
    fixture.create_private("private-tools", "y");
    let mut settings = fixture.settings(ForkingStrategy::None);
    settings.private_prefix = "mine-".to_string();

    let entries = LocalTreeReconciler::new(&settings).scan().unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["mine-tools"]);
}

#[test]
fn snapshot_lives_outside_managed_dir() {
    let fixture = SyncFixture::new();
    fixture.create_private("private-a", "a");
    let reconciler = LocalTreeReconciler::new(&fixture.settings(ForkingStrategy::None));

    let snapshot = reconciler.scan_and_preserve().unwrap().unwrap();
    assert!(!snapshot.path.starts_with(&fixture.managed_dir));
    assert!(snapshot.path.starts_with(fixture.home()));
    assert!(
        snapshot
            .manifest
            .id
            .starts_with(".claude-backup-")
    );
}

fn private_entries() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("private-[a-z]{1,8}", "[a-zA-Z0-9 ]{0,32}", 1..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn private_entries_survive_repeated_cycles(entries in private_entries(), cycles in 1usize..4) {
        let fixture = SyncFixture::new();
        for (name, content) in &entries {
            fixture.create_private(name, content);
        }
        let reconciler = LocalTreeReconciler::new(&fixture.settings(ForkingStrategy::None));

        for _ in 0..cycles {
            let snapshot = reconciler.scan_and_preserve().unwrap();
            prop_assert!(snapshot.is_some());
            replace_skills(&fixture);
            let report = reconciler.restore(snapshot.as_ref()).unwrap();
            prop_assert_eq!(report.restored.len(), entries.len());
            prop_assert!(report.kept.is_empty());
        }

        for (name, content) in &entries {
            let restored = fixture.read(&format!("skills/{name}/NOTES.md"));
            prop_assert_eq!(restored.as_deref(), Some(content.as_str()));
        }
        prop_assert_eq!(fixture.snapshots().len(), cycles);
    }
}
