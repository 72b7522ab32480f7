use std::collections::HashMap;
use std::path::PathBuf;

use skillsync::SyncError;
use skillsync::config::Config;
use skillsync::remote::{CloneProtocol, ForkingStrategy};
use skillsync::test_utils::{TestCase, run_table_tests};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn config_fixtures_resolve() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "minimal",
            input: "tests/fixtures/configs/minimal.toml",
            expected: (
                "private-".to_string(),
                ForkingStrategy::AutoFork,
                "https://github.com/acme/skills.git".to_string(),
                None,
            ),
        },
        TestCase {
            name: "fixed_fork",
            input: "tests/fixtures/configs/fixed_fork.toml",
            expected: (
                "mine-".to_string(),
                ForkingStrategy::FixedUrl("git@example.test:me/skills.git".to_string()),
                "git@github.com:acme/skills.git".to_string(),
                Some("trunk".to_string()),
            ),
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = Config::load(Some(&fixture_path(relative_path))).expect("load config");
        let settings = config.resolve().expect("resolve config");
        (
            settings.private_prefix.clone(),
            settings.forking.clone(),
            settings.canonical_clone_url(),
            settings.upstream_branch,
        )
    })?;
    Ok(())
}

#[test]
fn fixed_fork_fixture_paths_and_tools() {
    let config = Config::load(Some(&fixture_path("tests/fixtures/configs/fixed_fork.toml")))
        .expect("load config");
    assert_eq!(config.tools.git, "/usr/local/bin/git");
    assert_eq!(config.tools.gh, "gh");

    let settings = config.resolve().expect("resolve config");
    assert_eq!(settings.managed_dir, PathBuf::from("/srv/agents/.claude"));
    assert_eq!(settings.backup_root, PathBuf::from("/srv/agents"));
    assert_eq!(settings.entry_points, vec!["install.sh"]);
    assert_eq!(settings.protocol, CloneProtocol::Ssh);
}

#[test]
fn invalid_forking_mode_is_config_error() {
    let err = Config::load(Some(&fixture_path(
        "tests/fixtures/configs/invalid_forking.toml",
    )))
    .unwrap_err();
    assert!(matches!(err, SyncError::Config(_)), "got {err:?}");
}

#[test]
fn missing_explicit_config_is_error() {
    let err = Config::load(Some(&fixture_path("tests/fixtures/configs/nope.toml"))).unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn env_overrides_beat_file_values() {
    let mut config = Config::from_toml_str(
        r#"
[paths]
managed_dir = "/home/a/.claude"

[remote]
canonical = "acme/skills"
forking = "auto"
"#,
    )
    .unwrap();

    let env: HashMap<&str, &str> = HashMap::from([
        ("SKILLSYNC_MANAGED_DIR", "/home/b/.claude"),
        ("SKILLSYNC_FORKING", "none"),
        ("SKILLSYNC_CANONICAL_URL", "https://mirror.test/acme/skills.git"),
    ]);
    config
        .apply_overrides(|key| env.get(key).map(|v| (*v).to_string()))
        .unwrap();

    let settings = config.resolve().unwrap();
    assert_eq!(settings.managed_dir, PathBuf::from("/home/b/.claude"));
    assert_eq!(settings.forking, ForkingStrategy::None);
    assert_eq!(
        settings.canonical_clone_url(),
        "https://mirror.test/acme/skills.git"
    );
}

#[test]
fn malformed_canonical_slug_is_rejected() {
    let config = Config::from_toml_str("[remote]\ncanonical = \"not-a-slug\"\n").unwrap();
    let err = config.resolve().unwrap_err();
    assert!(matches!(err, SyncError::InvalidSlug(_)), "got {err:?}");
}
