use std::path::PathBuf;

use clap::Parser;

use skillsync::cli::{Cli, Commands};
use skillsync::workflow::UpdateMode;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["skillsync"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

#[test]
fn parse_update_defaults_to_origin() {
    match parse(&["update"]).command {
        Commands::Update(args) => {
            assert!(!args.upstream);
            assert_eq!(args.mode(), UpdateMode::Origin);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_update_upstream() {
    match parse(&["update", "--upstream"]).command {
        Commands::Update(args) => assert_eq!(args.mode(), UpdateMode::Upstream),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_backups_limit() {
    match parse(&["backups", "--limit", "3"]).command {
        Commands::Backups(args) => assert_eq!(args.limit, Some(3)),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn global_flags_after_subcommand() {
    let cli = parse(&[
        "install",
        "--robot",
        "-vv",
        "--managed-dir",
        "/tmp/managed",
        "--config",
        "/tmp/skillsync.toml",
    ]);
    assert!(matches!(cli.command, Commands::Install(_)));
    assert!(cli.robot);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.managed_dir, Some(PathBuf::from("/tmp/managed")));
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/skillsync.toml")));
}

#[test]
fn unknown_subcommand_is_rejected() {
    let result = Cli::try_parse_from(["skillsync", "push"]);
    assert!(result.is_err());
}

#[test]
fn subcommand_is_required() {
    let result = Cli::try_parse_from(["skillsync"]);
    assert!(result.is_err());
}
