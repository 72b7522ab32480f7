//! Version-control and hosting-API access.
//!
//! Workflows only talk to the two traits below. `GitCli` and `GhCli` drive
//! the real binaries; `test_utils::fakes` provides in-memory stand-ins.

pub mod client;
pub mod gh;
pub mod git;

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

pub use client::{RemoteAction, RemoteRepositoryClient};
pub use gh::GhCli;
pub use git::GitCli;

pub const ORIGIN: &str = "origin";
pub const UPSTREAM: &str = "upstream";

/// `owner/name` of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    #[must_use]
    pub fn clone_url(&self, protocol: CloneProtocol) -> String {
        match protocol {
            CloneProtocol::Https => format!("https://github.com/{}/{}.git", self.owner, self.name),
            CloneProtocol::Ssh => format!("git@github.com:{}/{}.git", self.owner, self.name),
        }
    }

    /// Same repository name under a different owner.
    #[must_use]
    pub fn with_owner(&self, owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: self.name.clone(),
        }
    }
}

impl FromStr for RepoSlug {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_end_matches(".git");
        let mut parts = trimmed.split('/');
        let (Some(owner), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(SyncError::InvalidSlug(s.to_string()));
        };
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(name) {
            return Err(SyncError::InvalidSlug(s.to_string()));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneProtocol {
    #[default]
    Https,
    Ssh,
}

impl FromStr for CloneProtocol {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "https" => Ok(Self::Https),
            "ssh" => Ok(Self::Ssh),
            _ => Err(SyncError::Config(format!(
                "invalid protocol {s} (expected https|ssh)"
            ))),
        }
    }
}

/// How the `origin` remote of a fresh install is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkingStrategy {
    /// Find or create the user's fork through the hosting API.
    AutoFork,
    /// Use a fork URL the operator configured.
    FixedUrl(String),
    /// Clone the canonical repository directly.
    None,
}

impl ForkingStrategy {
    #[must_use]
    pub const fn needs_hosting_api(&self) -> bool {
        matches!(self, Self::AutoFork)
    }
}

/// A named remote attached to a working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBinding {
    pub name: String,
    pub url: String,
}

/// A repository as reported by the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedRepo {
    pub slug: RepoSlug,
    pub clone_url: String,
    pub ssh_url: String,
    pub is_fork: bool,
    pub parent: Option<RepoSlug>,
}

impl HostedRepo {
    #[must_use]
    pub fn url_for(&self, protocol: CloneProtocol) -> &str {
        match protocol {
            CloneProtocol::Https => &self.clone_url,
            CloneProtocol::Ssh => &self.ssh_url,
        }
    }
}

/// Local working-copy operations.
pub trait VersionControlClient {
    fn ensure_available(&self) -> Result<()>;
    fn is_working_copy(&self, dir: &Path) -> bool;
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;
    fn remotes(&self, dir: &Path) -> Result<Vec<RemoteBinding>>;
    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<()>;
    fn current_branch(&self, dir: &Path) -> Result<String>;
    /// Uncommitted changes to tracked files only.
    fn has_uncommitted_changes(&self, dir: &Path) -> Result<bool>;
    /// Returns false when there was nothing to save.
    fn stash_push(&self, dir: &Path, message: &str) -> Result<bool>;
    fn stash_pop(&self, dir: &Path, message: &str) -> Result<()>;
    fn fetch(&self, dir: &Path, remote: &str) -> Result<()>;
    fn pull_rebase(&self, dir: &Path, remote: &str) -> Result<()>;
    fn rebase_onto(&self, dir: &Path, remote: &str, branch: &str) -> Result<()>;
}

/// Hosting service operations (forks, identity).
pub trait HostingApiClient {
    fn ensure_available(&self) -> Result<()>;
    fn ensure_authenticated(&self) -> Result<()>;
    fn current_user(&self) -> Result<String>;
    fn find_repo(&self, slug: &RepoSlug) -> Result<Option<HostedRepo>>;
    fn create_fork(&self, canonical: &RepoSlug) -> Result<()>;
}

/// Host and path of a remote URL with scheme, user and `.git` removed.
///
/// `git@github.com:o/n.git`, `https://github.com/o/n` and
/// `ssh://git@github.com/o/n.git` all normalise to `github.com/o/n`.
#[must_use]
pub fn normalize_remote_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let (rest, scp_like) = match trimmed.split_once("://") {
        Some((_, rest)) => (rest, false),
        None => (trimmed, true),
    };
    let rest = match rest.split_once('@') {
        Some((user, host)) if !user.contains('/') => host,
        _ => rest,
    };
    let rest = if scp_like && !rest.starts_with('/') {
        rest.replacen(':', "/", 1)
    } else {
        rest.to_string()
    };
    match rest.split_once('/') {
        Some((host, path)) => format!("{}/{path}", host.to_lowercase()),
        None => rest.to_lowercase(),
    }
}

#[must_use]
pub fn same_repository(a: &str, b: &str) -> bool {
    normalize_remote_url(a) == normalize_remote_url(b)
}

/// Captured stdout of a successful child process.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub stdout: String,
}

/// Run a command to completion, mapping failures through `classify_failure`.
pub(crate) fn run_command(
    program: &OsStr,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    // Never block on credential prompts.
    cmd.env("GIT_TERMINAL_PROMPT", "0").env("GH_PROMPT_DISABLED", "1");

    let rendered = format!("{} {}", program.to_string_lossy(), args.join(" "));
    tracing::debug!("running {rendered}");

    let output = cmd.output().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            SyncError::DependencyMissing {
                tool: program.to_string_lossy().into_owned(),
                hint: format!("install `{}` and make sure it is on PATH", program.to_string_lossy()),
            }
        } else {
            SyncError::Io(err)
        }
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        tracing::debug!("{rendered} exited with {code}: {}", stderr.trim());
        return Err(classify_failure(&rendered, code, stderr.trim()));
    }
    if !stderr.trim().is_empty() {
        tracing::trace!("{rendered}: {}", stderr.trim());
    }

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

const AUTH_PATTERNS: &[&str] = &[
    "gh auth login",
    "authentication failed",
    "authentication required",
    "bad credentials",
    "http 401",
    "permission denied (publickey)",
    "could not read username",
    "token has expired",
    "not logged in",
];

const NETWORK_PATTERNS: &[&str] = &[
    "could not resolve host",
    "unable to access",
    "connection refused",
    "connection timed out",
    "operation timed out",
    "network is unreachable",
    "error connecting to",
    "http 502",
    "http 503",
    "http 504",
    "could not read from remote repository",
];

/// Map a failed child process to the error taxonomy.
pub(crate) fn classify_failure(command: &str, code: i32, stderr: &str) -> SyncError {
    let lower = stderr.to_lowercase();
    if AUTH_PATTERNS.iter().any(|p| lower.contains(p)) {
        return SyncError::Authentication(first_line(stderr));
    }
    if NETWORK_PATTERNS.iter().any(|p| lower.contains(p)) {
        return SyncError::RemoteUnavailable(first_line(stderr));
    }
    SyncError::CommandFailed {
        command: command.to_string(),
        code,
        stderr: stderr.to_string(),
        hint: None,
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no details")
        .to_string()
}
