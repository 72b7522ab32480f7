//! GitHub CLI (`gh`) integration.
//!
//! Wraps the `gh` binary so fork lookups and creation reuse the operator's
//! existing login session.

use std::path::PathBuf;

use serde::Deserialize;

use super::{HostedRepo, HostingApiClient, RepoSlug, run_command};
use crate::error::{Result, SyncError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhRepoView {
    name_with_owner: String,
    url: String,
    #[serde(default)]
    ssh_url: Option<String>,
    #[serde(default)]
    is_fork: bool,
    #[serde(default)]
    parent: Option<GhParent>,
}

#[derive(Debug, Deserialize)]
struct GhParent {
    name: String,
    owner: GhOwner,
}

#[derive(Debug, Deserialize)]
struct GhOwner {
    login: String,
}

pub struct GhCli {
    binary: PathBuf,
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl GhCli {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn gh(&self, args: &[&str]) -> Result<String> {
        run_command(self.binary.as_os_str(), args, None).map(|out| out.stdout)
    }
}

impl HostingApiClient for GhCli {
    fn ensure_available(&self) -> Result<()> {
        which::which(&self.binary).map_err(|_| SyncError::DependencyMissing {
            tool: self.binary.display().to_string(),
            hint: "install the GitHub CLI (https://cli.github.com) and make sure it is on PATH"
                .to_string(),
        })?;
        Ok(())
    }

    fn ensure_authenticated(&self) -> Result<()> {
        match run_command(self.binary.as_os_str(), &["auth", "status"], None) {
            Ok(_) => Ok(()),
            Err(SyncError::CommandFailed { stderr, .. }) => {
                Err(SyncError::Authentication(stderr.trim().to_string()))
            }
            Err(other) => Err(other),
        }
    }

    fn current_user(&self) -> Result<String> {
        let login = self.gh(&["api", "user", "--jq", ".login"])?;
        let login = login.trim();
        if login.is_empty() {
            return Err(SyncError::Authentication(
                "gh returned an empty login".to_string(),
            ));
        }
        Ok(login.to_string())
    }

    fn find_repo(&self, slug: &RepoSlug) -> Result<Option<HostedRepo>> {
        let target = slug.to_string();
        let raw = match self.gh(&[
            "repo",
            "view",
            &target,
            "--json",
            "nameWithOwner,url,sshUrl,isFork,parent",
        ]) {
            Ok(raw) => raw,
            Err(SyncError::CommandFailed { stderr, .. }) if is_not_found(&stderr) => {
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        parse_repo_view(&raw).map(Some)
    }

    fn create_fork(&self, canonical: &RepoSlug) -> Result<()> {
        let target = canonical.to_string();
        self.gh(&["repo", "fork", &target, "--clone=false", "--remote=false"])?;
        Ok(())
    }
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("could not resolve to a repository") || lower.contains("http 404")
}

fn parse_repo_view(raw: &str) -> Result<HostedRepo> {
    let view: GhRepoView = serde_json::from_str(raw)?;
    let slug: RepoSlug = view.name_with_owner.parse()?;
    let clone_url = if view.url.ends_with(".git") {
        view.url.clone()
    } else {
        format!("{}.git", view.url)
    };
    let ssh_url = view
        .ssh_url
        .unwrap_or_else(|| format!("git@github.com:{slug}.git"));
    Ok(HostedRepo {
        slug,
        clone_url,
        ssh_url,
        is_fork: view.is_fork,
        parent: view.parent.map(|p| RepoSlug {
            owner: p.owner.login,
            name: p.name,
        }),
    })
}
