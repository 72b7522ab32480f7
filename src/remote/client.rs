use std::path::Path;

use serde::Serialize;

use super::{
    CloneProtocol, ForkingStrategy, HostingApiClient, RepoSlug, VersionControlClient,
};
use crate::error::{Result, SyncError};

/// Outcome of `register_remote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteAction {
    Added,
    AlreadyPresent,
}

/// High-level remote intents on top of the git and hosting clients.
pub struct RemoteRepositoryClient<'a> {
    vcs: &'a dyn VersionControlClient,
    hosting: &'a dyn HostingApiClient,
    protocol: CloneProtocol,
}

impl<'a> RemoteRepositoryClient<'a> {
    #[must_use]
    pub fn new(
        vcs: &'a dyn VersionControlClient,
        hosting: &'a dyn HostingApiClient,
        protocol: CloneProtocol,
    ) -> Self {
        Self {
            vcs,
            hosting,
            protocol,
        }
    }

    /// Return the URL of `user`'s fork of `canonical`, creating it if needed.
    pub fn ensure_fork_exists(&self, user: &str, canonical: &RepoSlug) -> Result<String> {
        let fork_slug = canonical.with_owner(user);

        if let Some(existing) = self.hosting.find_repo(&fork_slug)? {
            if !existing.is_fork || existing.parent.as_ref() != Some(canonical) {
                tracing::warn!(
                    "{fork_slug} exists but is not a fork of {canonical}; using it as origin anyway"
                );
            } else {
                tracing::info!("reusing existing fork {fork_slug}");
            }
            return Ok(existing.url_for(self.protocol).to_string());
        }

        tracing::info!("creating fork of {canonical} for {user}");
        self.hosting.create_fork(canonical)?;

        let created = self.hosting.find_repo(&fork_slug)?.ok_or_else(|| {
            SyncError::RemoteUnavailable(format!(
                "fork {fork_slug} was requested but is not visible yet; retry in a moment"
            ))
        })?;
        Ok(created.url_for(self.protocol).to_string())
    }

    /// URL that becomes `origin` for a fresh clone.
    pub fn resolve_origin(
        &self,
        strategy: &ForkingStrategy,
        canonical: &RepoSlug,
        canonical_url: &str,
    ) -> Result<String> {
        match strategy {
            ForkingStrategy::AutoFork => {
                let user = self.hosting.current_user()?;
                self.ensure_fork_exists(&user, canonical)
            }
            ForkingStrategy::FixedUrl(url) => Ok(url.clone()),
            ForkingStrategy::None => Ok(canonical_url.to_string()),
        }
    }

    /// Add `name` -> `url` unless a remote with that name already exists.
    pub fn register_remote(&self, dir: &Path, name: &str, url: &str) -> Result<RemoteAction> {
        let existing = self.vcs.remotes(dir)?;
        if let Some(binding) = existing.iter().find(|b| b.name == name) {
            if binding.url != url {
                tracing::warn!(
                    "remote {name} points at {} rather than {url}; leaving it unchanged",
                    binding.url
                );
            }
            return Ok(RemoteAction::AlreadyPresent);
        }
        self.vcs.add_remote(dir, name, url)?;
        tracing::info!("registered remote {name} -> {url}");
        Ok(RemoteAction::Added)
    }
}
