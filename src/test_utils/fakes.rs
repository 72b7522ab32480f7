//! In-memory stand-ins for `git` and `gh`.
//!
//! `FakeVcs` keeps remote trees in memory and materialises checkouts on
//! disk, so reconciler behaviour is exercised against real files. Every
//! call is recorded for assertions.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{Result, SyncError};
use crate::remote::{
    HostedRepo, HostingApiClient, ORIGIN, RemoteBinding, RepoSlug, VersionControlClient,
};

type Tree = BTreeMap<String, String>;

#[derive(Debug, Clone)]
struct FakeStash {
    message: String,
    /// (path, content at HEAD when stashed, working content or None if deleted)
    entries: Vec<(String, Option<String>, Option<String>)>,
}

#[derive(Debug, Default)]
struct Checkout {
    remotes: BTreeMap<String, String>,
    branch: String,
    head: Tree,
    fetched: HashMap<String, Tree>,
    stashes: Vec<FakeStash>,
}

#[derive(Debug)]
struct VcsState {
    available: bool,
    remotes: HashMap<String, Tree>,
    offline: bool,
    checkouts: HashMap<PathBuf, Checkout>,
    calls: Vec<String>,
}

impl Default for VcsState {
    fn default() -> Self {
        Self {
            available: true,
            remotes: HashMap::new(),
            offline: false,
            checkouts: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeVcs {
    state: Rc<RefCell<VcsState>>,
}

impl FakeVcs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tree served at `url`.
    pub fn publish(&self, url: &str, files: &[(&str, &str)]) {
        let tree = files
            .iter()
            .map(|(path, content)| ((*path).to_string(), (*content).to_string()))
            .collect();
        self.state.borrow_mut().remotes.insert(url.to_string(), tree);
    }

    /// Simulate a new commit on `url` touching one file.
    pub fn publish_file(&self, url: &str, path: &str, content: &str) {
        self.state
            .borrow_mut()
            .remotes
            .entry(url.to_string())
            .or_default()
            .insert(path.to_string(), content.to_string());
    }

    pub fn copy_remote(&self, from: &str, to: &str) {
        let mut state = self.state.borrow_mut();
        let tree = state.remotes.get(from).cloned().unwrap_or_default();
        state.remotes.insert(to.to_string(), tree);
    }

    #[must_use]
    pub fn has_remote(&self, url: &str) -> bool {
        self.state.borrow().remotes.contains_key(url)
    }

    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    #[must_use]
    pub fn stash_count(&self, dir: &Path) -> usize {
        self.state
            .borrow()
            .checkouts
            .get(dir)
            .map_or(0, |c| c.stashes.len())
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn with_checkout<T>(
        &self,
        dir: &Path,
        f: impl FnOnce(&mut Checkout, &HashMap<String, Tree>, bool) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.borrow_mut();
        let VcsState {
            checkouts,
            remotes,
            offline,
            ..
        } = &mut *state;
        let checkout = checkouts
            .get_mut(dir)
            .ok_or_else(|| SyncError::NotInstalled(dir.to_path_buf()))?;
        f(checkout, remotes, *offline)
    }
}

fn failed(command: &str, stderr: &str) -> SyncError {
    SyncError::CommandFailed {
        command: command.to_string(),
        code: 128,
        stderr: stderr.to_string(),
        hint: None,
    }
}

fn read_file(dir: &Path, path: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(path)).ok()
}

fn write_file(dir: &Path, path: &str, content: &str) -> Result<()> {
    let full = dir.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
}

fn modified_files(dir: &Path, head: &Tree) -> Vec<(String, Option<String>, Option<String>)> {
    head.iter()
        .filter_map(|(path, content)| {
            let current = read_file(dir, path);
            (current.as_deref() != Some(content.as_str()))
                .then(|| (path.clone(), Some(content.clone()), current))
        })
        .collect()
}

/// Check out `tree` over the current HEAD on disk.
fn apply_tree(dir: &Path, checkout: &mut Checkout, tree: &Tree) -> Result<()> {
    if !modified_files(dir, &checkout.head).is_empty() {
        return Err(failed(
            "git pull --rebase",
            "error: cannot pull with rebase: You have unstaged changes.",
        ));
    }
    for path in checkout.head.keys() {
        if !tree.contains_key(path) {
            let full = dir.join(path);
            if full.exists() {
                std::fs::remove_file(full)?;
            }
        }
    }
    for (path, content) in tree {
        write_file(dir, path, content)?;
    }
    checkout.head = tree.clone();
    Ok(())
}

impl VersionControlClient for FakeVcs {
    fn ensure_available(&self) -> Result<()> {
        if self.state.borrow().available {
            Ok(())
        } else {
            Err(SyncError::DependencyMissing {
                tool: "git".to_string(),
                hint: "install git and make sure it is on PATH".to_string(),
            })
        }
    }

    fn is_working_copy(&self, dir: &Path) -> bool {
        self.state.borrow().checkouts.contains_key(dir) && dir.join(".git").is_dir()
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        self.record(format!("clone {url}"));
        let mut state = self.state.borrow_mut();
        if state.offline {
            return Err(SyncError::RemoteUnavailable(format!(
                "unable to access '{url}': Could not resolve host"
            )));
        }
        let tree = state
            .remotes
            .get(url)
            .cloned()
            .ok_or_else(|| failed("git clone", "fatal: repository not found"))?;
        if !crate::utils::is_empty_dir(dest)? {
            return Err(failed(
                "git clone",
                "fatal: destination path already exists and is not an empty directory.",
            ));
        }

        std::fs::create_dir_all(dest.join(".git"))?;
        for (path, content) in &tree {
            write_file(dest, path, content)?;
        }
        state.checkouts.insert(
            dest.to_path_buf(),
            Checkout {
                remotes: BTreeMap::from([(ORIGIN.to_string(), url.to_string())]),
                branch: "main".to_string(),
                head: tree,
                ..Checkout::default()
            },
        );
        Ok(())
    }

    fn remotes(&self, dir: &Path) -> Result<Vec<RemoteBinding>> {
        self.with_checkout(dir, |checkout, _, _| {
            Ok(checkout
                .remotes
                .iter()
                .map(|(name, url)| RemoteBinding {
                    name: name.clone(),
                    url: url.clone(),
                })
                .collect())
        })
    }

    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<()> {
        self.record(format!("remote add {name} {url}"));
        self.with_checkout(dir, |checkout, _, _| {
            if checkout.remotes.contains_key(name) {
                return Err(failed(
                    "git remote add",
                    &format!("error: remote {name} already exists."),
                ));
            }
            checkout.remotes.insert(name.to_string(), url.to_string());
            Ok(())
        })
    }

    fn current_branch(&self, dir: &Path) -> Result<String> {
        self.with_checkout(dir, |checkout, _, _| Ok(checkout.branch.clone()))
    }

    fn has_uncommitted_changes(&self, dir: &Path) -> Result<bool> {
        self.with_checkout(dir, |checkout, _, _| {
            Ok(!modified_files(dir, &checkout.head).is_empty())
        })
    }

    fn stash_push(&self, dir: &Path, message: &str) -> Result<bool> {
        self.record(format!("stash push {message}"));
        self.with_checkout(dir, |checkout, _, _| {
            let entries = modified_files(dir, &checkout.head);
            if entries.is_empty() {
                return Ok(false);
            }
            for (path, base, _) in &entries {
                if let Some(base) = base {
                    write_file(dir, path, base)?;
                }
            }
            checkout.stashes.push(FakeStash {
                message: message.to_string(),
                entries,
            });
            Ok(true)
        })
    }

    fn stash_pop(&self, dir: &Path, message: &str) -> Result<()> {
        self.record(format!("stash pop {message}"));
        self.with_checkout(dir, |checkout, _, _| {
            let Some(index) = checkout.stashes.iter().position(|s| s.message == message) else {
                return Ok(());
            };
            let stash = checkout.stashes[index].clone();
            if let Some((path, _, _)) = stash
                .entries
                .iter()
                .find(|(path, base, _)| checkout.head.get(path) != base.as_ref())
            {
                return Err(SyncError::Conflict {
                    message: format!("CONFLICT (content): Merge conflict in {path}"),
                    stash: message.to_string(),
                });
            }
            for (path, _, working) in &stash.entries {
                match working {
                    Some(content) => write_file(dir, path, content)?,
                    None => {
                        let full = dir.join(path);
                        if full.exists() {
                            std::fs::remove_file(full)?;
                        }
                    }
                }
            }
            checkout.stashes.remove(index);
            Ok(())
        })
    }

    fn fetch(&self, dir: &Path, remote: &str) -> Result<()> {
        self.record(format!("fetch {remote}"));
        self.with_checkout(dir, |checkout, remotes, offline| {
            let url = checkout.remotes.get(remote).cloned().ok_or_else(|| {
                failed(
                    "git fetch",
                    &format!("fatal: '{remote}' does not appear to be a git repository"),
                )
            })?;
            if offline {
                return Err(SyncError::RemoteUnavailable(format!(
                    "unable to access '{url}'"
                )));
            }
            let tree = remotes
                .get(&url)
                .cloned()
                .ok_or_else(|| failed("git fetch", "fatal: repository not found"))?;
            checkout.fetched.insert(remote.to_string(), tree);
            Ok(())
        })
    }

    fn pull_rebase(&self, dir: &Path, remote: &str) -> Result<()> {
        self.record(format!("pull --rebase {remote}"));
        self.with_checkout(dir, |checkout, remotes, offline| {
            let url = checkout.remotes.get(remote).cloned().ok_or_else(|| {
                failed(
                    "git pull",
                    &format!("fatal: '{remote}' does not appear to be a git repository"),
                )
            })?;
            if offline {
                return Err(SyncError::RemoteUnavailable(format!(
                    "unable to access '{url}'"
                )));
            }
            let tree = remotes
                .get(&url)
                .cloned()
                .ok_or_else(|| failed("git pull", "fatal: repository not found"))?;
            apply_tree(dir, checkout, &tree)
        })
    }

    fn rebase_onto(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        self.record(format!("rebase {remote}/{branch}"));
        self.with_checkout(dir, |checkout, _, _| {
            let tree = checkout.fetched.get(remote).cloned().ok_or_else(|| {
                failed(
                    "git rebase",
                    &format!("fatal: invalid upstream '{remote}/{branch}'"),
                )
            })?;
            apply_tree(dir, checkout, &tree)
        })
    }
}

#[derive(Debug)]
struct HostingState {
    available: bool,
    authenticated: bool,
    offline: bool,
    user: String,
    canonical_urls: HashMap<RepoSlug, String>,
    repos: HashMap<RepoSlug, HostedRepo>,
    forks_created: usize,
    calls: Vec<String>,
}

/// Fake hosting API whose forks become remotes served by a `FakeVcs`.
#[derive(Debug, Clone)]
pub struct FakeHosting {
    vcs: FakeVcs,
    state: Rc<RefCell<HostingState>>,
}

impl FakeHosting {
    #[must_use]
    pub fn new(vcs: &FakeVcs, user: &str) -> Self {
        Self {
            vcs: vcs.clone(),
            state: Rc::new(RefCell::new(HostingState {
                available: true,
                authenticated: true,
                offline: false,
                user: user.to_string(),
                canonical_urls: HashMap::new(),
                repos: HashMap::new(),
                forks_created: 0,
                calls: Vec::new(),
            })),
        }
    }

    /// URL a fork owned by `owner` is served from.
    #[must_use]
    pub fn fork_url(canonical: &RepoSlug, owner: &str) -> String {
        format!("https://example.test/{owner}/{}.git", canonical.name)
    }

    pub fn add_canonical(&self, slug: &RepoSlug, url: &str) {
        let mut state = self.state.borrow_mut();
        state.canonical_urls.insert(slug.clone(), url.to_string());
        state.repos.insert(
            slug.clone(),
            HostedRepo {
                slug: slug.clone(),
                clone_url: url.to_string(),
                ssh_url: url.to_string(),
                is_fork: false,
                parent: None,
            },
        );
    }

    /// Register an already existing fork of `canonical` owned by `owner`.
    pub fn add_fork(&self, canonical: &RepoSlug, owner: &str) {
        let url = Self::fork_url(canonical, owner);
        if let Some(source) = self.state.borrow().canonical_urls.get(canonical) {
            self.vcs.copy_remote(source, &url);
        }
        let fork = canonical.with_owner(owner);
        self.state.borrow_mut().repos.insert(
            fork.clone(),
            HostedRepo {
                slug: fork,
                clone_url: url.clone(),
                ssh_url: url,
                is_fork: true,
                parent: Some(canonical.clone()),
            },
        );
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.state.borrow_mut().authenticated = authenticated;
    }

    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    #[must_use]
    pub fn forks_created(&self) -> usize {
        self.state.borrow().forks_created
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn check_session(&self) -> Result<()> {
        let state = self.state.borrow();
        if !state.authenticated {
            return Err(SyncError::Authentication(
                "You are not logged into any GitHub hosts.".to_string(),
            ));
        }
        if state.offline {
            return Err(SyncError::RemoteUnavailable(
                "error connecting to api.example.test".to_string(),
            ));
        }
        Ok(())
    }
}

impl HostingApiClient for FakeHosting {
    fn ensure_available(&self) -> Result<()> {
        if self.state.borrow().available {
            Ok(())
        } else {
            Err(SyncError::DependencyMissing {
                tool: "gh".to_string(),
                hint: "install the GitHub CLI and make sure it is on PATH".to_string(),
            })
        }
    }

    fn ensure_authenticated(&self) -> Result<()> {
        self.record("auth status".to_string());
        if self.state.borrow().authenticated {
            Ok(())
        } else {
            Err(SyncError::Authentication(
                "You are not logged into any GitHub hosts.".to_string(),
            ))
        }
    }

    fn current_user(&self) -> Result<String> {
        self.record("api user".to_string());
        self.check_session()?;
        Ok(self.state.borrow().user.clone())
    }

    fn find_repo(&self, slug: &RepoSlug) -> Result<Option<HostedRepo>> {
        self.record(format!("repo view {slug}"));
        self.check_session()?;
        Ok(self.state.borrow().repos.get(slug).cloned())
    }

    fn create_fork(&self, canonical: &RepoSlug) -> Result<()> {
        self.record(format!("repo fork {canonical}"));
        self.check_session()?;
        if !self.state.borrow().canonical_urls.contains_key(canonical) {
            return Err(failed(
                "gh repo fork",
                &format!("GraphQL: Could not resolve to a Repository with the name '{canonical}'."),
            ));
        }
        let user = self.state.borrow().user.clone();
        self.add_fork(canonical, &user);
        self.state.borrow_mut().forks_created += 1;
        Ok(())
    }
}
