use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::remote::{CloneProtocol, ForkingStrategy, RepoSlug};
use crate::utils::expand_tilde;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILLSYNC_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            // An explicit file must exist; a missing global one is fine.
            if !path.exists() {
                return Err(SyncError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("skillsync/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SyncError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SyncError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    /// Parse a config document, layering it over the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| SyncError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        Ok(config)
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.paths {
            self.paths.merge(patch);
        }
        if let Some(patch) = patch.remote {
            self.remote.merge(patch);
        }
        if let Some(patch) = patch.tools {
            self.tools.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `SKILLSYNC_*` overrides from an arbitrary lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("SKILLSYNC_MANAGED_DIR") {
            self.paths.managed_dir = value;
        }
        if let Some(value) = lookup("SKILLSYNC_BACKUP_ROOT") {
            self.paths.backup_root = Some(value);
        }
        if let Some(value) = lookup("SKILLSYNC_SKILLS_DIR") {
            self.paths.skills_dir = value;
        }
        if let Some(value) = lookup("SKILLSYNC_PRIVATE_PREFIX") {
            self.paths.private_prefix = value;
        }

        if let Some(value) = lookup("SKILLSYNC_CANONICAL") {
            self.remote.canonical = value;
        }
        if let Some(value) = lookup("SKILLSYNC_CANONICAL_URL") {
            self.remote.canonical_url = Some(value);
        }
        if let Some(value) = lookup("SKILLSYNC_FORKING") {
            self.remote.forking = value.parse()?;
        }
        if let Some(value) = lookup("SKILLSYNC_FORK_URL") {
            self.remote.fork_url = Some(value);
        }
        if let Some(value) = lookup("SKILLSYNC_PROTOCOL") {
            self.remote.protocol = value.parse()?;
        }
        if let Some(value) = lookup("SKILLSYNC_UPSTREAM_BRANCH") {
            self.remote.upstream_branch = Some(value);
        }

        if let Some(value) = lookup("SKILLSYNC_GIT") {
            self.tools.git = value;
        }
        if let Some(value) = lookup("SKILLSYNC_GH") {
            self.tools.gh = value;
        }

        Ok(())
    }

    /// Validate and resolve into the settings every workflow receives.
    pub fn resolve(&self) -> Result<SyncSettings> {
        let managed_dir = expand_tilde(&self.paths.managed_dir);
        if managed_dir.as_os_str().is_empty() {
            return Err(SyncError::Config("paths.managed_dir is empty".to_string()));
        }
        let backup_root = match &self.paths.backup_root {
            Some(root) => expand_tilde(root),
            None => managed_dir
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    SyncError::Config(format!(
                        "cannot derive a backup root from {}",
                        managed_dir.display()
                    ))
                })?,
        };
        if backup_root.starts_with(&managed_dir) {
            return Err(SyncError::Config(
                "paths.backup_root must live outside the managed directory".to_string(),
            ));
        }
        if self.paths.private_prefix.is_empty() {
            return Err(SyncError::Config("paths.private_prefix is empty".to_string()));
        }

        if self.remote.canonical.trim().is_empty() {
            return Err(SyncError::Config(
                "remote.canonical is not set (expected owner/name)".to_string(),
            ));
        }
        let canonical: RepoSlug = self.remote.canonical.parse()?;

        let forking = match self.remote.forking {
            ForkingMode::Auto => ForkingStrategy::AutoFork,
            ForkingMode::None => ForkingStrategy::None,
            ForkingMode::Fixed => {
                let url = self.remote.fork_url.clone().ok_or_else(|| {
                    SyncError::Config("remote.forking = \"fixed\" requires remote.fork_url".to_string())
                })?;
                ForkingStrategy::FixedUrl(url)
            }
        };

        Ok(SyncSettings {
            managed_dir,
            backup_root,
            skills_dir: PathBuf::from(&self.paths.skills_dir),
            private_prefix: self.paths.private_prefix.clone(),
            entry_points: self.paths.entry_points.clone(),
            canonical,
            canonical_url: self.remote.canonical_url.clone(),
            forking,
            protocol: self.remote.protocol,
            upstream_branch: self.remote.upstream_branch.clone(),
        })
    }
}

/// Fully resolved settings for one workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub managed_dir: PathBuf,
    pub backup_root: PathBuf,
    /// Relative to `managed_dir`.
    pub skills_dir: PathBuf,
    pub private_prefix: String,
    pub entry_points: Vec<String>,
    pub canonical: RepoSlug,
    pub canonical_url: Option<String>,
    pub forking: ForkingStrategy,
    pub protocol: CloneProtocol,
    pub upstream_branch: Option<String>,
}

impl SyncSettings {
    #[must_use]
    pub fn skills_path(&self) -> PathBuf {
        self.managed_dir.join(&self.skills_dir)
    }

    /// URL of the canonical repository, explicit or derived from the slug.
    #[must_use]
    pub fn canonical_clone_url(&self) -> String {
        self.canonical_url
            .clone()
            .unwrap_or_else(|| self.canonical.clone_url(self.protocol))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub managed_dir: String,
    #[serde(default)]
    pub backup_root: Option<String>,
    #[serde(default)]
    pub skills_dir: String,
    #[serde(default)]
    pub private_prefix: String,
    #[serde(default)]
    pub entry_points: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            managed_dir: "~/.claude".to_string(),
            backup_root: None,
            skills_dir: "skills".to_string(),
            private_prefix: "private-".to_string(),
            entry_points: vec!["install.sh".to_string(), "update.sh".to_string()],
        }
    }
}

impl PathsConfig {
    fn merge(&mut self, patch: PathsPatch) {
        if let Some(value) = patch.managed_dir {
            self.managed_dir = value;
        }
        if let Some(value) = patch.backup_root {
            self.backup_root = Some(value);
        }
        if let Some(value) = patch.skills_dir {
            self.skills_dir = value;
        }
        if let Some(value) = patch.private_prefix {
            self.private_prefix = value;
        }
        if let Some(values) = patch.entry_points {
            self.entry_points = values;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkingMode {
    #[default]
    Auto,
    Fixed,
    None,
}

impl std::str::FromStr for ForkingMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "fixed" => Ok(Self::Fixed),
            "none" => Ok(Self::None),
            _ => Err(SyncError::Config(format!(
                "invalid forking mode {s} (expected auto|fixed|none)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub canonical: String,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub forking: ForkingMode,
    #[serde(default)]
    pub fork_url: Option<String>,
    #[serde(default)]
    pub protocol: CloneProtocol,
    #[serde(default)]
    pub upstream_branch: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            canonical: String::new(),
            canonical_url: None,
            forking: ForkingMode::Auto,
            fork_url: None,
            protocol: CloneProtocol::Https,
            upstream_branch: None,
        }
    }
}

impl RemoteConfig {
    fn merge(&mut self, patch: RemotePatch) {
        if let Some(value) = patch.canonical {
            self.canonical = value;
        }
        if let Some(value) = patch.canonical_url {
            self.canonical_url = Some(value);
        }
        if let Some(value) = patch.forking {
            self.forking = value;
        }
        if let Some(value) = patch.fork_url {
            self.fork_url = Some(value);
        }
        if let Some(value) = patch.protocol {
            self.protocol = value;
        }
        if let Some(value) = patch.upstream_branch {
            self.upstream_branch = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub git: String,
    #[serde(default)]
    pub gh: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            gh: "gh".to_string(),
        }
    }
}

impl ToolsConfig {
    fn merge(&mut self, patch: ToolsPatch) {
        if let Some(value) = patch.git {
            self.git = value;
        }
        if let Some(value) = patch.gh {
            self.gh = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub paths: Option<PathsPatch>,
    pub remote: Option<RemotePatch>,
    pub tools: Option<ToolsPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PathsPatch {
    pub managed_dir: Option<String>,
    pub backup_root: Option<String>,
    pub skills_dir: Option<String>,
    pub private_prefix: Option<String>,
    pub entry_points: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RemotePatch {
    pub canonical: Option<String>,
    pub canonical_url: Option<String>,
    pub forking: Option<ForkingMode>,
    pub fork_url: Option<String>,
    pub protocol: Option<CloneProtocol>,
    pub upstream_branch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ToolsPatch {
    pub git: Option<String>,
    pub gh: Option<String>,
}
