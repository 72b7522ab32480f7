use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{Config, SyncSettings};
use crate::error::Result;
use crate::remote::gh::GhCli;
use crate::remote::git::GitCli;
use crate::remote::{HostingApiClient, VersionControlClient};
use crate::workflow::SyncContext;

pub struct AppContext {
    pub config_path: Option<PathBuf>,
    pub config: Config,
    pub vcs: Box<dyn VersionControlClient>,
    pub hosting: Box<dyn HostingApiClient>,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Config::load(cli.config.as_deref())?;
        let config_path = cli
            .config
            .clone()
            .or_else(|| std::env::var_os("SKILLSYNC_CONFIG").map(PathBuf::from));
        if let Some(dir) = &cli.managed_dir {
            config.paths.managed_dir = dir.to_string_lossy().into_owned();
        }

        Ok(Self {
            vcs: Box::new(GitCli::new(&config.tools.git)),
            hosting: Box::new(GhCli::new(&config.tools.gh)),
            config_path: config_path.or_else(default_config_path),
            config,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    /// Validated settings for this invocation.
    pub fn settings(&self) -> Result<SyncSettings> {
        self.config.resolve()
    }

    #[must_use]
    pub fn sync_context<'a>(&'a self, settings: &'a SyncSettings) -> SyncContext<'a> {
        SyncContext::new(settings, self.vcs.as_ref(), self.hosting.as_ref())
    }
}

/// Global config file location, whether or not it exists.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("skillsync/config.toml"))
}
