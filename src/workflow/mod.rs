//! Install and update orchestration.

pub mod install;
pub mod update;

use crate::config::SyncSettings;
use crate::reconcile::LocalTreeReconciler;
use crate::remote::{HostingApiClient, RemoteRepositoryClient, VersionControlClient};

pub use install::{InstallOutcome, InstallReport, InstallWorkflow};
pub use update::{UpdateMode, UpdateReport, UpdateWorkflow};

/// Settings and clients handed to every workflow run.
pub struct SyncContext<'a> {
    pub settings: &'a SyncSettings,
    pub vcs: &'a dyn VersionControlClient,
    pub hosting: &'a dyn HostingApiClient,
}

impl<'a> SyncContext<'a> {
    #[must_use]
    pub fn new(
        settings: &'a SyncSettings,
        vcs: &'a dyn VersionControlClient,
        hosting: &'a dyn HostingApiClient,
    ) -> Self {
        Self {
            settings,
            vcs,
            hosting,
        }
    }

    #[must_use]
    pub fn remote_client(&self) -> RemoteRepositoryClient<'a> {
        RemoteRepositoryClient::new(self.vcs, self.hosting, self.settings.protocol)
    }

    #[must_use]
    pub fn reconciler(&self) -> LocalTreeReconciler {
        LocalTreeReconciler::new(self.settings)
    }
}
