//! Error types for skillsync.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("required tool `{tool}` is not available")]
    DependencyMissing { tool: String, hint: String },

    #[error("not authenticated with the hosting API: {0}")]
    Authentication(String),

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("{} is not an installed working copy", .0.display())]
    NotInstalled(PathBuf),

    #[error("conflict while reapplying local edits: {message}")]
    Conflict { message: String, stash: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid repository slug `{0}` (expected owner/name)")]
    InvalidSlug(String),

    #[error("`{command}` failed (exit {code}): {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
        hint: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any error plus recovery information the operator must see.
    #[error("{source}")]
    Annotated {
        source: Box<SyncError>,
        note: String,
    },
}

impl SyncError {
    /// Remediation shown to the operator under the error line.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::DependencyMissing { hint, .. } => Some(hint.clone()),
            Self::Authentication(_) => Some("run `gh auth login` and retry".to_string()),
            Self::RemoteUnavailable(_) => {
                Some("check your network connection and the hosting service status".to_string())
            }
            Self::NotInstalled(_) => Some("run `skillsync install` first".to_string()),
            Self::Conflict { stash, .. } => Some(format!(
                "resolve the conflicting files, then run `git stash drop` once \"{stash}\" is no longer needed"
            )),
            Self::Config(_) | Self::InvalidSlug(_) => {
                Some("check ~/.config/skillsync/config.toml or the SKILLSYNC_* variables".to_string())
            }
            Self::CommandFailed { hint, .. } => hint.clone(),
            Self::Io(_) | Self::Git(_) | Self::Serialization(_) => None,
            Self::Annotated { source, note } => Some(
                source
                    .hint()
                    .map_or_else(|| note.clone(), |hint| format!("{hint}; {note}")),
            ),
        }
    }

    /// Attach a recovery note that ends up in `hint()`.
    #[must_use]
    pub fn with_note(self, note: impl Into<String>) -> Self {
        Self::Annotated {
            source: Box::new(self),
            note: note.into(),
        }
    }

    /// The error underneath any notes.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Annotated { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable identifier used in robot output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.root() {
            Self::DependencyMissing { .. } => "dependency_missing",
            Self::Authentication(_) => "authentication",
            Self::RemoteUnavailable(_) => "remote_unavailable",
            Self::NotInstalled(_) => "not_installed",
            Self::Conflict { .. } => "conflict",
            Self::Config(_) => "config",
            Self::InvalidSlug(_) => "invalid_slug",
            Self::CommandFailed { .. } => "command_failed",
            Self::Io(_) => "io",
            Self::Git(_) => "git",
            Self::Serialization(_) => "serialization",
            Self::Annotated { .. } => "error",
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self.root() {
            Self::DependencyMissing { .. } => 3,
            Self::Authentication(_) => 4,
            Self::RemoteUnavailable(_) => 5,
            Self::NotInstalled(_) => 6,
            Self::Conflict { .. } => 7,
            _ => 1,
        }
    }
}
