//! skillsync - keep a personal skills directory in sync with a shared repository.
//!
//! The managed directory is a git working copy whose `origin` is the user's
//! fork of a canonical repository. Entries under `skills/` carrying the
//! private prefix are user-local: they are copied into a timestamped backup
//! before every destructive step and copied back afterwards without
//! overwriting anything the sync produced.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod remote;
pub mod test_utils;
pub mod utils;
pub mod workflow;

pub use error::{Result, SyncError};
