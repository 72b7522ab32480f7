//! E2E test suite entry point.

mod install_workflow;
mod real_git;
mod update_workflow;
