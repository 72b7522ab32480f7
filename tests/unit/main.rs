//! Unit-level integration tests against the public library API.

mod cli_command_parse_tests;
mod config_tests;
mod reconcile_tests;
