//! Common test utilities for the `pss` CLI.
//!
//! - `cli`: CLI runner bound to a throwaway settings database, with fluent
//!   assertions
//! - `fixtures`: pre-populated settings databases
//! - `assertions`: output checks shared by the end-to-end tests

pub mod assertions;
pub mod cli;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
