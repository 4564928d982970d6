//! End-to-end tests for the pss CLI.

#[path = "../common/mod.rs"]
mod common;

mod environment;
mod human_mode;
mod json_mode;
