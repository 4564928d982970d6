//! Photo screensaver background engine.
//!
//! This library holds the coordination layer behind the `pss` CLI and is
//! used directly by the integration tests.
//!
//! # Modules
//!
//! - `config`: settings store, defaults, migration and capacity-guarded writes
//! - `messaging`: broadcast messages with an optional single reply
//! - `platform`: traits for power, idle, UI, alarms, windows and displays
//! - `schedule`: active time window, keep-awake policy and badge text
//! - `dispatch`: maps changed settings to their runtime effects
//! - `display`: opens screensaver windows without covering full-screen apps
//! - `photos`: photo source aggregation and gallery caching
//! - `background`: host event handlers wiring everything together
//! - `error`: error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod background;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod photos;
pub mod platform;
pub mod schedule;
