//! Settings persistence.
//!
//! - `store`: the key/value persistence trait and an in-memory store
//! - `db`: the SQLite-backed production store
//! - `defaults`: default table, schema version and deprecated keys
//! - `settings`: typed access and versioned initialization
//! - `safe_set`: capacity-guarded writes with rollback

mod db;
pub mod defaults;
mod path;
mod safe_set;
mod settings;
mod store;

pub use db::{DEFAULT_QUOTA_BYTES, SqliteStore};
pub use path::{DB_ENV_VAR, default_db_path, resolve_db_path};
pub use safe_set::SafeSetter;
pub use settings::{Settings, SliderValue};
pub use store::{KeyValueStore, MemoryStore};
