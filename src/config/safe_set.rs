//! Capacity-guarded writes with rollback.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use super::Settings;
use crate::messaging::{Message, MessageBus};

/// Converts storage failures into a boolean result plus a
/// `storageExceeded` broadcast.
#[derive(Clone)]
pub struct SafeSetter {
    settings: Settings,
    bus: Arc<dyn MessageBus>,
}

impl SafeSetter {
    pub fn new(settings: Settings, bus: Arc<dyn MessageBus>) -> Self {
        Self { settings, bus }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Store `value` under `key` only if it fits.
    ///
    /// On failure the previous raw text of `key` is put back (or the key is
    /// deleted if it had none), `flag_key` is set to whether that previous
    /// value is non-empty, and listeners get a `storageExceeded` message.
    /// Returns true when the new value was stored. Never fails.
    pub fn safe_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        flag_key: Option<&str>,
    ) -> bool {
        let store = self.settings.store();
        let old = match store.get_raw(key) {
            Ok(old) => old,
            Err(e) => {
                warn!(key, error = %e, "Could not read previous value before write");
                None
            }
        };

        let Err(e) = self.settings.set(key, Some(value)) else {
            return true;
        };
        warn!(key, error = %e, "Write rejected, rolling back");

        let restored = match &old {
            Some(raw) => store.set_raw(key, raw),
            None => store.remove(key),
        };
        if let Err(e) = restored {
            error!(key, error = %e, "Rollback failed");
        }

        if let Some(flag) = flag_key {
            let has_old = old.as_deref().is_some_and(raw_is_non_empty);
            if let Err(e) = self.settings.set(flag, Some(&has_old)) {
                error!(key = flag, error = %e, "Could not update quota flag");
            }
        }

        self.bus.notify(Message::StorageExceeded {
            name: flag_key.map(str::to_string),
        });
        false
    }
}

/// Whether stored raw text counts as holding data. Text that is not JSON
/// is treated as a plain string.
fn raw_is_non_empty(raw: &str) -> bool {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => is_non_empty(&value),
        Err(_) => !raw.is_empty(),
    }
}

/// Whether a stored value counts as holding data.
fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(true) | Value::Number(_) => true,
    }
}
