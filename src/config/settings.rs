//! Typed access to the settings store plus versioned initialization.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, trace};

use super::defaults::{
    CURRENT_VERSION, DEFAULTS, DEPRECATED_KEYS, RESTORE_EXCLUSIONS, SLIDER_KEYS,
    SLIDER_MIGRATION_VERSION, key,
};
use super::store::KeyValueStore;
use crate::error::{PssError, Result};

/// Value of a slider setting such as `idleTime` or `transitionTime`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderValue {
    /// Value in the setting's base unit.
    pub base: f64,
    /// Value as shown to the user in `unit`.
    pub display: f64,
    /// Index of the display unit.
    pub unit: u32,
}

/// The settings store.
///
/// Cheap to clone; all clones share the same underlying store.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}

impl Settings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Bring the store up to the current schema.
    ///
    /// Migrates legacy slider values, stamps the version, fills defaults and
    /// drops deprecated keys. With `restore_defaults` every default except
    /// the [`RESTORE_EXCLUSIONS`] is overwritten; otherwise only missing keys
    /// are filled, so user choices survive upgrades. Running it twice leaves
    /// the store unchanged.
    #[instrument(skip(self))]
    pub fn initialize(&self, restore_defaults: bool) -> Result<()> {
        let old_version = self.get_int(key::VERSION)?;

        if old_version.is_none_or(|v| v < SLIDER_MIGRATION_VERSION) {
            for slider in SLIDER_KEYS {
                self.migrate_slider(slider)?;
            }
        }

        self.store
            .set_raw(key::VERSION, &CURRENT_VERSION.to_string())?;

        if restore_defaults {
            for (k, v) in DEFAULTS {
                if !RESTORE_EXCLUSIONS.contains(k) {
                    self.store.set_raw(k, v)?;
                }
            }
        } else {
            for (k, v) in DEFAULTS {
                let missing = self.store.get_raw(k)?.is_none_or(|raw| raw.is_empty());
                if missing {
                    trace!(key = k, "Filling default");
                    self.store.set_raw(k, v)?;
                }
            }
        }

        for k in DEPRECATED_KEYS {
            self.store.remove(k)?;
        }

        info!(
            from = ?old_version,
            to = CURRENT_VERSION,
            restore_defaults,
            "Settings initialized"
        );
        Ok(())
    }

    /// Rewrite a bare number `N` as `{"base": N, "display": N, "unit": 0}`.
    fn migrate_slider(&self, slider: &str) -> Result<()> {
        let Some(raw) = self.store.get_raw(slider)? else {
            return Ok(());
        };
        let trimmed = raw.trim();
        // Already structured (or garbage): leave it for the default fill
        if !matches!(serde_json::from_str::<Value>(trimmed), Ok(Value::Number(_))) {
            return Ok(());
        }
        let migrated = format!(r#"{{"base": {trimmed}, "display": {trimmed}, "unit": 0}}"#);
        debug!(key = slider, old = trimmed, "Migrating slider setting");
        self.store.set_raw(slider, &migrated)
    }

    /// Parsed JSON value for `key`.
    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        match self.store.get_raw(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| PssError::ValueParse {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Value for `key` decoded as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get_raw(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| PssError::ValueParse {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Serialize and store `value`; `None` deletes the key.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: Option<&T>) -> Result<()> {
        match value {
            Some(v) => {
                let raw = serde_json::to_string(v)?;
                self.store.set_raw(key, &raw)
            }
            None => self.store.remove(key),
        }
    }

    /// Store an already parsed JSON value; `Value::Null` deletes the key.
    pub fn set_value(&self, key: &str, value: &Value) -> Result<()> {
        if value.is_null() {
            self.store.remove(key)
        } else {
            self.set(key, Some(value))
        }
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key)
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.store.get_raw(key)?.is_some())
    }

    /// Leading integer of the stored text, `None` when absent or not numeric.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.store.get_raw(key)?.and_then(|raw| parse_leading_int(&raw)))
    }

    /// Boolean flag; absent or non-boolean values read as `false`.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(matches!(self.get_value(key)?, Some(Value::Bool(true))))
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.get_value(key)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    pub fn get_slider(&self, key: &str) -> Result<Option<SliderValue>> {
        self.get(key)
    }

    /// Idle threshold in seconds (`idleTime` is stored in minutes).
    pub fn idle_seconds(&self) -> Result<u32> {
        let idle = self
            .get_slider(key::IDLE_TIME)?
            .ok_or_else(|| PssError::ValueParse {
                key: key::IDLE_TIME.to_string(),
                reason: "missing".to_string(),
            })?;
        let secs = (idle.base * 60.0).round();
        if !(0.0..=f64::from(u32::MAX)).contains(&secs) {
            return Err(PssError::ValueParse {
                key: key::IDLE_TIME.to_string(),
                reason: format!("out of range: {}", idle.base),
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(secs as u32)
    }

    /// True if the recorded OS is MS Windows.
    pub fn is_windows(&self) -> Result<bool> {
        Ok(self.get_string(key::OS)?.as_deref() == Some("win"))
    }

    /// Copy of every raw entry.
    pub fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        for k in self.store.keys()? {
            if let Some(v) = self.store.get_raw(&k)? {
                out.insert(k, v);
            }
        }
        Ok(out)
    }
}

/// Parse an optional sign followed by digits, ignoring leading whitespace
/// and any trailing text.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    rest[..digits_end].parse::<i64>().ok().map(|n| sign * n)
}
