//! Key/value persistence abstraction for settings.
//!
//! Every value is stored as serialized JSON text; callers decode it with the
//! shape they expect. Implementations must be safe to share across the
//! components of the engine, so they use interior mutability.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use crate::error::{PssError, Result};

/// Core persistence operations.
///
/// This trait abstracts over the SQLite-backed store used in production and
/// the in-memory store used in tests.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw serialized value for `key`.
    fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Write the raw serialized value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PssError::QuotaExceeded`] when the write would exceed the
    /// store's capacity, or [`PssError::Storage`] on a backend failure.
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// List every stored key.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Bytes charged against a quota for one entry.
pub(crate) const fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// In-memory store with an optional byte quota and failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an unbounded, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store limited to `bytes` of keys plus values.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Create a store pre-populated with raw entries.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail until [`Self::heal`] is called.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Stop injecting write failures.
    pub fn heal(&self) {
        self.fail_writes.store(false, Ordering::SeqCst);
    }

    /// Copy of all raw entries.
    pub fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.lock()?.clone())
    }

    /// Bytes currently charged against the quota.
    pub fn usage(&self) -> Result<usize> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| entry_size(k, v))
            .sum())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| PssError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PssError::Storage(format!("injected write failure for '{key}'")));
        }

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| entry_size(k, v))
                .sum();
            let needed = entry_size(key, value);
            let available = quota.saturating_sub(others);
            if needed > available {
                return Err(PssError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        trace!(key, len = value.len(), "memory store write");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
