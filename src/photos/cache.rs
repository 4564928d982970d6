//! Per-gallery photo lists kept in the settings store.
//!
//! Each pass appends its photos to the cached list and reshuffles the whole
//! history. Photos whose image failed to load are reported with
//! [`GalleryCache::mark_broken`] and dropped the next time the gallery is
//! read.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

use super::Photo;
use crate::config::{SafeSetter, Settings};
use crate::error::{PssError, Result};

/// Settings key holding a gallery's photo list.
pub fn storage_key(name: &str) -> String {
    format!("{name}Images")
}

pub struct GalleryCache {
    setter: SafeSetter,
    broken: Mutex<HashMap<String, HashSet<String>>>,
}

impl GalleryCache {
    pub fn new(setter: SafeSetter) -> Self {
        Self {
            setter,
            broken: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.setter.settings()
    }

    /// Record an image load failure; the url is dropped on the next read.
    pub fn mark_broken(&self, name: &str, url: &str) -> Result<()> {
        self.broken
            .lock()
            .map_err(|_| PssError::Storage("broken photo list poisoned".to_string()))?
            .entry(name.to_string())
            .or_default()
            .insert(url.to_string());
        debug!(gallery = name, url, "Photo marked broken");
        Ok(())
    }

    /// The cached list for `name`, or `None` if nothing was ever stored.
    ///
    /// Pending broken urls are removed here and the cleaned list written
    /// back.
    #[instrument(skip(self))]
    pub fn read(&self, name: &str) -> Result<Option<Vec<Photo>>> {
        let key = storage_key(name);
        let Some(mut photos) = self.settings().get::<Vec<Photo>>(&key)? else {
            return Ok(None);
        };

        let broken = self
            .broken
            .lock()
            .map_err(|_| PssError::Storage("broken photo list poisoned".to_string()))?
            .remove(name)
            .unwrap_or_default();
        if broken.is_empty() {
            return Ok(Some(photos));
        }

        let before = photos.len();
        photos.retain(|p| !broken.contains(&p.url));
        if photos.len() != before {
            info!(gallery = name, removed = before - photos.len(), "Dropped broken photos");
            self.setter.safe_set(&key, &photos, None);
        }
        Ok(Some(photos))
    }

    /// Fold `new` into the cached list and persist it.
    ///
    /// With a prior cache the combined `old ++ new` list is shuffled;
    /// otherwise `new` is stored as given. Returns whether the write fit.
    #[instrument(skip(self, new), fields(new = new.len()))]
    pub fn merge_and_store(
        &self,
        name: &str,
        new: Vec<Photo>,
        flag_key: Option<&str>,
    ) -> Result<bool> {
        let combined = match self.read(name)? {
            Some(mut old) => {
                old.extend(new);
                old.shuffle(&mut rand::rng());
                old
            }
            None => new,
        };
        debug!(gallery = name, total = combined.len(), "Storing gallery");
        Ok(self.setter.safe_set(&storage_key(name), &combined, flag_key))
    }

    /// Overwrite the cached list with `photos`.
    pub fn replace(&self, name: &str, photos: &[Photo], flag_key: Option<&str>) -> bool {
        self.setter.safe_set(&storage_key(name), photos, flag_key)
    }

    pub fn clear(&self, name: &str) -> Result<()> {
        if let Ok(mut broken) = self.broken.lock() {
            broken.remove(name);
        }
        self.settings().remove(&storage_key(name))
    }
}
