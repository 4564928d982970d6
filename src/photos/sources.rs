//! Registry of photo sources keyed by their `use*` setting.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::cache::GalleryCache;
use super::http::HttpGet;
use super::px500::{Px500, Px500Gallery};
use super::Photo;
use crate::error::{PssError, Result};

/// The `use*` settings that each enable one photo source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PhotoSourceKey {
    SpaceReddit,
    EarthReddit,
    AnimalReddit,
    Editors500px,
    Popular500px,
    Yesterday500px,
    InterestingFlickr,
    Chromecast,
    Authors,
    Google,
}

impl PhotoSourceKey {
    pub const ALL: [Self; 10] = [
        Self::SpaceReddit,
        Self::EarthReddit,
        Self::AnimalReddit,
        Self::Editors500px,
        Self::Popular500px,
        Self::Yesterday500px,
        Self::InterestingFlickr,
        Self::Chromecast,
        Self::Authors,
        Self::Google,
    ];

    /// Settings key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpaceReddit => "useSpaceReddit",
            Self::EarthReddit => "useEarthReddit",
            Self::AnimalReddit => "useAnimalReddit",
            Self::Editors500px => "useEditors500px",
            Self::Popular500px => "usePopular500px",
            Self::Yesterday500px => "useYesterday500px",
            Self::InterestingFlickr => "useInterestingFlickr",
            Self::Chromecast => "useChromecast",
            Self::Authors => "useAuthors",
            Self::Google => "useGoogle",
        }
    }

    /// 500px gallery ("feature") served by this key, if any.
    pub const fn px500_gallery(self) -> Option<&'static str> {
        match self {
            Self::Editors500px => Some("editors"),
            Self::Popular500px => Some("popular"),
            Self::Yesterday500px => Some("fresh_yesterday"),
            _ => None,
        }
    }
}

impl fmt::Display for PhotoSourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoSourceKey {
    type Err = PssError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| PssError::UnknownSetting { key: s.to_string() })
    }
}

/// How a source's new photos combine with its cached list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistence {
    /// Append to the cached list and reshuffle.
    #[default]
    Merge,
    /// Overwrite the cached list.
    Replace,
}

/// A remote source of photos.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Photo>>;

    fn persistence(&self) -> Persistence {
        Persistence::Merge
    }
}

/// Result of refreshing one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Photos were fetched; `stored` is false if they did not fit.
    Stored { count: usize, stored: bool },
    /// The fetch failed; the source contributed nothing this pass.
    Failed { reason: String },
    /// Enabled, but no fetcher is registered for it.
    Unavailable,
    /// Disabled; its cached photos were deleted.
    Cleared,
}

pub struct PhotoSources {
    cache: Arc<GalleryCache>,
    sources: BTreeMap<PhotoSourceKey, Arc<dyn PhotoSource>>,
}

impl PhotoSources {
    pub fn new(cache: Arc<GalleryCache>) -> Self {
        Self {
            cache,
            sources: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn register(mut self, key: PhotoSourceKey, source: Arc<dyn PhotoSource>) -> Self {
        self.sources.insert(key, source);
        self
    }

    /// Register the three 500px galleries.
    #[must_use]
    pub fn with_500px(self, http: Arc<dyn HttpGet>, consumer_key: &str) -> Self {
        let client = Arc::new(Px500::new(http, consumer_key));
        PhotoSourceKey::ALL
            .into_iter()
            .filter_map(|k| k.px500_gallery().map(|g| (k, g)))
            .fold(self, |sources, (key, gallery)| {
                sources.register(key, Arc::new(Px500Gallery::new(client.clone(), gallery)))
            })
    }

    pub fn cache(&self) -> &Arc<GalleryCache> {
        &self.cache
    }

    /// True if `key` names a photo source setting.
    pub fn contains(key: &str) -> bool {
        key.parse::<PhotoSourceKey>().is_ok()
    }

    pub fn is_registered(&self, key: PhotoSourceKey) -> bool {
        self.sources.contains_key(&key)
    }

    /// Bring one source's cached photos in line with its setting.
    ///
    /// A failed fetch contributes zero photos and leaves the cache alone.
    #[instrument(skip(self), fields(key = key.as_str()))]
    pub async fn process(&self, key: PhotoSourceKey) -> Result<ProcessOutcome> {
        let name = key.as_str();
        if !self.cache.settings().get_bool(name)? {
            self.cache.clear(name)?;
            debug!("Source disabled, cache cleared");
            return Ok(ProcessOutcome::Cleared);
        }

        let Some(source) = self.sources.get(&key) else {
            debug!("No fetcher registered");
            return Ok(ProcessOutcome::Unavailable);
        };

        let photos = match source.fetch().await {
            Ok(photos) => photos,
            Err(e) => {
                warn!(error = %e, "Photo source failed");
                return Ok(ProcessOutcome::Failed { reason: e.to_string() });
            }
        };

        let count = photos.len();
        let stored = match source.persistence() {
            Persistence::Merge => self.cache.merge_and_store(name, photos, Some(name))?,
            Persistence::Replace => self.cache.replace(name, &photos, Some(name)),
        };
        info!(count, stored, "Source refreshed");
        Ok(ProcessOutcome::Stored { count, stored })
    }

    /// Refresh every source concurrently.
    pub async fn process_all(&self) -> Vec<(PhotoSourceKey, Result<ProcessOutcome>)> {
        let results = join_all(PhotoSourceKey::ALL.into_iter().map(|k| self.process(k))).await;
        PhotoSourceKey::ALL.into_iter().zip(results).collect()
    }

    /// Photos of every enabled source, first occurrence of a url wins.
    pub fn selected_photos(&self) -> Result<Vec<Photo>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for key in PhotoSourceKey::ALL {
            if !self.cache.settings().get_bool(key.as_str())? {
                continue;
            }
            let photos = self.cache.read(key.as_str())?.unwrap_or_default();
            out.extend(photos.into_iter().filter(|p| seen.insert(p.url.clone())));
        }
        Ok(out)
    }
}
