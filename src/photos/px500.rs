//! 500px gallery aggregation.
//!
//! The API caps each call at 100 photos, so a gallery is fetched as several
//! calls over disjoint category groups, issued together and merged in group
//! order.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{debug, info, instrument, trace};

use super::http::HttpGet;
use super::sources::{Persistence, PhotoSource};
use super::Photo;
use crate::error::{PssError, Result};

/// REST endpoint for photo queries.
pub const API_URL: &str = "https://api.500px.com/v1/photos/";

/// Per-call result cap imposed by the API.
pub const MAX_PHOTOS: u32 = 100;

/// Category groups, one API call each.
pub const CATEGORY_GROUPS: &[&str] = &[
    "Nature,City and Architecture",
    "Landscapes,Animals",
    "Macro,Still Life,Underwater",
];

/// Gallery ("feature") names the API accepts.
pub const GALLERIES: &[&str] = &[
    "popular",
    "highest_rated",
    "upcoming",
    "editors",
    "fresh_today",
    "fresh_yesterday",
    "fresh_week",
];

const SORT_ORDER: &str = "rating";
const IMAGE_SIZE: &str = "2048";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    photos: Vec<ApiPhoto>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPhoto {
    #[serde(default)]
    nsfw: Option<bool>,
    width: f64,
    height: f64,
    #[serde(default)]
    images: Vec<ApiImage>,
    user: ApiUser,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    #[serde(default)]
    fullname: String,
}

/// Client for 500px galleries ("popular", "editors", "fresh_yesterday", ...).
pub struct Px500 {
    http: Arc<dyn HttpGet>,
    consumer_key: String,
}

impl Px500 {
    pub fn new(http: Arc<dyn HttpGet>, consumer_key: impl Into<String>) -> Self {
        Self {
            http,
            consumer_key: consumer_key.into(),
        }
    }

    /// Reject gallery names the API does not know.
    pub fn check_gallery(gallery: &str) -> Result<()> {
        if GALLERIES.contains(&gallery) {
            Ok(())
        } else {
            Err(PssError::UnknownGallery(gallery.to_string()))
        }
    }

    /// Query URL for one category group of a gallery.
    pub fn query_url(&self, gallery: &str, categories: &str) -> Result<String> {
        let rpp = MAX_PHOTOS.to_string();
        let url = reqwest::Url::parse_with_params(
            API_URL,
            &[
                ("consumer_key", self.consumer_key.as_str()),
                ("feature", gallery),
                ("only", categories),
                ("rpp", rpp.as_str()),
                ("sort", SORT_ORDER),
                ("image_size", IMAGE_SIZE),
            ],
        )
        .map_err(|e| PssError::Other(format!("Bad photo query URL: {e}")))?;
        Ok(url.into())
    }

    /// Fetch every category group of `gallery` and merge the results.
    ///
    /// Fails as a whole if any single call fails. Photos flagged NSFW are
    /// dropped, and a URL already seen earlier in this pass is skipped.
    #[instrument(skip(self))]
    pub async fn load_images(&self, gallery: &str) -> Result<Vec<Photo>> {
        let urls = CATEGORY_GROUPS
            .iter()
            .map(|group| self.query_url(gallery, group))
            .collect::<Result<Vec<_>>>()?;

        let groups = try_join_all(urls.iter().map(|url| self.fetch_group(url))).await?;

        let mut seen = HashSet::new();
        let photos: Vec<Photo> = groups
            .into_iter()
            .flatten()
            .filter(|p| seen.insert(p.url.clone()))
            .collect();

        info!(gallery, count = photos.len(), "Gallery loaded");
        Ok(photos)
    }

    async fn fetch_group(&self, url: &str) -> Result<Vec<Photo>> {
        let body = self.http.get_json(url).await?;
        let response: ApiResponse = serde_json::from_value(body)?;

        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(PssError::SourceError(error));
        }

        let total = response.photos.len();
        let photos: Vec<Photo> = response
            .photos
            .into_iter()
            .filter(|p| p.nsfw != Some(true))
            .filter_map(|p| {
                let url = p.images.into_iter().next()?.url;
                Photo::new(url, p.user.fullname, p.width, p.height, None)
            })
            .collect();

        debug!(total, kept = photos.len(), "Category group fetched");
        Ok(photos)
    }
}

/// One 500px gallery exposed as a photo source.
pub struct Px500Gallery {
    client: Arc<Px500>,
    gallery: String,
}

impl Px500Gallery {
    pub fn new(client: Arc<Px500>, gallery: impl Into<String>) -> Self {
        Self {
            client,
            gallery: gallery.into(),
        }
    }
}

#[async_trait]
impl PhotoSource for Px500Gallery {
    async fn fetch(&self) -> Result<Vec<Photo>> {
        trace!(gallery = %self.gallery, "Fetching 500px gallery");
        self.client.load_images(&self.gallery).await
    }

    fn persistence(&self) -> Persistence {
        Persistence::Merge
    }
}
