//! HTTP GET capability for photo sources.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{PssError, Result};

/// Fetch a URL and parse the body as JSON.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value>;
}

/// Production client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pss/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PssError::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpGet for ReqwestClient {
    #[instrument(skip(self))]
    async fn get_json(&self, url: &str) -> Result<Value> {
        let fetch_err = |e: reqwest::Error| PssError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_err)?;
        debug!(status = %response.status(), "Photo API responded");
        response.json::<Value>().await.map_err(fetch_err)
    }
}

/// Canned response for [`StaticHttp`].
#[derive(Debug, Clone)]
pub enum CannedResponse {
    Json(Value),
    Fail(String),
}

/// In-memory HTTP stand-in for tests.
///
/// A request is answered by the first route whose needle equals one of the
/// URL's decoded query values, or appears verbatim in the URL.
#[derive(Debug, Default)]
pub struct StaticHttp {
    routes: Vec<(String, CannedResponse)>,
    requests: Mutex<Vec<String>>,
}

impl StaticHttp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, needle: &str, response: CannedResponse) -> Self {
        self.routes.push((needle.to_string(), response));
        self
    }

    /// URLs requested so far, in issue order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn matches(url: &str, needle: &str) -> bool {
        if url.contains(needle) {
            return true;
        }
        reqwest::Url::parse(url).is_ok_and(|u| u.query_pairs().any(|(_, v)| v == needle))
    }
}

#[async_trait]
impl HttpGet for StaticHttp {
    async fn get_json(&self, url: &str) -> Result<Value> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        // Let every sibling request get issued before any answer arrives
        tokio::task::yield_now().await;

        let route = self
            .routes
            .iter()
            .find(|(needle, _)| Self::matches(url, needle))
            .map(|(_, r)| r.clone());
        match route {
            Some(CannedResponse::Json(v)) => Ok(v),
            Some(CannedResponse::Fail(reason)) => Err(PssError::Fetch {
                url: url.to_string(),
                reason,
            }),
            None => Err(PssError::Fetch {
                url: url.to_string(),
                reason: "no route".to_string(),
            }),
        }
    }
}
