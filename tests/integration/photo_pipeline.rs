//! 500px galleries through the cache into the aggregated photo list.

use std::sync::Arc;

use pss::config::{SafeSetter, Settings, SqliteStore};
use pss::messaging::LocalBus;
use pss::photos::http::{CannedResponse, StaticHttp};
use pss::photos::px500::CATEGORY_GROUPS;
use pss::photos::{GalleryCache, PhotoSourceKey, PhotoSources, ProcessOutcome};
use serde_json::{Value, json};

fn api_photo(url: &str, author: &str) -> Value {
    json!({
        "width": 2048,
        "height": 1365,
        "images": [{"url": url}],
        "user": {"fullname": author}
    })
}

fn gallery_http() -> StaticHttp {
    StaticHttp::new()
        .route(
            CATEGORY_GROUPS[0],
            CannedResponse::Json(json!({"photos": [
                api_photo("https://img/1.jpg", "Ada"),
                api_photo("https://img/2.jpg", "Ben"),
            ]})),
        )
        .route(
            CATEGORY_GROUPS[1],
            CannedResponse::Json(json!({"photos": [
                api_photo("https://img/2.jpg", "Ben"),
                {
                    "nsfw": true,
                    "width": 100,
                    "height": 100,
                    "images": [{"url": "https://img/x.jpg"}],
                    "user": {"fullname": "Hidden"}
                },
            ]})),
        )
        .route(
            CATEGORY_GROUPS[2],
            CannedResponse::Json(json!({"photos": [api_photo("https://img/3.jpg", "Cy")]})),
        )
}

fn pipeline(http: StaticHttp) -> (PhotoSources, Settings) {
    let settings = Settings::new(Arc::new(SqliteStore::in_memory().unwrap()));
    settings.initialize(false).unwrap();
    let cache = Arc::new(GalleryCache::new(SafeSetter::new(
        settings.clone(),
        Arc::new(LocalBus::new()),
    )));
    let sources = PhotoSources::new(cache).with_500px(Arc::new(http), "test-key");
    (sources, settings)
}

#[tokio::test]
async fn test_enabled_gallery_is_fetched_and_cached() {
    let (sources, settings) = pipeline(gallery_http());
    settings.set("usePopular500px", Some(&true)).unwrap();

    let outcome = sources.process(PhotoSourceKey::Popular500px).await.unwrap();
    assert_eq!(outcome, ProcessOutcome::Stored { count: 3, stored: true });

    let cached = sources.cache().read("usePopular500px").unwrap().unwrap();
    let urls: Vec<&str> = cached.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, ["https://img/1.jpg", "https://img/2.jpg", "https://img/3.jpg"]);
    assert_eq!(cached[0].author, "Ada");
    assert!((cached[0].asp - 1.5).abs() < 1e-9);

    let stored = settings.get_value("usePopular500pxImages").unwrap().unwrap();
    assert_eq!(stored[0]["asp"], json!("1.50"));
}

#[tokio::test]
async fn test_disabling_gallery_clears_cache() {
    let (sources, settings) = pipeline(gallery_http());
    settings.set("useEditors500px", Some(&true)).unwrap();
    sources.process(PhotoSourceKey::Editors500px).await.unwrap();
    assert!(sources.cache().read("useEditors500px").unwrap().is_some());

    settings.set("useEditors500px", Some(&false)).unwrap();
    let outcome = sources.process(PhotoSourceKey::Editors500px).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::Cleared);
    assert!(sources.cache().read("useEditors500px").unwrap().is_none());
}

#[tokio::test]
async fn test_api_failure_keeps_previous_cache() {
    let (sources, settings) = pipeline(gallery_http());
    settings.set("useYesterday500px", Some(&true)).unwrap();
    sources.process(PhotoSourceKey::Yesterday500px).await.unwrap();

    // Same database, broken API
    let cache = sources.cache().clone();
    let broken_api =
        StaticHttp::new().route(CATEGORY_GROUPS[1], CannedResponse::Fail("timeout".into()));
    let failing = PhotoSources::new(cache).with_500px(Arc::new(broken_api), "test-key");
    let outcome = failing.process(PhotoSourceKey::Yesterday500px).await.unwrap();

    assert!(matches!(outcome, ProcessOutcome::Failed { .. }));
    assert_eq!(failing.cache().read("useYesterday500px").unwrap().unwrap().len(), 3);
}

#[tokio::test]
async fn test_selected_photos_spans_enabled_galleries() {
    let (sources, settings) = pipeline(gallery_http());
    settings.set("usePopular500px", Some(&true)).unwrap();
    settings.set("useEditors500px", Some(&true)).unwrap();
    settings.set("useChromecast", Some(&false)).unwrap();

    for (key, result) in sources.process_all().await {
        let outcome = result.unwrap();
        if key.px500_gallery().is_some() && key != PhotoSourceKey::Yesterday500px {
            assert!(matches!(outcome, ProcessOutcome::Stored { .. }), "{key}");
        }
    }

    // Both galleries serve the same urls; each shows up once
    let selected = sources.selected_photos().unwrap();
    assert_eq!(selected.len(), 3);
}

#[tokio::test]
async fn test_broken_photo_is_dropped_from_cache() {
    let (sources, settings) = pipeline(gallery_http());
    settings.set("usePopular500px", Some(&true)).unwrap();
    sources.process(PhotoSourceKey::Popular500px).await.unwrap();

    sources.cache().mark_broken("usePopular500px", "https://img/2.jpg").unwrap();
    let cached = sources.cache().read("usePopular500px").unwrap().unwrap();

    assert_eq!(cached.len(), 2);
    assert!(cached.iter().all(|p| p.url != "https://img/2.jpg"));
    let stored = settings.get_value("usePopular500pxImages").unwrap().unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 2);
}
