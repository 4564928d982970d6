//! Settings on the SQLite store: initialization, migration and quota.

use std::sync::Arc;

use pss::config::defaults::{CURRENT_VERSION, DEFAULTS};
use pss::config::{KeyValueStore, SafeSetter, Settings, SqliteStore};
use pss::messaging::{LocalBus, Message, MessageBus};
use serde_json::json;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open(dir.path().join("settings.db")).unwrap())
}

#[test]
fn test_initialize_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    Settings::new(open(&dir)).initialize(false).unwrap();

    let reopened = Settings::new(open(&dir));
    assert_eq!(reopened.get_int("version").unwrap(), Some(CURRENT_VERSION));
    for (key, raw) in DEFAULTS {
        assert_eq!(
            reopened.store().get_raw(key).unwrap().as_deref(),
            Some(*raw),
            "default for {key}"
        );
    }
}

#[test]
fn test_user_values_survive_upgrade() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.set_raw("version", "7").unwrap();
    store.set_raw("idleTime", "12").unwrap();
    store.set_raw("keepAwake", "true").unwrap();
    store.set_raw("use500px", "true").unwrap();

    let settings = Settings::new(store.clone());
    settings.initialize(false).unwrap();

    assert_eq!(
        settings.get_value("idleTime").unwrap(),
        Some(json!({"base": 12, "display": 12, "unit": 0}))
    );
    assert_eq!(settings.idle_seconds().unwrap(), 720);
    assert!(settings.get_bool("keepAwake").unwrap());
    assert!(!settings.contains("use500px").unwrap());
    assert_eq!(settings.get_int("version").unwrap(), Some(CURRENT_VERSION));
}

#[test]
fn test_restore_defaults_keeps_account_data() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::new(open(&dir));
    settings.initialize(false).unwrap();
    settings.set("useGoogle", Some(&false)).unwrap();
    settings.set("albumSelections", Some(&json!([{"id": "a1"}]))).unwrap();
    settings.set("os", Some("win")).unwrap();
    settings.set("allDisplays", Some(&true)).unwrap();

    settings.initialize(true).unwrap();

    assert!(!settings.get_bool("useGoogle").unwrap());
    assert_eq!(settings.get_value("albumSelections").unwrap(), Some(json!([{"id": "a1"}])));
    assert_eq!(settings.get_string("os").unwrap().as_deref(), Some("win"));
    assert!(!settings.get_bool("allDisplays").unwrap());
}

#[tokio::test]
async fn test_safe_set_over_quota_rolls_back() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(
        SqliteStore::open(dir.path().join("settings.db"))
            .unwrap()
            .with_quota(Some(256)),
    );
    let settings = Settings::new(store);
    let bus = LocalBus::new();
    let mut rx = bus.subscribe();
    let setter = SafeSetter::new(settings.clone(), Arc::new(bus.clone()) as Arc<dyn MessageBus>);

    let small = json!([{"url": "https://a/1.jpg"}]);
    assert!(setter.safe_set("useEditors500pxImages", &small, Some("useEditors500px")));

    let big = "x".repeat(1024);
    assert!(!setter.safe_set("useEditors500pxImages", &big, Some("useEditors500px")));

    assert_eq!(settings.get_value("useEditors500pxImages").unwrap(), Some(small));
    assert!(settings.get_bool("useEditors500px").unwrap());

    let envelope = rx.try_recv().unwrap();
    assert_eq!(
        envelope.message,
        Message::StorageExceeded {
            name: Some("useEditors500px".to_string())
        }
    );
}

#[test]
fn test_safe_set_new_key_over_quota_leaves_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(
        SqliteStore::open(dir.path().join("settings.db"))
            .unwrap()
            .with_quota(Some(128)),
    );
    let settings = Settings::new(store);
    let setter = SafeSetter::new(settings.clone(), Arc::new(LocalBus::new()));

    assert!(!setter.safe_set("usePopular500pxImages", &"y".repeat(512), Some("usePopular500px")));
    assert!(!settings.contains("usePopular500pxImages").unwrap());
    assert!(!settings.get_bool("usePopular500px").unwrap());
}
