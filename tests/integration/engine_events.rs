//! Host events driving the whole engine against the mock platform.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use pss::background::{Background, IdleState};
use pss::config::{SafeSetter, Settings, SqliteStore};
use pss::dispatch::ENABLE_MENU_ID;
use pss::messaging::{LocalBus, Message, MessageBus};
use pss::photos::{GalleryCache, PhotoSources};
use pss::platform::mock::{MockPlatform, Operation};
use pss::platform::{AlarmName, Display, Platform, PowerLevel};

struct Engine {
    background: Background,
    mock: Arc<MockPlatform>,
    bus: LocalBus,
}

fn engine(mock: MockPlatform) -> Engine {
    let mock = Arc::new(mock);
    let settings = Settings::new(Arc::new(SqliteStore::in_memory().unwrap()));
    let bus = LocalBus::new().with_wait(Duration::from_millis(20));
    let shared: Arc<dyn MessageBus> = Arc::new(bus.clone());
    let cache = Arc::new(GalleryCache::new(SafeSetter::new(settings.clone(), shared.clone())));
    let background = Background::new(
        settings,
        Platform::from_shared(&mock),
        Arc::new(PhotoSources::new(cache)),
        shared,
    );
    Engine { background, mock, bus }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

#[tokio::test]
async fn test_install_applies_every_setting() {
    let e = engine(MockPlatform::new().with_os("mac"));
    e.background.on_installed(false).await.unwrap();

    assert_eq!(e.mock.idle_interval(), Some(300));
    assert_eq!(e.mock.menu_title(ENABLE_MENU_ID).as_deref(), Some("Disable"));
    assert_eq!(e.mock.badge().as_deref(), Some(""));
    assert_eq!(e.mock.keep_awake(), None);
    assert!(e.mock.alarms().is_empty());
    assert_eq!(e.background.settings().get_string("os").unwrap().as_deref(), Some("mac"));
}

#[tokio::test]
async fn test_startup_does_not_requery_os() {
    let e = engine(MockPlatform::new());
    e.background.on_installed(false).await.unwrap();
    e.mock.clear_operations();

    e.background.on_startup().await.unwrap();

    assert_eq!(e.mock.count(|op| *op == Operation::QueryOs), 0);
    e.mock.assert_contains(&Operation::SetIdleInterval { seconds: 300 });
}

#[tokio::test]
async fn test_keep_awake_schedule() {
    let e = engine(MockPlatform::new());
    e.background.on_installed(false).await.unwrap();
    let settings = e.background.settings();
    settings.set("activeStart", Some("08:00")).unwrap();
    settings.set("activeStop", Some("18:00")).unwrap();
    settings.set("keepAwake", Some(&true)).unwrap();

    e.background.on_setting_changed("keepAwake").await.unwrap();

    assert_eq!(e.mock.keep_awake(), Some(PowerLevel::Display));
    let alarms = e.mock.alarms();
    assert_eq!(alarms.get(&AlarmName::ActiveStart), Some(&hm(8, 0)));
    assert_eq!(alarms.get(&AlarmName::ActiveStop), Some(&hm(18, 0)));
    assert_eq!(e.mock.badge().as_deref(), Some(""));

    // Evening: outside the window, suspend not allowed
    e.mock.set_time(19, 30);
    e.background.on_alarm(AlarmName::ActiveStop).await.unwrap();
    assert_eq!(e.mock.keep_awake(), Some(PowerLevel::System));
    assert_eq!(e.mock.badge().as_deref(), Some("SLP"));

    settings.set("allowSuspend", Some(&true)).unwrap();
    e.background.on_setting_changed("allowSuspend").await.unwrap();
    assert_eq!(e.mock.keep_awake(), None);
}

#[tokio::test]
async fn test_idle_opens_and_active_closes() {
    let e = engine(MockPlatform::new());
    e.background.on_installed(false).await.unwrap();
    let mut rx = e.bus.subscribe();

    let report = e.background.on_idle_state(IdleState::Idle).await.unwrap().unwrap();
    assert_eq!(report.opened(), 1);

    // Nobody answers the showing check, but the full-screen window blocks a second one
    let report = e.background.on_idle_state(IdleState::Locked).await.unwrap().unwrap();
    assert_eq!(report.skipped(), 1);
    assert_eq!(e.mock.created_windows().len(), 1);

    e.background.on_idle_state(IdleState::Active).await.unwrap();
    let mut saw_close = false;
    while let Ok(envelope) = rx.try_recv() {
        saw_close |= envelope.message == Message::Close;
    }
    assert!(saw_close);
}

#[tokio::test]
async fn test_idle_outside_active_window_stays_hidden() {
    let e = engine(MockPlatform::new());
    e.background.on_installed(false).await.unwrap();
    let settings = e.background.settings();
    settings.set("keepAwake", Some(&true)).unwrap();
    settings.set("activeStart", Some("22:00")).unwrap();
    settings.set("activeStop", Some("06:00")).unwrap();

    let report = e.background.on_idle_state(IdleState::Idle).await.unwrap();

    assert!(report.is_none());
    assert!(e.mock.created_windows().is_empty());
}

#[tokio::test]
async fn test_toggle_disables_screensaver() {
    let e = engine(MockPlatform::new());
    e.background.on_installed(false).await.unwrap();

    assert!(!e.background.dispatcher().toggle_enabled().unwrap());
    assert_eq!(e.mock.menu_title(ENABLE_MENU_ID).as_deref(), Some("Enable"));
    assert_eq!(e.mock.badge().as_deref(), Some("OFF"));

    let report = e.background.on_idle_state(IdleState::Idle).await.unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn test_all_displays_get_a_window() {
    let e = engine(MockPlatform::new().with_displays(vec![
        Display::new("left", 0, 0, 1920, 1080),
        Display::new("right", 1920, 0, 2560, 1440),
    ]));
    e.background.on_installed(false).await.unwrap();
    e.background.settings().set("allDisplays", Some(&true)).unwrap();

    let report = e.background.on_idle_state(IdleState::Idle).await.unwrap().unwrap();

    assert_eq!(report.opened(), 2);
    let origins: Vec<(Option<i32>, Option<i32>)> = e
        .mock
        .created_windows()
        .iter()
        .map(|spec| (spec.left, spec.top))
        .collect();
    assert!(origins.contains(&(Some(0), Some(0))));
    assert!(origins.contains(&(Some(1920), Some(0))));
}

#[tokio::test]
async fn test_options_tab_opened_without_listener() {
    let e = engine(MockPlatform::new());
    e.background.dispatcher().show_options_tab().await;
    assert_eq!(e.mock.options_opened(), 1);
}
