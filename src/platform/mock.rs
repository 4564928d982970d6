//! Recording platform for tests.
//!
//! Every call is appended to an operation log, and the effective state
//! (keep-awake level, idle interval, badge, alarms, windows) is tracked so
//! tests can assert either the exact sequence or the end result.
//!
//! ```rust,ignore
//! let mock = Arc::new(MockPlatform::new());
//! let platform = Platform::from_shared(&mock);
//! // drive the engine ...
//! mock.assert_contains(&Operation::SetIdleInterval { seconds: 300 });
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveTime;
use tracing::trace;

use super::{
    ActionUi, AlarmName, AlarmScheduler, Clock, Display, DisplayProvider, IdleMonitor,
    PlatformInfo, PowerControl, PowerLevel, WindowInfo, WindowProvider, WindowSpec, WindowState,
};
use crate::error::{PssError, Result};

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    RequestKeepAwake { level: PowerLevel },
    ReleaseKeepAwake,
    SetIdleInterval { seconds: u32 },
    SetBadgeText { text: String },
    SetMenuTitle { menu_id: String, title: String },
    OpenOptionsPage,
    ScheduleAlarm { alarm: AlarmName, at: NaiveTime },
    ClearAlarm { alarm: AlarmName },
    QueryOs,
    CreateWindow { spec: WindowSpec },
    SetWindowState { id: u64, state: WindowState },
}

/// Mock platform recording every call.
pub struct MockPlatform {
    log: Mutex<Vec<Operation>>,
    keep_awake: Mutex<Option<PowerLevel>>,
    idle_interval: Mutex<Option<u32>>,
    badge: Mutex<Option<String>>,
    menu_titles: Mutex<BTreeMap<String, String>>,
    alarms: Mutex<BTreeMap<AlarmName, NaiveTime>>,
    windows: Mutex<Vec<WindowInfo>>,
    displays: Mutex<Vec<Display>>,
    stalled_origins: Mutex<HashSet<(i32, i32)>>,
    fail_window_ops: Mutex<bool>,
    options_opened: AtomicUsize,
    next_window_id: AtomicU64,
    capability_version: AtomicU32,
    now: Mutex<NaiveTime>,
    os: String,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// A single 1920x1080 display, modern host, clock at noon, OS "linux".
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            keep_awake: Mutex::new(None),
            idle_interval: Mutex::new(None),
            badge: Mutex::new(None),
            menu_titles: Mutex::new(BTreeMap::new()),
            alarms: Mutex::new(BTreeMap::new()),
            windows: Mutex::new(Vec::new()),
            displays: Mutex::new(vec![Display::new("0", 0, 0, 1920, 1080)]),
            stalled_origins: Mutex::new(HashSet::new()),
            fail_window_ops: Mutex::new(false),
            options_opened: AtomicUsize::new(0),
            next_window_id: AtomicU64::new(1),
            capability_version: AtomicU32::new(120),
            now: Mutex::new(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()),
            os: "linux".to_string(),
        }
    }

    // === Configuration ===

    #[must_use]
    pub fn with_displays(self, displays: Vec<Display>) -> Self {
        *self.displays.lock().unwrap() = displays;
        self
    }

    #[must_use]
    pub fn with_capability_version(self, version: u32) -> Self {
        self.capability_version.store(version, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn with_os(mut self, os: &str) -> Self {
        self.os = os.to_string();
        self
    }

    /// Add an existing window (not recorded as an operation).
    pub fn add_window(&self, state: WindowState, left: i32, top: i32) -> u64 {
        let id = self.next_window_id.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().unwrap().push(WindowInfo {
            id,
            state,
            left,
            top,
        });
        id
    }

    /// Window creation at this origin never completes.
    pub fn stall_creates_at(&self, left: i32, top: i32) {
        self.stalled_origins.lock().unwrap().insert((left, top));
    }

    /// Make window queries and creation fail.
    pub fn fail_window_ops(&self) {
        *self.fail_window_ops.lock().unwrap() = true;
    }

    pub fn set_time(&self, hour: u32, minute: u32) {
        if let Some(t) = NaiveTime::from_hms_opt(hour, minute, 0) {
            *self.now.lock().unwrap() = t;
        }
    }

    // === Assertions ===

    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_operations(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Assert no operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if any operations were recorded.
    pub fn assert_no_operations(&self) {
        let ops = self.operations();
        assert!(ops.is_empty(), "Expected no operations, but found: {ops:#?}");
    }

    #[must_use]
    pub fn count(&self, pred: impl Fn(&Operation) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|op| pred(op)).count()
    }

    /// Windows created through [`WindowProvider::create`].
    #[must_use]
    pub fn created_windows(&self) -> Vec<WindowSpec> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                Operation::CreateWindow { spec } => Some(spec.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn windows(&self) -> Vec<WindowInfo> {
        self.windows.lock().unwrap().clone()
    }

    #[must_use]
    pub fn keep_awake(&self) -> Option<PowerLevel> {
        *self.keep_awake.lock().unwrap()
    }

    #[must_use]
    pub fn idle_interval(&self) -> Option<u32> {
        *self.idle_interval.lock().unwrap()
    }

    #[must_use]
    pub fn badge(&self) -> Option<String> {
        self.badge.lock().unwrap().clone()
    }

    #[must_use]
    pub fn menu_title(&self, menu_id: &str) -> Option<String> {
        self.menu_titles.lock().unwrap().get(menu_id).cloned()
    }

    #[must_use]
    pub fn alarms(&self) -> BTreeMap<AlarmName, NaiveTime> {
        self.alarms.lock().unwrap().clone()
    }

    #[must_use]
    pub fn options_opened(&self) -> usize {
        self.options_opened.load(Ordering::SeqCst)
    }

    // === Internal Helpers ===

    fn record(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.log.lock().unwrap().push(op);
    }

    fn check_windows(&self) -> Result<()> {
        if *self.fail_window_ops.lock().unwrap() {
            return Err(PssError::Window("mock window failure".to_string()));
        }
        Ok(())
    }
}

impl PowerControl for MockPlatform {
    fn request_keep_awake(&self, level: PowerLevel) {
        self.record(Operation::RequestKeepAwake { level });
        *self.keep_awake.lock().unwrap() = Some(level);
    }

    fn release_keep_awake(&self) {
        self.record(Operation::ReleaseKeepAwake);
        *self.keep_awake.lock().unwrap() = None;
    }
}

impl IdleMonitor for MockPlatform {
    fn set_detection_interval(&self, seconds: u32) {
        self.record(Operation::SetIdleInterval { seconds });
        *self.idle_interval.lock().unwrap() = Some(seconds);
    }
}

impl ActionUi for MockPlatform {
    fn set_badge_text(&self, text: &str) {
        self.record(Operation::SetBadgeText {
            text: text.to_string(),
        });
        *self.badge.lock().unwrap() = Some(text.to_string());
    }

    fn set_menu_title(&self, menu_id: &str, title: &str) {
        self.record(Operation::SetMenuTitle {
            menu_id: menu_id.to_string(),
            title: title.to_string(),
        });
        self.menu_titles
            .lock()
            .unwrap()
            .insert(menu_id.to_string(), title.to_string());
    }

    fn open_options_page(&self) {
        self.record(Operation::OpenOptionsPage);
        self.options_opened.fetch_add(1, Ordering::SeqCst);
    }
}

impl AlarmScheduler for MockPlatform {
    fn schedule_daily(&self, alarm: AlarmName, at: NaiveTime) {
        self.record(Operation::ScheduleAlarm { alarm, at });
        self.alarms.lock().unwrap().insert(alarm, at);
    }

    fn clear(&self, alarm: AlarmName) {
        self.record(Operation::ClearAlarm { alarm });
        self.alarms.lock().unwrap().remove(&alarm);
    }
}

#[async_trait]
impl PlatformInfo for MockPlatform {
    async fn os(&self) -> Result<String> {
        self.record(Operation::QueryOs);
        Ok(self.os.clone())
    }
}

impl Clock for MockPlatform {
    fn now(&self) -> NaiveTime {
        *self.now.lock().unwrap()
    }
}

#[async_trait]
impl WindowProvider for MockPlatform {
    fn capability_version(&self) -> u32 {
        self.capability_version.load(Ordering::SeqCst)
    }

    async fn all_windows(&self) -> Result<Vec<WindowInfo>> {
        self.check_windows()?;
        Ok(self.windows())
    }

    async fn create(&self, spec: WindowSpec) -> Result<WindowInfo> {
        self.check_windows()?;
        self.record(Operation::CreateWindow { spec: spec.clone() });

        let origin = (spec.left.unwrap_or(0), spec.top.unwrap_or(0));
        let stalled = self.stalled_origins.lock().unwrap().contains(&origin);
        if stalled {
            return std::future::pending().await;
        }

        let info = WindowInfo {
            id: self.next_window_id.fetch_add(1, Ordering::SeqCst),
            state: spec.state.unwrap_or(WindowState::Normal),
            left: origin.0,
            top: origin.1,
        };
        self.windows.lock().unwrap().push(info.clone());
        Ok(info)
    }

    async fn set_state(&self, id: u64, state: WindowState) -> Result<()> {
        self.check_windows()?;
        self.record(Operation::SetWindowState { id, state });
        let mut windows = self.windows.lock().unwrap();
        match windows.iter_mut().find(|w| w.id == id) {
            Some(w) => {
                w.state = state;
                Ok(())
            }
            None => Err(PssError::Window(format!("no window {id}"))),
        }
    }
}

#[async_trait]
impl DisplayProvider for MockPlatform {
    async fn displays(&self) -> Result<Vec<Display>> {
        Ok(self.displays.lock().unwrap().clone())
    }
}
