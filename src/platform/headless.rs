//! Platform used by the CLI when no desktop host is attached.
//!
//! Requests are logged rather than executed; window bookkeeping is kept in
//! memory for the lifetime of the process so the placement protocol can
//! still be observed end to end.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveTime;
use tracing::info;

use super::{
    ActionUi, AlarmName, AlarmScheduler, Clock, Display, DisplayProvider, IdleMonitor,
    PlatformInfo, PowerControl, PowerLevel, SystemClock, WindowInfo, WindowProvider, WindowSpec,
    WindowState,
};
use crate::error::{PssError, Result};

/// Logging platform with one primary display.
pub struct HeadlessPlatform {
    displays: Vec<Display>,
    windows: Mutex<Vec<WindowInfo>>,
    next_id: AtomicU64,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            displays: vec![Display::new("primary", 0, 0, 1920, 1080)],
            windows: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn with_displays(mut self, displays: Vec<Display>) -> Self {
        self.displays = displays;
        self
    }

    /// Windows opened so far.
    pub fn opened(&self) -> Vec<WindowInfo> {
        self.windows.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

/// OS identifier in the host's vocabulary.
pub fn host_os_name() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win",
        "macos" => "mac",
        "android" => "android",
        "openbsd" => "openbsd",
        _ => "linux",
    }
}

impl PowerControl for HeadlessPlatform {
    fn request_keep_awake(&self, level: PowerLevel) {
        info!(?level, "Keep-awake requested");
    }

    fn release_keep_awake(&self) {
        info!("Keep-awake released");
    }
}

impl IdleMonitor for HeadlessPlatform {
    fn set_detection_interval(&self, seconds: u32) {
        info!(seconds, "Idle detection interval set");
    }
}

impl ActionUi for HeadlessPlatform {
    fn set_badge_text(&self, text: &str) {
        info!(text, "Badge text");
    }

    fn set_menu_title(&self, menu_id: &str, title: &str) {
        info!(menu_id, title, "Menu title");
    }

    fn open_options_page(&self) {
        info!("Options page requested");
    }
}

impl AlarmScheduler for HeadlessPlatform {
    fn schedule_daily(&self, alarm: AlarmName, at: NaiveTime) {
        info!(?alarm, %at, "Daily alarm scheduled");
    }

    fn clear(&self, alarm: AlarmName) {
        info!(?alarm, "Alarm cleared");
    }
}

#[async_trait]
impl PlatformInfo for HeadlessPlatform {
    async fn os(&self) -> Result<String> {
        Ok(host_os_name().to_string())
    }
}

impl Clock for HeadlessPlatform {
    fn now(&self) -> NaiveTime {
        SystemClock.now()
    }
}

#[async_trait]
impl WindowProvider for HeadlessPlatform {
    fn capability_version(&self) -> u32 {
        u32::MAX
    }

    async fn all_windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(self.opened())
    }

    async fn create(&self, spec: WindowSpec) -> Result<WindowInfo> {
        let info = WindowInfo {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            state: spec.state.unwrap_or(WindowState::Normal),
            left: spec.left.unwrap_or(0),
            top: spec.top.unwrap_or(0),
        };
        info!(id = info.id, url = %spec.url, state = ?info.state, "Window opened");
        self.windows
            .lock()
            .map_err(|_| PssError::Window("window list lock poisoned".to_string()))?
            .push(info.clone());
        Ok(info)
    }

    async fn set_state(&self, id: u64, state: WindowState) -> Result<()> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| PssError::Window("window list lock poisoned".to_string()))?;
        let win = windows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| PssError::Window(format!("no window {id}")))?;
        win.state = state;
        info!(id, ?state, "Window state changed");
        Ok(())
    }
}

#[async_trait]
impl DisplayProvider for HeadlessPlatform {
    async fn displays(&self) -> Result<Vec<Display>> {
        Ok(self.displays.clone())
    }
}
