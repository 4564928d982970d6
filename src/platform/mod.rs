//! Platform collaborators.
//!
//! The engine never talks to an operating system directly. Power
//! management, idle detection, the toolbar action, alarms, windows and
//! displays are reached through the traits below so the engine can be
//! driven by a recording mock in tests and by the headless implementation
//! in the CLI.

pub mod headless;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Strength of a keep-awake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerLevel {
    /// Keep the screen on.
    Display,
    /// Keep the system running but let the screen sleep.
    System,
}

pub trait PowerControl: Send + Sync {
    fn request_keep_awake(&self, level: PowerLevel);
    fn release_keep_awake(&self);
}

pub trait IdleMonitor: Send + Sync {
    /// Seconds of inactivity before the system reports idle.
    fn set_detection_interval(&self, seconds: u32);
}

/// Toolbar button, its badge and context menu.
pub trait ActionUi: Send + Sync {
    fn set_badge_text(&self, text: &str);
    fn set_menu_title(&self, menu_id: &str, title: &str);
    fn open_options_page(&self);
}

/// Daily alarms bounding the active time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlarmName {
    ActiveStart,
    ActiveStop,
}

pub trait AlarmScheduler: Send + Sync {
    /// Create (or replace) an alarm firing every day at `at`.
    fn schedule_daily(&self, alarm: AlarmName, at: NaiveTime);
    fn clear(&self, alarm: AlarmName);
}

#[async_trait]
pub trait PlatformInfo: Send + Sync {
    /// Short OS identifier: "win", "mac", "linux", ...
    async fn os(&self) -> Result<String>;
}

/// Source of the local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// Local time from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// A clock stuck at one time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

// === Windows and displays ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// A connected physical display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: String,
    pub bounds: Bounds,
}

impl Display {
    pub fn new(id: impl Into<String>, left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            bounds: Bounds {
                left,
                top,
                width,
                height,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    Normal,
    Popup,
}

/// An existing top-level window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: u64,
    pub state: WindowState,
    pub left: i32,
    pub top: i32,
}

/// Window creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub focused: bool,
    #[serde(rename = "type")]
    pub kind: WindowType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<WindowState>,
}

#[async_trait]
pub trait WindowProvider: Send + Sync {
    /// Host capability version; 44 and newer can create a window directly
    /// in full-screen state.
    fn capability_version(&self) -> u32;

    async fn all_windows(&self) -> Result<Vec<WindowInfo>>;

    /// Create a window; resolves once the window exists.
    async fn create(&self, spec: WindowSpec) -> Result<WindowInfo>;

    async fn set_state(&self, id: u64, state: WindowState) -> Result<()>;
}

#[async_trait]
pub trait DisplayProvider: Send + Sync {
    async fn displays(&self) -> Result<Vec<Display>>;
}

/// Handles to every platform collaborator.
#[derive(Clone)]
pub struct Platform {
    pub power: Arc<dyn PowerControl>,
    pub idle: Arc<dyn IdleMonitor>,
    pub ui: Arc<dyn ActionUi>,
    pub alarms: Arc<dyn AlarmScheduler>,
    pub info: Arc<dyn PlatformInfo>,
    pub windows: Arc<dyn WindowProvider>,
    pub displays: Arc<dyn DisplayProvider>,
    pub clock: Arc<dyn Clock>,
}

impl Platform {
    /// Use one object for every collaborator.
    pub fn from_shared<P>(p: &Arc<P>) -> Self
    where
        P: PowerControl
            + IdleMonitor
            + ActionUi
            + AlarmScheduler
            + PlatformInfo
            + WindowProvider
            + DisplayProvider
            + Clock
            + 'static,
    {
        Self {
            power: p.clone(),
            idle: p.clone(),
            ui: p.clone(),
            alarms: p.clone(),
            info: p.clone(),
            windows: p.clone(),
            displays: p.clone(),
            clock: p.clone(),
        }
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
