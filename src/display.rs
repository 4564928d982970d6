//! Opening and closing slideshow windows.
//!
//! A window is never opened over a display that already shows a full-screen
//! window. Hosts that cannot create a window directly in full-screen state
//! get a 1x1 popup at the display origin which is switched to full screen
//! once it exists; the popup is briefly visible in between.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::Settings;
use crate::config::defaults::key;
use crate::error::Result;
use crate::messaging::{Message, MessageBus};
use crate::platform::{Display, Platform, WindowSpec, WindowState, WindowType};

/// Page loaded into every slideshow window.
pub const SCREENSAVER_URL: &str = "/html/screensaver.html";

/// First host capability version that accepts a full-screen state on create.
pub const FULLSCREEN_ON_CREATE_VERSION: u32 = 44;

/// Where a newly opened window is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPhase {
    /// Created as a small popup, not yet full screen.
    Created,
    Fullscreen,
}

/// What happened on one target. `display` is `None` for the default target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Placement {
    Opened {
        display: Option<String>,
        window: u64,
        phase: WindowPhase,
    },
    /// A full-screen window already covers the target.
    Skipped { display: Option<String> },
    Failed {
        display: Option<String>,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlacementReport {
    pub placements: Vec<Placement>,
}

impl PlacementReport {
    pub fn opened(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| matches!(p, Placement::Opened { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| matches!(p, Placement::Skipped { .. }))
            .count()
    }
}

pub struct DisplayPlacer {
    settings: Settings,
    platform: Platform,
    bus: Arc<dyn MessageBus>,
}

impl DisplayPlacer {
    pub fn new(settings: Settings, platform: Platform, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            settings,
            platform,
            bus,
        }
    }

    /// Show the screensaver, on every display when `allDisplays` is set and
    /// `single` is false.
    ///
    /// Displays are handled concurrently; the call resolves once every
    /// target has settled, while a window creation that never completes
    /// only holds up its own display.
    #[instrument(skip(self))]
    pub async fn display_screensaver(&self, single: bool) -> Result<PlacementReport> {
        let targets: Vec<Option<Display>> =
            if !single && self.settings.get_bool(key::ALL_DISPLAYS)? {
                let displays = self.platform.displays.displays().await?;
                if displays.len() == 1 {
                    vec![None]
                } else {
                    displays.into_iter().map(Some).collect()
                }
            } else {
                vec![None]
            };
        debug!(targets = targets.len(), "Placing screensaver windows");

        let placements = join_all(targets.iter().map(|t| self.open_on(t.as_ref()))).await;
        Ok(PlacementReport { placements })
    }

    async fn open_on(&self, display: Option<&Display>) -> Placement {
        let id = display.map(|d| d.id.clone());
        match self.try_open(display).await {
            Ok(Some((window, phase))) => Placement::Opened {
                display: id,
                window,
                phase,
            },
            Ok(None) => {
                info!(display = ?id, "Full-screen window present, not opening");
                Placement::Skipped { display: id }
            }
            Err(e) => {
                warn!(display = ?id, error = %e, "Could not open screensaver window");
                Placement::Failed {
                    display: id,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_open(&self, display: Option<&Display>) -> Result<Option<(u64, WindowPhase)>> {
        if self.has_fullscreen(display).await? {
            return Ok(None);
        }

        let windows = &self.platform.windows;
        if display.is_none() && windows.capability_version() >= FULLSCREEN_ON_CREATE_VERSION {
            let win = windows
                .create(WindowSpec {
                    url: SCREENSAVER_URL.to_string(),
                    left: None,
                    top: None,
                    width: None,
                    height: None,
                    focused: true,
                    kind: WindowType::Popup,
                    state: Some(WindowState::Fullscreen),
                })
                .await?;
            return Ok(Some((win.id, WindowPhase::Fullscreen)));
        }

        let (left, top) = display.map_or((0, 0), |d| (d.bounds.left, d.bounds.top));
        let win = windows
            .create(WindowSpec {
                url: SCREENSAVER_URL.to_string(),
                left: Some(left),
                top: Some(top),
                width: Some(1),
                height: Some(1),
                focused: true,
                kind: WindowType::Popup,
                state: None,
            })
            .await?;
        debug!(id = win.id, phase = ?WindowPhase::Created, left, top, "Popup created");

        windows.set_state(win.id, WindowState::Fullscreen).await?;
        Ok(Some((win.id, WindowPhase::Fullscreen)))
    }

    /// True if a full-screen window is anchored at the display's origin, or
    /// anywhere when no display is given. Always false when
    /// `chromeFullscreen` is off.
    pub async fn has_fullscreen(&self, display: Option<&Display>) -> Result<bool> {
        if !self.settings.get_bool(key::CHROME_FULLSCREEN)? {
            return Ok(false);
        }
        let windows = self.platform.windows.all_windows().await?;
        Ok(windows.iter().any(|w| {
            w.state == WindowState::Fullscreen
                && display.is_none_or(|d| w.left == d.bounds.left && w.top == d.bounds.top)
        }))
    }

    /// Ask every slideshow window to close.
    pub fn close_all(&self) {
        self.bus.notify(Message::Close);
    }

    /// True if any slideshow window answers the liveness probe.
    pub async fn is_showing(&self) -> bool {
        self.bus.request(Message::IsShowing).await.is_response()
    }
}
