//! Active time window, keep-awake policy and badge text.

use chrono::NaiveTime;
use serde::Serialize;
use tracing::debug;

use crate::config::Settings;
use crate::config::defaults::key;
use crate::error::{PssError, Result};
use crate::platform::{AlarmName, Platform, PowerLevel};

/// Daily window during which the display should stay awake.
///
/// A window whose start equals its stop is disabled and counts as always
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveWindow {
    pub start: NaiveTime,
    pub stop: NaiveTime,
}

impl ActiveWindow {
    /// Read `activeStart` / `activeStop`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            start: read_time(settings, key::ACTIVE_START)?,
            stop: read_time(settings, key::ACTIVE_STOP)?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.start != self.stop
    }

    /// True if `now` falls inside the window. Windows may wrap midnight.
    pub fn contains(&self, now: NaiveTime) -> bool {
        if !self.is_enabled() {
            return true;
        }
        if self.start < self.stop {
            self.start <= now && now < self.stop
        } else {
            now >= self.start || now < self.stop
        }
    }
}

/// Parse a stored "HH:MM" value; a missing value means midnight.
fn read_time(settings: &Settings, key: &str) -> Result<NaiveTime> {
    match settings.get_string(key)? {
        None => Ok(NaiveTime::MIN),
        Some(text) => NaiveTime::parse_from_str(&text, "%H:%M").map_err(|e| PssError::ValueParse {
            key: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Create or clear the daily alarms that bound the active window.
pub fn update_repeating_alarms(settings: &Settings, platform: &Platform) -> Result<()> {
    let window = ActiveWindow::from_settings(settings)?;
    if settings.get_bool(key::KEEP_AWAKE)? && window.is_enabled() {
        platform.alarms.schedule_daily(AlarmName::ActiveStart, window.start);
        platform.alarms.schedule_daily(AlarmName::ActiveStop, window.stop);
    } else {
        platform.alarms.clear(AlarmName::ActiveStart);
        platform.alarms.clear(AlarmName::ActiveStop);
    }
    Ok(())
}

/// Issue or release the keep-awake request for the current time.
pub fn apply_power_state(settings: &Settings, platform: &Platform) -> Result<()> {
    if !settings.get_bool(key::KEEP_AWAKE)? {
        platform.power.release_keep_awake();
        return Ok(());
    }

    let window = ActiveWindow::from_settings(settings)?;
    let now = platform.clock.now();
    if window.contains(now) {
        platform.power.request_keep_awake(PowerLevel::Display);
    } else if settings.get_bool(key::ALLOW_SUSPEND)? {
        platform.power.release_keep_awake();
    } else {
        platform.power.request_keep_awake(PowerLevel::System);
    }
    Ok(())
}

/// True if the screensaver may show now: enabled, and inside the active
/// window when keep-awake scheduling is on.
pub fn is_active(settings: &Settings, now: NaiveTime) -> Result<bool> {
    if !settings.get_bool(key::ENABLED)? {
        return Ok(false);
    }
    if !settings.get_bool(key::KEEP_AWAKE)? {
        return Ok(true);
    }
    Ok(ActiveWindow::from_settings(settings)?.contains(now))
}

/// Badge shown on the toolbar button.
pub fn badge_text(settings: &Settings, now: NaiveTime) -> Result<&'static str> {
    let keep_awake = settings.get_bool(key::KEEP_AWAKE)?;
    let text = if settings.get_bool(key::ENABLED)? {
        let window = ActiveWindow::from_settings(settings)?;
        if keep_awake && !window.contains(now) { "SLP" } else { "" }
    } else if keep_awake {
        "PWR"
    } else {
        "OFF"
    };
    Ok(text)
}

pub fn update_badge_text(settings: &Settings, platform: &Platform) -> Result<()> {
    let text = badge_text(settings, platform.clock.now())?;
    debug!(text, "Updating badge");
    platform.ui.set_badge_text(text);
    Ok(())
}
