//! Re-applies the runtime effect of a changed setting.
//!
//! Setting keys form a closed set. Each maps to one [`Effect`] or, for the
//! `use*` photo source keys, to a refresh of that source. Every effect
//! writes absolute state, so dispatching the same key twice leaves the
//! platform exactly as dispatching it once.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};

use crate::config::Settings;
use crate::config::defaults::key;
use crate::error::{PssError, Result};
use crate::messaging::{Message, MessageBus, Reply};
use crate::photos::{PhotoSourceKey, PhotoSources};
use crate::platform::Platform;
use crate::schedule;

/// Context menu entry that toggles the screensaver.
pub const ENABLE_MENU_ID: &str = "ENABLE_MENU";

/// Pseudo-key that re-applies every effect.
pub const ALL_KEYS: &str = "all";

/// Setting keys with a runtime effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Enabled,
    KeepAwake,
    ActiveStart,
    ActiveStop,
    AllowSuspend,
    IdleTime,
    PhotoSource(PhotoSourceKey),
}

impl SettingKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => key::ENABLED,
            Self::KeepAwake => key::KEEP_AWAKE,
            Self::ActiveStart => key::ACTIVE_START,
            Self::ActiveStop => key::ACTIVE_STOP,
            Self::AllowSuspend => key::ALLOW_SUSPEND,
            Self::IdleTime => key::IDLE_TIME,
            Self::PhotoSource(k) => k.as_str(),
        }
    }

    /// Effect to re-apply; `None` for photo sources, which refresh instead.
    pub const fn effect(self) -> Option<Effect> {
        match self {
            Self::Enabled => Some(Effect::Enabled),
            Self::KeepAwake | Self::ActiveStart | Self::ActiveStop | Self::AllowSuspend => {
                Some(Effect::KeepAwake)
            }
            Self::IdleTime => Some(Effect::IdleTime),
            Self::PhotoSource(_) => None,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = PssError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            key::ENABLED => Self::Enabled,
            key::KEEP_AWAKE => Self::KeepAwake,
            key::ACTIVE_START => Self::ActiveStart,
            key::ACTIVE_STOP => Self::ActiveStop,
            key::ALLOW_SUSPEND => Self::AllowSuspend,
            key::IDLE_TIME => Self::IdleTime,
            other => Self::PhotoSource(other.parse()?),
        })
    }
}

/// Runtime effects driven by settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Menu title and badge.
    Enabled,
    /// Keep-awake request, active window alarms and badge.
    KeepAwake,
    /// Idle detection threshold.
    IdleTime,
}

impl Effect {
    pub const ALL: [Self; 3] = [Self::Enabled, Self::KeepAwake, Self::IdleTime];
}

pub struct StateDispatcher {
    settings: Settings,
    platform: Platform,
    sources: Arc<PhotoSources>,
    bus: Arc<dyn MessageBus>,
}

impl StateDispatcher {
    pub fn new(
        settings: Settings,
        platform: Platform,
        sources: Arc<PhotoSources>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            settings,
            platform,
            sources,
            bus,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sources(&self) -> &Arc<PhotoSources> {
        &self.sources
    }

    /// Re-apply the effect of `key`, or of everything for `"all"`.
    ///
    /// Unknown keys are ignored.
    #[instrument(skip(self))]
    pub async fn process_state(&self, key: &str) -> Result<()> {
        if key == ALL_KEYS {
            return self.process_all().await;
        }

        let Ok(setting) = key.parse::<SettingKey>() else {
            trace!(key, "No effect for setting");
            return Ok(());
        };

        match setting.effect() {
            Some(effect) => self.apply(effect),
            None => {
                if let SettingKey::PhotoSource(source) = setting {
                    let outcome = self.sources.process(source).await?;
                    debug!(key, ?outcome, "Photo source processed");
                }
                Ok(())
            }
        }
    }

    /// Every effect, every photo source and the OS record run even when an
    /// earlier one fails; the first failure is returned at the end.
    async fn process_all(&self) -> Result<()> {
        let mut first_error = None;

        for effect in Effect::ALL {
            if let Err(e) = self.apply(effect) {
                warn!(?effect, error = %e, "Effect not applied");
                first_error.get_or_insert(e);
            }
        }

        for (source, result) in self.sources.process_all().await {
            if let Err(e) = result {
                warn!(key = source.as_str(), error = %e, "Photo source not processed");
            }
        }

        if let Err(e) = self.record_os().await {
            warn!(error = %e, "Could not record OS");
            first_error.get_or_insert(e);
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Store the host OS the first time it is seen.
    async fn record_os(&self) -> Result<()> {
        if self.settings.contains(key::OS)? {
            return Ok(());
        }
        match self.platform.info.os().await {
            Ok(os) => {
                info!(os = %os, "Recording OS");
                self.settings.set(key::OS, Some(&os))
            }
            Err(e) => {
                warn!(error = %e, "Could not query OS");
                Ok(())
            }
        }
    }

    /// Run one effect against the current settings.
    pub fn apply(&self, effect: Effect) -> Result<()> {
        debug!(?effect, "Applying effect");
        match effect {
            Effect::Enabled => {
                let title = if self.settings.get_bool(key::ENABLED)? {
                    "Disable"
                } else {
                    "Enable"
                };
                self.platform.ui.set_menu_title(ENABLE_MENU_ID, title);
                schedule::update_badge_text(&self.settings, &self.platform)
            }
            Effect::KeepAwake => {
                schedule::apply_power_state(&self.settings, &self.platform)?;
                schedule::update_repeating_alarms(&self.settings, &self.platform)?;
                schedule::update_badge_text(&self.settings, &self.platform)
            }
            Effect::IdleTime => {
                let seconds = self.settings.idle_seconds()?;
                self.platform.idle.set_detection_interval(seconds);
                Ok(())
            }
        }
    }

    /// Flip `enabled` and apply it.
    ///
    /// Writes made here are not reported back as change events, so the
    /// effect is applied directly.
    pub fn toggle_enabled(&self) -> Result<bool> {
        let enabled = !self.settings.get_bool(key::ENABLED)?;
        self.settings.set(key::ENABLED, Some(&enabled))?;
        self.apply(Effect::Enabled)?;
        Ok(enabled)
    }

    /// Focus the options page, opening it if nobody answers.
    pub async fn show_options_tab(&self) {
        if self.bus.request(Message::Highlight).await == Reply::NoResponder {
            self.platform.ui.open_options_page();
        }
    }
}
