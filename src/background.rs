//! Host event handlers.
//!
//! [`Background`] owns the engine's components and turns host events
//! (install, startup, setting changes, idle transitions, alarms) into
//! dispatcher and placer calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::dispatch::{ALL_KEYS, Effect, StateDispatcher};
use crate::display::{DisplayPlacer, PlacementReport};
use crate::error::Result;
use crate::messaging::MessageBus;
use crate::photos::PhotoSources;
use crate::platform::{AlarmName, Platform};
use crate::schedule;

/// System idle state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

pub struct Background {
    settings: Settings,
    platform: Platform,
    dispatcher: StateDispatcher,
    placer: DisplayPlacer,
}

impl Background {
    pub fn new(
        settings: Settings,
        platform: Platform,
        sources: Arc<PhotoSources>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        let dispatcher =
            StateDispatcher::new(settings.clone(), platform.clone(), sources, bus.clone());
        let placer = DisplayPlacer::new(settings.clone(), platform.clone(), bus);
        Self {
            settings,
            platform,
            dispatcher,
            placer,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &StateDispatcher {
        &self.dispatcher
    }

    pub fn placer(&self) -> &DisplayPlacer {
        &self.placer
    }

    /// First install or update: bring the store up to date, then apply it.
    #[instrument(skip(self))]
    pub async fn on_installed(&self, restore_defaults: bool) -> Result<()> {
        self.settings.initialize(restore_defaults)?;
        self.dispatcher.process_state(ALL_KEYS).await
    }

    pub async fn on_startup(&self) -> Result<()> {
        info!("Starting up");
        self.dispatcher.process_state(ALL_KEYS).await
    }

    pub async fn on_setting_changed(&self, key: &str) -> Result<()> {
        self.dispatcher.process_state(key).await
    }

    /// Show the screensaver when the system goes idle, close it when the
    /// user comes back. Returns the placement when windows were opened.
    #[instrument(skip(self))]
    pub async fn on_idle_state(&self, state: IdleState) -> Result<Option<PlacementReport>> {
        match state {
            IdleState::Active => {
                self.placer.close_all();
                Ok(None)
            }
            IdleState::Idle | IdleState::Locked => {
                if !schedule::is_active(&self.settings, self.platform.clock.now())? {
                    debug!("Screensaver inactive, staying hidden");
                    return Ok(None);
                }
                if self.placer.is_showing().await {
                    debug!("Screensaver already showing");
                    return Ok(None);
                }
                self.placer.display_screensaver(false).await.map(Some)
            }
        }
    }

    /// Active window boundary reached.
    pub async fn on_alarm(&self, alarm: AlarmName) -> Result<()> {
        debug!(?alarm, "Alarm fired");
        self.dispatcher.apply(Effect::KeepAwake)?;
        let now = self.platform.clock.now();
        if alarm == AlarmName::ActiveStop && !schedule::is_active(&self.settings, now)? {
            self.placer.close_all();
        }
        Ok(())
    }
}
