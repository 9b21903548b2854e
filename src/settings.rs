//! Game settings and preferences
//!
//! Persisted as JSON in LocalStorage next to the best score.

use serde::{Deserialize, Serialize};

use crate::consts::{JUMP_DURATION_MS, MIN_JUMP_DURATION_MS, SETTINGS_KEY};
use crate::persistence::KeyValueStore;
use crate::sim::{GameConfig, KeyBindings, ScoringPolicy};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Gameplay ===
    /// Jump length in milliseconds (keep in sync with the CSS animation)
    pub jump_duration_ms: f64,
    /// How passed obstacles are scored
    pub scoring: ScoringPolicy,

    // === Input ===
    pub keys: KeyBindings,
    /// Pause automatically when the tab is hidden or the window loses focus
    pub auto_pause: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jump_duration_ms: JUMP_DURATION_MS,
            scoring: ScoringPolicy::PerFrame,
            keys: KeyBindings::default(),
            auto_pause: true,
        }
    }
}

impl Settings {
    /// Core tuning derived from these settings
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            jump_duration_ms: self.jump_duration_ms,
            scoring: self.scoring,
        }
    }

    /// Replace out-of-range values with usable ones
    pub fn sanitized(mut self) -> Self {
        if !self.jump_duration_ms.is_finite() || self.jump_duration_ms < MIN_JUMP_DURATION_MS {
            log::warn!(
                "Jump duration {} out of range, using {}",
                self.jump_duration_ms,
                JUMP_DURATION_MS
            );
            self.jump_duration_ms = JUMP_DURATION_MS;
        }
        let defaults = KeyBindings::default();
        if self.keys.jump.is_empty() {
            self.keys.jump = defaults.jump;
        }
        if self.keys.action.is_empty() {
            self.keys.action = defaults.action;
        }
        // One key cannot both jump and start/pause
        if self.keys.jump == self.keys.action {
            log::warn!(
                "Jump and action both bound to {:?}, using default keys",
                self.keys.jump
            );
            self.keys = KeyBindings::default();
        }
        self
    }

    /// Load settings from a store, falling back to defaults
    pub fn load_from(store: &impl KeyValueStore) -> Self {
        match store.load(SETTINGS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings.sanitized();
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not load settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to a store
    pub fn save_to(&self, store: &impl KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => match store.save(SETTINGS_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Could not save settings: {}", e),
            },
            Err(e) => log::warn!("Could not encode settings: {}", e),
        }
    }
}
