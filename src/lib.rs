//! Block Jump - A minimal endless-runner arcade game
//!
//! Core modules:
//! - `sim`: Frame-driven game core (phase machine, jump timer, collisions, scoring)
//! - `persistence`: Key-value storage capability (LocalStorage on web)
//! - `highscores`: Best score load/save on top of `persistence`
//! - `settings`: Player preferences and game tuning
//! - `platform`: Native headless frame driver

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use highscores::HighScoreStore;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Jump duration in milliseconds (matches the CSS jump animation)
    pub const JUMP_DURATION_MS: f64 = 500.0;
    /// Shortest jump the settings layer will accept
    pub const MIN_JUMP_DURATION_MS: f64 = 50.0;

    /// Storage key for the persisted best score
    pub const HIGH_SCORE_KEY: &str = "highScore";
    /// Storage key for persisted settings
    pub const SETTINGS_KEY: &str = "block_jump_settings";

    /// Default key bindings (values of `KeyboardEvent.key`)
    pub const DEFAULT_JUMP_KEY: &str = "ArrowUp";
    pub const DEFAULT_ACTION_KEY: &str = " ";
}
