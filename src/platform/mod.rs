//! Platform abstraction layer
//!
//! The browser driver lives in `main.rs` (wasm32). Native builds get a
//! headless driver that animates the track itself:
//! - Obstacle motion and respawn
//! - Jump arc for the character
//! - Auto-jump policy standing in for a player

pub mod headless;

pub use headless::{AutoJumper, HeadlessSession, RunSummary, Track};
