//! Best score persistence
//!
//! Stored as a JSON number under `highScore`. Failures never reach the game:
//! a bad load reads as 0 and a failed save is logged and dropped.

use crate::consts::HIGH_SCORE_KEY;
use crate::persistence::{KeyValueStore, StorageError};

/// Loads and saves the best score through a `KeyValueStore`
#[derive(Debug)]
pub struct HighScoreStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> HighScoreStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read the stored best score, propagating storage errors
    pub fn try_load(&self) -> Result<u64, StorageError> {
        let Some(raw) = self.store.load(HIGH_SCORE_KEY)? else {
            return Ok(0);
        };
        serde_json::from_str::<u64>(raw.trim()).map_err(|_| StorageError::Corrupt {
            key: HIGH_SCORE_KEY.to_string(),
            value: raw,
        })
    }

    /// Read the stored best score, 0 if missing or unreadable
    pub fn load(&self) -> u64 {
        match self.try_load() {
            Ok(score) => {
                log::info!("Loaded high score {}", score);
                score
            }
            Err(e) => {
                log::warn!("Could not load high score: {}", e);
                0
            }
        }
    }

    /// Write the best score (fire-and-forget)
    pub fn save(&self, score: u64) {
        match self.store.save(HIGH_SCORE_KEY, &score.to_string()) {
            Ok(()) => log::info!("High score {} saved", score),
            Err(e) => log::warn!("Could not save high score {}: {}", score, e),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
