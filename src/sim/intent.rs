//! Player intents and key translation
//!
//! Raw key presses become intents here. The action key's meaning depends on
//! the phase: it starts a run from Idle/Paused/GameOver and pauses a running one.
//! Keys are queued as pressed and decoded once per frame, so every press sees
//! the phase the earlier presses of that frame lead to.

use serde::{Deserialize, Serialize};

use super::state::{GamePhase, transition};
use crate::consts::{DEFAULT_ACTION_KEY, DEFAULT_JUMP_KEY};

/// A decoded, device-independent player action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Start (or restart) a run
    Start,
    /// Pause/resume
    Toggle,
    Jump,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::Start, Intent::Toggle, Intent::Jump];
}

/// Which keys drive the game (`KeyboardEvent.key` values)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub jump: String,
    /// Start / pause / restart
    pub action: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            jump: DEFAULT_JUMP_KEY.to_string(),
            action: DEFAULT_ACTION_KEY.to_string(),
        }
    }
}

impl KeyBindings {
    /// Translate a key press into an intent for the current phase
    ///
    /// Returns `None` for unbound keys and for the jump key outside a run.
    pub fn intent_for_key(&self, key: &str, phase: GamePhase) -> Option<Intent> {
        if key == self.jump {
            return (phase == GamePhase::Running).then_some(Intent::Jump);
        }
        if key == self.action {
            return Some(match phase {
                GamePhase::Running => Intent::Toggle,
                GamePhase::Idle | GamePhase::Paused | GamePhase::GameOver => Intent::Start,
            });
        }
        None
    }
}

/// Input gathered between two frames
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    keys: Vec<String>,
    /// Set by focus/visibility loss; repeated requests collapse into one
    pause_requested: bool,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_key(&mut self, key: &str) {
        self.keys.push(key.to_string());
    }

    /// Ask for a pause at the next frame (no effect unless running by then)
    pub fn request_pause(&mut self) {
        self.pause_requested = true;
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && !self.pause_requested
    }

    /// Decode everything queued since the last frame and clear the queue
    ///
    /// Each key is decoded against the phase the previous intents lead to.
    /// A pause request becomes a single `Toggle`, and only if the run is
    /// still going after the keys.
    pub fn drain(&mut self, bindings: &KeyBindings, phase: GamePhase) -> Vec<Intent> {
        let mut phase = phase;
        let mut intents = Vec::with_capacity(self.keys.len() + 1);

        for key in self.keys.drain(..) {
            if let Some(intent) = bindings.intent_for_key(&key, phase) {
                phase = transition(phase, intent).next;
                intents.push(intent);
            }
        }

        if std::mem::take(&mut self.pause_requested) && phase == GamePhase::Running {
            intents.push(Intent::Toggle);
        }
        intents
    }
}
