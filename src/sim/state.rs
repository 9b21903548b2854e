//! Game state and the phase machine
//!
//! All mutable session data lives in `GameState`. Phase changes are decided by
//! `transition`, a total function over every (phase, intent) pair.

use serde::{Deserialize, Serialize};

use super::directive::Directive;
use super::intent::Intent;
use crate::consts::JUMP_DURATION_MS;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Instructions shown, waiting for the first start
    Idle,
    /// Active gameplay
    Running,
    /// Game is paused
    Paused,
    /// Run ended on a collision
    GameOver,
}

impl GamePhase {
    pub const ALL: [GamePhase; 4] = [
        GamePhase::Idle,
        GamePhase::Running,
        GamePhase::Paused,
        GamePhase::GameOver,
    ];
}

/// Outcome of feeding an intent to the phase machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: GamePhase,
    /// Whether this is a "start": score resets to 0
    pub reset_score: bool,
}

impl Transition {
    fn to(phase: GamePhase) -> Self {
        Self {
            next: phase,
            reset_score: false,
        }
    }

    fn restart() -> Self {
        Self {
            next: GamePhase::Running,
            reset_score: true,
        }
    }

    /// True when nothing changes
    pub fn is_noop(&self, from: GamePhase) -> bool {
        self.next == from && !self.reset_score
    }
}

/// Phase machine
///
/// `Jump` never changes the phase; it is handled by the jump timer.
/// Start while paused restarts the run instead of resuming it.
pub fn transition(phase: GamePhase, intent: Intent) -> Transition {
    use GamePhase::*;

    match (phase, intent) {
        (Idle | Paused | GameOver, Intent::Start) => Transition::restart(),
        (Running, Intent::Toggle) => Transition::to(Paused),
        (Paused, Intent::Toggle) => Transition::to(Running),
        (Running, Intent::Start)
        | (Idle | GameOver, Intent::Toggle)
        | (_, Intent::Jump) => Transition::to(phase),
    }
}

/// Scoring rule for obstacles that have passed the character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoringPolicy {
    /// +1 for every passed obstacle on every frame (classic behavior)
    #[default]
    PerFrame,
    /// +1 once per obstacle per pass; re-armed when it wraps back ahead
    OncePerObstacle,
}

/// Tuning consumed by the core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub jump_duration_ms: f64,
    pub scoring: ScoringPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            jump_duration_ms: JUMP_DURATION_MS,
            scoring: ScoringPolicy::default(),
        }
    }
}

/// An in-flight jump, as a monotonic deadline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpTimer {
    pub started_ms: f64,
    pub deadline_ms: f64,
}

impl JumpTimer {
    pub fn start(now_ms: f64, duration_ms: f64) -> Self {
        Self {
            started_ms: now_ms,
            deadline_ms: now_ms + duration_ms,
        }
    }

    #[inline]
    pub fn expired(&self, now_ms: f64) -> bool {
        now_ms >= self.deadline_ms
    }
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase
    pub phase: GamePhase,
    /// Score of the current run
    pub score: u64,
    /// Best score (never decreases)
    pub high_score: u64,
    /// Active jump, if any
    pub jump: Option<JumpTimer>,
    pub config: GameConfig,
    /// Ticks processed since creation
    pub ticks: u64,
    /// Per-obstacle "already scored this pass" flags (OncePerObstacle only)
    #[serde(default)]
    pub(crate) scored: Vec<bool>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            phase: GamePhase::Idle,
            score: 0,
            high_score: 0,
            jump: None,
            config,
            ticks: 0,
            scored: Vec::new(),
        }
    }

    #[inline]
    pub fn is_jumping(&self) -> bool {
        self.jump.is_some()
    }

    /// Apply a best score read from storage
    ///
    /// Storage may answer after play has begun, so this keeps the larger value.
    /// Returns the display update when the best score changed.
    pub fn restore_high_score(&mut self, loaded: u64) -> Option<Directive> {
        if loaded <= self.high_score {
            return None;
        }
        log::info!("Restored high score {}", loaded);
        self.high_score = loaded;
        Some(Directive::UpdateHighScoreDisplay(loaded))
    }

    /// Clear per-run data for a fresh start
    pub(crate) fn reset_run(&mut self) {
        self.score = 0;
        self.scored.clear();
    }

    /// Fold the run's score into the best score
    ///
    /// Returns the new best when it improved.
    pub(crate) fn record_high_score(&mut self) -> Option<u64> {
        if self.score > self.high_score {
            self.high_score = self.score;
            Some(self.high_score)
        } else {
            None
        }
    }
}
