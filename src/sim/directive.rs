//! Side-effect directives emitted by `tick`
//!
//! The core never touches the page. The frame driver executes these in order.

use serde::{Deserialize, Serialize};

/// Animation play state for the character and obstacles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    Running,
    Paused,
}

impl PlayState {
    /// CSS `animation-play-state` value
    pub fn as_css(&self) -> &'static str {
        match self {
            PlayState::Running => "running",
            PlayState::Paused => "paused",
        }
    }
}

/// Jump animation switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpAnimation {
    On,
    Off,
}

/// Instruction for the presentation/persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Show the game-over banner with the final score
    ShowGameOver(u64),
    HideGameOver,
    HideInstructions,
    SetAnimationPlayState(PlayState),
    SetJumpAnimation(JumpAnimation),
    /// Show or hide the obstacles
    SetObstaclesVisible(bool),
    UpdateScoreDisplay(u64),
    UpdateHighScoreDisplay(u64),
    /// Write the best score to storage (fire-and-forget)
    PersistHighScore(u64),
}
