//! Game core
//!
//! All gameplay logic lives here. This module must stay presentation-free:
//! - Geometry arrives as a snapshot each tick
//! - Time arrives as a monotonic timestamp each tick
//! - Side effects leave as `Directive`s for the caller to execute
//! - No DOM, storage or platform dependencies

pub mod collision;
pub mod directive;
pub mod intent;
pub mod state;
pub mod tick;

pub use collision::{Rect, collides, first_collision, has_passed};
pub use directive::{Directive, JumpAnimation, PlayState};
pub use intent::{InputQueue, Intent, KeyBindings};
pub use state::{
    GameConfig, GamePhase, GameState, JumpTimer, ScoringPolicy, Transition, transition,
};
pub use tick::{TickInput, tick};
