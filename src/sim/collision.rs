//! Rectangle geometry and the character/obstacle hit test
//!
//! Everything is in screen space: x grows to the right, y grows downward,
//! so a rectangle's `top` is numerically smaller than its `bottom`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (a bounding box read from the presentation layer)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from a position and size, like a DOM box
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Build from the four edges (`DOMRect` order)
    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            min: Vec2::new(left, top),
            max: Vec2::new(right, bottom),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// No area (a hidden element measures as a zero box at the origin)
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Same rectangle moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Check whether the character is hitting an obstacle
///
/// The vertical test is one-sided: only "has the character come down onto
/// the obstacle's top". Obstacles sit on the ground, so being below their
/// bottom edge never happens in play. An empty obstacle box never hits.
#[inline]
pub fn collides(character: &Rect, obstacle: &Rect) -> bool {
    !obstacle.is_empty()
        && character.bottom() >= obstacle.top()
        && character.left() <= obstacle.right()
        && character.right() >= obstacle.left()
}

/// Index of the first obstacle the character is hitting, if any
pub fn first_collision(character: &Rect, obstacles: &[Rect]) -> Option<usize> {
    obstacles.iter().position(|o| collides(character, o))
}

/// Whether an obstacle's leading edge has moved past the character's trailing edge
///
/// Empty boxes are not on the track and never count as passed.
#[inline]
pub fn has_passed(obstacle: &Rect, character: &Rect) -> bool {
    !obstacle.is_empty() && obstacle.left() < character.right()
}
