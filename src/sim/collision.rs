//! Axis-aligned bounding box collision
//!
//! Everything the player can run into exposes its bounds through
//! [`HasBounds`], so the overlap test is written once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in canvas space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }
}

/// Anything with a rectangular footprint
pub trait HasBounds {
    fn bounds(&self) -> Rect;
}

impl HasBounds for Rect {
    fn bounds(&self) -> Rect {
        *self
    }
}

/// Strict overlap test: all four half-plane conditions must hold, so
/// rectangles that only share an edge do not collide.
pub fn is_colliding(a: &impl HasBounds, b: &impl HasBounds) -> bool {
    let a = a.bounds();
    let b = b.bounds();
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}
