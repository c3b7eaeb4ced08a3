//! Planar math utilities
//!
//! Re-exports glam with the rectangle helpers used by the grid

pub use glam::*;

/// Axis-aligned rectangle stored as its min and max corners (both inclusive)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Build a rectangle from two opposite corners given in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Square bounds of a circle.
    pub fn around(center: Vec2, radius: f32) -> Self {
        let r = Vec2::splat(radius);
        Self {
            min: center - r,
            max: center + r,
        }
    }

    /// Inclusive overlap test on both axes (touching edges count as overlapping).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}
