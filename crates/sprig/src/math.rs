//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Rect`] is the axis-aligned rectangle used for both
//! screen-space sprite bounds and texture-space atlas frames.

pub use glam::{Mat3, Vec2, Vec3, Vec4};

use serde::{Deserialize, Serialize};

use crate::expand::QuadCorner;

/// An axis-aligned rectangle described by its top-left (`min`) and
/// bottom-right (`max`) corners.
///
/// In texture space (0,0) is the top-left of the atlas and (1,1) the
/// bottom-right. In screen space the caller decides the axis convention; the
/// pipeline only ever pairs `min` with the top-left screen corner and `max`
/// with the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// The full texture (0,0) to (1,1).
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    /// Create a rectangle from its two corners.
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from pixel coordinates and texture dimensions.
    pub fn from_pixels(x: f32, y: f32, w: f32, h: f32, tex_w: f32, tex_h: f32) -> Self {
        Self {
            min: Vec2::new(x / tex_w, y / tex_h),
            max: Vec2::new((x + w) / tex_w, (y + h) / tex_h),
        }
    }

    /// Build from a top-left corner and a size.
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Select one corner. Each axis comes from either `min` or `max`; nothing
    /// is interpolated.
    pub fn corner(&self, corner: QuadCorner) -> Vec2 {
        match corner {
            QuadCorner::TopLeft => Vec2::new(self.min.x, self.min.y),
            QuadCorner::TopRight => Vec2::new(self.max.x, self.min.y),
            QuadCorner::BottomLeft => Vec2::new(self.min.x, self.max.y),
            QuadCorner::BottomRight => Vec2::new(self.max.x, self.max.y),
        }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}
