//! # Instance — Per-Sprite Records Sent to the GPU
//!
//! Each sprite is a single *instance* record. The GPU reads one record per
//! instance (step mode `Instance`) and runs the vertex shader four times for
//! it, once per quad corner. No per-corner data exists on the host.
//!
//! ## Memory Layout
//!
//! ```text
//! DepthSpriteInstance (36 bytes per sprite)
//! ┌────────────┬────────────┬────────────┬────────────┬────────┐
//! │ screen_tl  │ screen_br  │ tex_tl     │ tex_br     │ depth  │
//! │ [f32; 2]   │ [f32; 2]   │ [f32; 2]   │ [f32; 2]   │ f32    │
//! │ offset 0   │ offset 8   │ offset 16  │ offset 24  │ off 32 │
//! │ location 0 │ location 1 │ location 2 │ location 3 │ loc 4  │
//! └────────────┴────────────┴────────────┴────────────┴────────┘
//!
//! PlainRectInstance (16 bytes per rectangle)
//! ┌────────────┬────────────┐
//! │ origin     │ size       │
//! │ location 0 │ location 1 │
//! └────────────┴────────────┘
//! ```
//!
//! The two layouts belong to two different pipelines, selected by
//! [`SpriteDrawMode`]. A draw call only ever uses one of them, so a plain
//! rectangle never has texture or depth fields to misread.

use bytemuck::{Pod, Zeroable};

use crate::error::Result;
use crate::math::{Rect, Vec2};
use crate::sheet::ValidSheet;

/// Which sprite pipeline variant to draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteDrawMode {
    /// Textured sprites composited against the depth buffer.
    Depth,
    /// Untextured screen-space rectangles.
    Plain,
}

impl SpriteDrawMode {
    pub(crate) fn label(self) -> &'static str {
        match self {
            SpriteDrawMode::Depth => "depth sprite",
            SpriteDrawMode::Plain => "plain rect",
        }
    }

    /// Size in bytes of one instance record for this mode.
    pub fn instance_size(self) -> usize {
        match self {
            SpriteDrawMode::Depth => std::mem::size_of::<DepthSpriteInstance>(),
            SpriteDrawMode::Plain => std::mem::size_of::<PlainRectInstance>(),
        }
    }
}

/// One textured, depth-composited sprite.
///
/// Screen corners are in normalized device coordinates. `depth` is the
/// sprite's scene depth in meters, the same unit as the baked depth atlas.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DepthSpriteInstance {
    pub screen_tl: [f32; 2],
    pub screen_br: [f32; 2],
    pub tex_tl: [f32; 2],
    pub tex_br: [f32; 2],
    pub depth: f32,
}

impl DepthSpriteInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32x2,
        4 => Float32,
    ];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<DepthSpriteInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &Self::ATTRIBS,
    };

    /// Build from a screen rectangle, a texture rectangle and a depth.
    pub fn new(screen: Rect, tex: Rect, depth: f32) -> Self {
        Self {
            screen_tl: screen.min.to_array(),
            screen_br: screen.max.to_array(),
            tex_tl: tex.min.to_array(),
            tex_br: tex.max.to_array(),
            depth,
        }
    }

    /// Build from a screen rectangle and a frame of a sprite sheet.
    pub fn from_frame(screen: Rect, sheet: &ValidSheet, frame_index: i64, depth: f32) -> Result<Self> {
        let tex = sheet.resolve(frame_index)?;
        Ok(Self::new(screen, tex, depth))
    }

    pub fn screen_rect(&self) -> Rect {
        Rect::new(Vec2::from(self.screen_tl), Vec2::from(self.screen_br))
    }

    pub fn tex_rect(&self) -> Rect {
        Rect::new(Vec2::from(self.tex_tl), Vec2::from(self.tex_br))
    }
}

/// One untextured rectangle given by its top-left corner and size.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlainRectInstance {
    pub origin: [f32; 2],
    pub size: [f32; 2],
}

impl PlainRectInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
    ];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PlainRectInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &Self::ATTRIBS,
    };

    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self {
            origin: origin.to_array(),
            size: size.to_array(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(Vec2::from(self.origin), Vec2::from(self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::tests::grid_desc;

    #[test]
    fn layouts_match_struct_sizes() {
        assert_eq!(std::mem::size_of::<DepthSpriteInstance>(), 36);
        assert_eq!(DepthSpriteInstance::LAYOUT.array_stride, 36);
        assert_eq!(DepthSpriteInstance::ATTRIBS[4].offset, 32);
        assert_eq!(std::mem::size_of::<PlainRectInstance>(), 16);
        assert_eq!(PlainRectInstance::LAYOUT.array_stride, 16);
        assert_eq!(SpriteDrawMode::Depth.instance_size(), 36);
    }

    #[test]
    fn layouts_step_per_instance() {
        assert_eq!(DepthSpriteInstance::LAYOUT.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(PlainRectInstance::LAYOUT.step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn from_frame_uses_resolved_rect() {
        let sheet = grid_desc().validate().unwrap();
        let screen = Rect::new(Vec2::new(-0.5, 0.5), Vec2::new(0.5, -0.5));
        let inst = DepthSpriteInstance::from_frame(screen, &sheet, 9, 10.0).unwrap();
        assert_eq!(inst.tex_tl, [0.125, 0.125]);
        assert_eq!(inst.tex_br, [0.25, 0.25]);
        assert_eq!(inst.screen_rect(), screen);
        assert_eq!(inst.depth, 10.0);
        assert!(DepthSpriteInstance::from_frame(screen, &sheet, 64, 10.0).is_err());
    }

    #[test]
    fn plain_rect_extent_is_origin_plus_size() {
        let inst = PlainRectInstance::new(Vec2::new(-1.0, -1.0), Vec2::new(0.5, 0.25));
        assert_eq!(inst.rect().max, Vec2::new(-0.5, -0.75));
    }
}
