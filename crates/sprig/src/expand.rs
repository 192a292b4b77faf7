//! # Expand — One Instance In, One Sealed Quad Out
//!
//! The heart of the pipeline: every sprite instance becomes exactly one
//! four-vertex triangle strip, entirely on the GPU. The host uploads one
//! record per sprite instead of four vertices and six indices.
//!
//! ## Corner Order
//!
//! ```text
//!   TL (0) ─────── TR (1)        strip: TL, TR, BL, BR
//!    │  ╲            │           triangle 0 = {TL, TR, BL}
//!    │     ╲         │           triangle 1 = {TR, BL, BR}
//!    │        ╲      │
//!   BL (2) ─────── BR (3)        vertex_index bit 0 → x from max
//!                                vertex_index bit 1 → y from max
//! ```
//!
//! Each corner picks its attributes by *selection*: the TL screen corner gets
//! the TL texture corner, and so on. Nothing is computed from edge values.
//! The per-instance depth is copied unchanged to all four corners.
//!
//! ## Sealing
//!
//! The shader draws with `draw(0..4, instances)` and `TriangleStrip`
//! topology. A strip never continues across instances, so each sprite is its
//! own closed primitive. The host-side functions here mirror the shader
//! exactly and return [`SealedQuad`]s: fixed four-element values with no way
//! to append to them.
//!
//! ## Comparison
//!
//! - **Geometry shaders (OpenGL)**: the classic approach emits four vertices
//!   from one `GL_POINTS` input and calls `EndPrimitive()`. WGSL has no
//!   geometry stage; instancing with `vertex_index` corner selection gives
//!   the same 1-in-4-out expansion.
//! - **CPU quads**: build four vertices and six indices per sprite on the
//!   host. Simple, but the upload is ~4x larger and the CPU does the work.

use crate::instance::{DepthSpriteInstance, PlainRectInstance};
use crate::math::{Vec2, Vec4};

/// Number of vertices emitted per sprite instance.
pub const VERTICES_PER_QUAD: u32 = 4;

/// One corner of a sprite quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Emission order of the triangle strip.
pub const STRIP_ORDER: [QuadCorner; 4] = [
    QuadCorner::TopLeft,
    QuadCorner::TopRight,
    QuadCorner::BottomLeft,
    QuadCorner::BottomRight,
];

impl QuadCorner {
    /// Map `@builtin(vertex_index)` to a corner, as the shader does.
    pub fn from_vertex_index(index: u32) -> Option<Self> {
        STRIP_ORDER.get(index as usize).copied()
    }

    /// Whether this corner takes its x coordinate from the rectangle's max.
    pub fn uses_max_x(self) -> bool {
        matches!(self, QuadCorner::TopRight | QuadCorner::BottomRight)
    }

    /// Whether this corner takes its y coordinate from the rectangle's max.
    pub fn uses_max_y(self) -> bool {
        matches!(self, QuadCorner::BottomLeft | QuadCorner::BottomRight)
    }
}

/// The two triangles a four-vertex strip assembles into.
pub fn strip_triangles() -> [[QuadCorner; 3]; 2] {
    let [a, b, c, d] = STRIP_ORDER;
    [[a, b, c], [b, c, d]]
}

/// Per-corner output of the depth-compositing variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthCorner {
    /// Clip-space position (`z = 0`, `w = 1`).
    pub position: Vec4,
    pub tex_coord: Vec2,
    pub depth: f32,
}

/// Exactly four vertices in strip order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SealedQuad<T>([T; 4]);

impl<T: Copy> SealedQuad<T> {
    /// Vertices in strip order (TL, TR, BL, BR).
    pub fn vertices(&self) -> &[T; 4] {
        &self.0
    }

    pub fn corner(&self, corner: QuadCorner) -> T {
        self.0[corner as usize]
    }

    /// The quad's two triangles, as the rasterizer assembles them.
    pub fn triangles(&self) -> [[T; 3]; 2] {
        strip_triangles().map(|tri| tri.map(|c| self.corner(c)))
    }
}

impl<T> IntoIterator for SealedQuad<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, 4>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn clip(p: Vec2) -> Vec4 {
    Vec4::new(p.x, p.y, 0.0, 1.0)
}

/// Expand one depth-compositing instance.
pub fn expand_depth(instance: &DepthSpriteInstance) -> SealedQuad<DepthCorner> {
    let screen = instance.screen_rect();
    let tex = instance.tex_rect();
    SealedQuad(STRIP_ORDER.map(|corner| DepthCorner {
        position: clip(screen.corner(corner)),
        tex_coord: tex.corner(corner),
        depth: instance.depth,
    }))
}

/// Expand one plain rectangle. Only clip-space positions are produced.
pub fn expand_plain(instance: &PlainRectInstance) -> SealedQuad<Vec4> {
    let rect = instance.rect();
    SealedQuad(STRIP_ORDER.map(|corner| clip(rect.corner(corner))))
}

/// Expand a whole draw: one sealed quad per instance, in input order.
pub fn expand_all_depth(instances: &[DepthSpriteInstance]) -> Vec<SealedQuad<DepthCorner>> {
    instances.iter().map(expand_depth).collect()
}

pub fn expand_all_plain(instances: &[PlainRectInstance]) -> Vec<SealedQuad<Vec4>> {
    instances.iter().map(expand_plain).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rect;

    fn sample_instance() -> DepthSpriteInstance {
        DepthSpriteInstance::new(
            Rect::new(Vec2::new(-0.5, 0.75), Vec2::new(0.25, -0.25)),
            Rect::new(Vec2::new(0.125, 0.125), Vec2::new(0.25, 0.25)),
            12.5,
        )
    }

    #[test]
    fn strip_order_is_row_major() {
        assert_eq!(QuadCorner::from_vertex_index(0), Some(QuadCorner::TopLeft));
        assert_eq!(QuadCorner::from_vertex_index(1), Some(QuadCorner::TopRight));
        assert_eq!(QuadCorner::from_vertex_index(2), Some(QuadCorner::BottomLeft));
        assert_eq!(QuadCorner::from_vertex_index(3), Some(QuadCorner::BottomRight));
        assert_eq!(QuadCorner::from_vertex_index(4), None);
    }

    #[test]
    fn corner_bits_match_vertex_index() {
        for i in 0..VERTICES_PER_QUAD {
            let corner = QuadCorner::from_vertex_index(i).unwrap();
            assert_eq!(corner.uses_max_x(), i & 1 == 1, "x bit of vertex {i}");
            assert_eq!(corner.uses_max_y(), i & 2 == 2, "y bit of vertex {i}");
        }
    }

    #[test]
    fn triangles_share_the_diagonal() {
        use QuadCorner::*;
        assert_eq!(
            strip_triangles(),
            [[TopLeft, TopRight, BottomLeft], [TopRight, BottomLeft, BottomRight]]
        );
    }

    #[test]
    fn screen_corners_pair_with_texture_corners() {
        let quad = expand_depth(&sample_instance());
        let tl = quad.corner(QuadCorner::TopLeft);
        let br = quad.corner(QuadCorner::BottomRight);
        let tr = quad.corner(QuadCorner::TopRight);
        let bl = quad.corner(QuadCorner::BottomLeft);

        assert_eq!(tl.position, Vec4::new(-0.5, 0.75, 0.0, 1.0));
        assert_eq!(tl.tex_coord, Vec2::new(0.125, 0.125));
        assert_eq!(tr.position, Vec4::new(0.25, 0.75, 0.0, 1.0));
        assert_eq!(tr.tex_coord, Vec2::new(0.25, 0.125));
        assert_eq!(bl.position, Vec4::new(-0.5, -0.25, 0.0, 1.0));
        assert_eq!(bl.tex_coord, Vec2::new(0.125, 0.25));
        assert_eq!(br.position, Vec4::new(0.25, -0.25, 0.0, 1.0));
        assert_eq!(br.tex_coord, Vec2::new(0.25, 0.25));
    }

    #[test]
    fn depth_is_copied_to_every_corner() {
        let quad = expand_depth(&sample_instance());
        assert!(quad.into_iter().all(|c| c.depth == 12.5));
    }

    #[test]
    fn expansion_is_deterministic() {
        let inst = sample_instance();
        let a = expand_all_depth(&[inst]);
        let b = expand_all_depth(&[inst]);
        for (qa, qb) in a.iter().zip(&b) {
            for (va, vb) in qa.vertices().iter().zip(qb.vertices()) {
                assert_eq!(va.position.to_array().map(f32::to_bits), vb.position.to_array().map(f32::to_bits));
                assert_eq!(va.tex_coord.to_array().map(f32::to_bits), vb.tex_coord.to_array().map(f32::to_bits));
                assert_eq!(va.depth.to_bits(), vb.depth.to_bits());
            }
        }
    }

    #[test]
    fn one_quad_per_instance() {
        for n in [0usize, 1, 2, 17] {
            let instances: Vec<_> = (0..n)
                .map(|i| {
                    let x = i as f32 * 0.01;
                    PlainRectInstance::new(Vec2::new(x, 0.0), Vec2::new(0.1, 0.1))
                })
                .collect();
            let quads = expand_all_plain(&instances);
            assert_eq!(quads.len(), n);
            for (quad, inst) in quads.iter().zip(&instances) {
                assert_eq!(quad.corner(QuadCorner::TopLeft).x, inst.origin[0]);
            }
        }
    }

    #[test]
    fn plain_quad_covers_origin_plus_size() {
        let quad = expand_plain(&PlainRectInstance::new(Vec2::new(-1.0, -1.0), Vec2::new(2.0, 0.5)));
        assert_eq!(quad.corner(QuadCorner::TopLeft), Vec4::new(-1.0, -1.0, 0.0, 1.0));
        assert_eq!(quad.corner(QuadCorner::BottomRight), Vec4::new(1.0, -0.5, 0.0, 1.0));
    }

    #[test]
    fn triangles_cover_the_rectangle() {
        let quad = expand_plain(&PlainRectInstance::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 3.0)));
        let area: f32 = quad
            .triangles()
            .iter()
            .map(|[a, b, c]| {
                let ab = b.truncate().truncate() - a.truncate().truncate();
                let ac = c.truncate().truncate() - a.truncate().truncate();
                (ab.perp_dot(ac) / 2.0).abs()
            })
            .sum();
        assert!((area - 6.0).abs() < 1e-6, "area was {area}");
    }

    #[test]
    fn degenerate_rect_gives_zero_area_quad() {
        let quad = expand_plain(&PlainRectInstance::new(Vec2::new(0.3, 0.3), Vec2::ZERO));
        assert!(quad.into_iter().all(|v| v == Vec4::new(0.3, 0.3, 0.0, 1.0)));
    }
}
