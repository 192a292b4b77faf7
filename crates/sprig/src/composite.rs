//! # Composite — Keep or Discard, and Where in Depth
//!
//! The fragment stage turns a flat sprite into something that sorts
//! correctly against real 3D geometry. Every sprite sheet has a second atlas
//! whose red channel is a baked depth hint: how far in front of (or behind)
//! the sprite's origin each texel sits. The stage converts that hint into
//! the same units as the rest of the scene's depth buffer.
//!
//! ```text
//!  depth_tex.r ──► − 0.5 ──► depth_sample ──┐
//!                                          ├─► discard?  depth_sample > depth_cutoff
//!  color_tex   ──────────► color_sample ────┤            or color.a < alpha_cutoff
//!                                          │
//!  instance depth ──────────────────────────┴─► (depth_sample × depth_scale + depth)
//!                                                ───────────────────────────────────
//!                                                            max_depth
//! ```
//!
//! `depth_scale` is how many meters one unit of the depth encoding spans;
//! `max_depth` is the far distance of interest. Both are runtime settings
//! uploaded as a uniform, not shader literals.
//!
//! A discarded fragment writes neither color nor depth.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpriteError};
use crate::math::Vec4;

/// The depth atlas stores signed offsets re-centred around this value.
pub const DEPTH_ENCODING_CENTER: f32 = 0.5;

/// Which texture supplies the output color.
///
/// The reference renderer read the depth atlas for color as well; pick
/// [`ColorSource::DepthTexture`] to reproduce its output exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    #[default]
    ColorTexture,
    DepthTexture,
}

/// Tunables of the fragment stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeSettings {
    /// Meters represented by one unit of the depth encoding.
    pub depth_scale: f32,
    /// Far distance of interest, in meters. Output depth is divided by this.
    pub max_depth: f32,
    /// Re-centred depth samples above this are outside the encodable range.
    pub depth_cutoff: f32,
    /// Texels with lower alpha are cut out.
    pub alpha_cutoff: f32,
    pub color_source: ColorSource,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            depth_scale: 5.0,
            max_depth: 100.0,
            depth_cutoff: 0.48,
            alpha_cutoff: 0.5,
            color_source: ColorSource::ColorTexture,
        }
    }
}

impl CompositeSettings {
    /// Reject settings that would make the depth remap meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_depth.is_finite() && self.max_depth > 0.0) {
            return Err(SpriteError::Config(format!(
                "max_depth must be positive and finite, got {}",
                self.max_depth
            )));
        }
        if !self.depth_scale.is_finite() {
            return Err(SpriteError::Config(format!(
                "depth_scale must be finite, got {}",
                self.depth_scale
            )));
        }
        for (name, value) in [("depth_cutoff", self.depth_cutoff), ("alpha_cutoff", self.alpha_cutoff)] {
            if !value.is_finite() {
                return Err(SpriteError::Config(format!("{name} must be finite, got {value}")));
            }
        }
        Ok(())
    }

    pub(crate) fn to_uniform(self) -> CompositeUniform {
        CompositeUniform {
            depth_scale: self.depth_scale,
            max_depth: self.max_depth,
            depth_cutoff: self.depth_cutoff,
            alpha_cutoff: self.alpha_cutoff,
            color_source: match self.color_source {
                ColorSource::ColorTexture => 0,
                ColorSource::DepthTexture => 1,
            },
            _pad: [0; 3],
        }
    }
}

/// Uniform block mirrored by `CompositeSettings` in `depth_sprite.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct CompositeUniform {
    pub depth_scale: f32,
    pub max_depth: f32,
    pub depth_cutoff: f32,
    pub alpha_cutoff: f32,
    pub color_source: u32,
    pub _pad: [u32; 3],
}

/// Result of the fragment stage for one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fragment {
    Discard,
    Keep { color: Vec4, depth: f32 },
}

impl Fragment {
    pub fn is_discarded(&self) -> bool {
        matches!(self, Fragment::Discard)
    }
}

/// Convert a re-centred depth sample plus the sprite's depth to output depth.
pub fn remap_depth(depth_sample: f32, instance_depth: f32, settings: &CompositeSettings) -> f32 {
    (depth_sample * settings.depth_scale + instance_depth) / settings.max_depth
}

/// Host-side mirror of the fragment shader, given the two texels it samples.
pub fn composite(
    depth_texel: Vec4,
    color_texel: Vec4,
    instance_depth: f32,
    settings: &CompositeSettings,
) -> Fragment {
    let depth_sample = depth_texel.x - DEPTH_ENCODING_CENTER;
    let color_sample = match settings.color_source {
        ColorSource::ColorTexture => color_texel,
        ColorSource::DepthTexture => depth_texel,
    };

    if depth_sample > settings.depth_cutoff || color_sample.w < settings.alpha_cutoff {
        return Fragment::Discard;
    }

    Fragment::Keep {
        color: color_sample,
        depth: remap_depth(depth_sample, instance_depth, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(r: f32) -> Vec4 {
        Vec4::new(r, r, r, 1.0)
    }

    #[test]
    fn defaults_match_reference_constants() {
        let s = CompositeSettings::default();
        assert_eq!(s.depth_scale, 5.0);
        assert_eq!(s.max_depth, 100.0);
        assert_eq!(s.depth_cutoff, 0.48);
        assert_eq!(s.alpha_cutoff, 0.5);
    }

    #[test]
    fn worked_example() {
        let s = CompositeSettings::default();
        let color = Vec4::new(0.2, 0.4, 0.6, 0.9);
        match composite(opaque(0.9), color, 10.0, &s) {
            Fragment::Keep { color: c, depth } => {
                assert_eq!(c, color);
                assert!((depth - 0.12).abs() < 1e-6, "depth was {depth}");
            }
            Fragment::Discard => panic!("fragment should be kept"),
        }
    }

    #[test]
    fn low_alpha_is_always_discarded() {
        let s = CompositeSettings::default();
        for alpha in [0.0, 0.25, 0.49, 0.4999] {
            for r in [0.0, 0.3, 0.5, 0.7, 0.98] {
                let color = Vec4::new(1.0, 1.0, 1.0, alpha);
                assert!(
                    composite(opaque(r), color, 3.0, &s).is_discarded(),
                    "alpha {alpha} depth texel {r} should be discarded"
                );
            }
        }
    }

    #[test]
    fn out_of_range_depth_is_discarded() {
        let s = CompositeSettings::default();
        assert!(composite(opaque(0.99), opaque(1.0), 0.0, &s).is_discarded());
        assert!(!composite(opaque(0.97), opaque(1.0), 0.0, &s).is_discarded());
    }

    #[test]
    fn threshold_alpha_is_kept() {
        let s = CompositeSettings::default();
        let color = Vec4::new(1.0, 0.0, 0.0, 0.5);
        assert!(!composite(opaque(0.5), color, 0.0, &s).is_discarded());
    }

    #[test]
    fn remap_increases_with_instance_depth() {
        let s = CompositeSettings::default();
        for sample in [-0.5, -0.1, 0.0, 0.3, 0.48] {
            let mut prev = f32::NEG_INFINITY;
            for step in 0..200 {
                let d = step as f32 * 0.5;
                let out = remap_depth(sample, d, &s);
                assert!(out > prev, "not increasing at sample {sample}, depth {d}");
                prev = out;
            }
        }
    }

    #[test]
    fn depth_texture_color_source_reproduces_reference() {
        let s = CompositeSettings {
            color_source: ColorSource::DepthTexture,
            ..Default::default()
        };
        let depth_texel = Vec4::new(0.6, 0.6, 0.6, 1.0);
        let color_texel = Vec4::new(1.0, 0.0, 0.0, 0.0);
        match composite(depth_texel, color_texel, 1.0, &s) {
            Fragment::Keep { color, .. } => assert_eq!(color, depth_texel),
            Fragment::Discard => panic!("alpha comes from the depth texel and is 1.0"),
        }
        let s = CompositeSettings::default();
        assert!(composite(depth_texel, color_texel, 1.0, &s).is_discarded());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let s: CompositeSettings = serde_json::from_str(r#"{ "max_depth": 250.0 }"#).unwrap();
        assert_eq!(s.max_depth, 250.0);
        assert_eq!(s.depth_scale, 5.0);
        let s: CompositeSettings =
            serde_json::from_str(r#"{ "color_source": "depth_texture" }"#).unwrap();
        assert_eq!(s.color_source, ColorSource::DepthTexture);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let s = CompositeSettings {
            max_depth: 0.0,
            ..Default::default()
        };
        assert!(s.validate().is_err());
        assert!(CompositeSettings::default().validate().is_ok());

        let nan_cutoff = CompositeSettings {
            depth_cutoff: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(nan_cutoff.validate(), Err(SpriteError::Config(_))));
        let infinite_alpha = CompositeSettings {
            alpha_cutoff: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(infinite_alpha.validate(), Err(SpriteError::Config(_))));
    }

    #[test]
    fn uniform_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<CompositeUniform>() % 16, 0);
        let u = CompositeSettings::default().to_uniform();
        assert_eq!(u.color_source, 0);
    }
}
