//! # Camera — Game Space to Screen Space
//!
//! An isometric, orthographic camera. Its orientation is fixed (Euler angles
//! 60° about x, 0° about y, 45° about z); only its position, zoom and
//! resolution change. It answers three questions for each sprite:
//!
//! ```text
//!  game (meters, z up) ──game_to_camera──► camera (meters)
//!                                              │
//!                         camera_to_screen ◄───┘
//!                               │
//!          screen (pixels, origin top-left) + depth (meters)
//!                               │
//!                          screen_to_ndc
//!                               ▼
//!          NDC (x right, y up, both in [-1, 1])
//! ```
//!
//! Depth is measured in meters so it can be added directly to the baked
//! per-texel offsets in a sheet's depth atlas.

use glam::EulerRot;
use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Vec2, Vec3};

/// Tilt of the camera about the x axis.
pub const PITCH_DEGREES: f32 = 60.0;
/// Turn of the camera about the z axis.
pub const YAW_DEGREES: f32 = 45.0;

/// Isometric orthographic camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoCamera {
    /// Size of one meter, in pixels.
    pub scale: f32,
    /// Logical viewport size in pixels.
    pub resolution: Vec2,
    /// Point in the game world the camera is centred on, in meters.
    pub position: Vec3,
    /// Added to camera-space depth so the visible scene lands at positive
    /// depths. The camera's own position sits at this depth.
    pub depth_offset: f32,
}

impl IsoCamera {
    pub fn new(scale: f32, resolution: Vec2) -> Self {
        Self {
            scale,
            resolution,
            position: Vec3::ZERO,
            depth_offset: 50.0,
        }
    }

    /// Move the camera, builder style.
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Rotation taking game-space offsets into camera space.
    pub fn rotation() -> Mat3 {
        Mat3::from_euler(
            EulerRot::XYZ,
            -PITCH_DEGREES.to_radians(),
            0.0,
            -YAW_DEGREES.to_radians(),
        )
    }

    /// Convert game-space coordinates to camera-space coordinates. Both are
    /// in meters; camera z points towards the viewer.
    pub fn game_to_camera(&self, game: Vec3) -> Vec3 {
        Self::rotation() * (game - self.position)
    }

    /// Project a camera-space point to screen pixels and depth in meters.
    pub fn camera_to_screen(&self, cam: Vec3) -> (Vec2, f32) {
        let half = self.resolution * 0.5;
        let screen = Vec2::new(half.x + cam.x * self.scale, half.y - cam.y * self.scale);
        let depth = self.depth_offset - cam.z;
        (screen, depth)
    }

    /// Convert screen pixels to normalized device coordinates.
    pub fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            screen.x / self.resolution.x * 2.0 - 1.0,
            1.0 - screen.y / self.resolution.y * 2.0,
        )
    }

    /// `game_to_camera` followed by `camera_to_screen`.
    pub fn game_to_screen(&self, game: Vec3) -> (Vec2, f32) {
        self.camera_to_screen(self.game_to_camera(game))
    }
}

impl Default for IsoCamera {
    fn default() -> Self {
        Self::new(32.0, Vec2::new(1280.0, 720.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn camera_position_maps_to_screen_centre() {
        let cam = IsoCamera::default().at(Vec3::new(4.0, -2.0, 1.0));
        let (screen, depth) = cam.game_to_screen(cam.position);
        assert!(approx(screen, Vec2::new(640.0, 360.0)));
        assert!((depth - cam.depth_offset).abs() < 1e-5);
        assert!(approx(cam.screen_to_ndc(screen), Vec2::ZERO));
    }

    #[test]
    fn rotation_preserves_distance() {
        let cam = IsoCamera::default();
        let p = Vec3::new(3.0, -7.0, 2.5);
        assert!((cam.game_to_camera(p).length() - p.length()).abs() < 1e-4);
    }

    #[test]
    fn higher_points_are_higher_on_screen_and_nearer() {
        let cam = IsoCamera::default();
        let (ground, ground_depth) = cam.game_to_screen(Vec3::ZERO);
        let (raised, raised_depth) = cam.game_to_screen(Vec3::new(0.0, 0.0, 2.0));
        assert!(raised.y < ground.y, "screen y grows downwards");
        assert!(raised_depth < ground_depth);
    }

    #[test]
    fn ndc_corners() {
        let cam = IsoCamera::new(10.0, Vec2::new(200.0, 100.0));
        assert!(approx(cam.screen_to_ndc(Vec2::ZERO), Vec2::new(-1.0, 1.0)));
        assert!(approx(cam.screen_to_ndc(Vec2::new(200.0, 100.0)), Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn scale_is_pixels_per_meter() {
        let cam = IsoCamera::new(16.0, Vec2::new(320.0, 240.0));
        let (a, _) = cam.camera_to_screen(Vec3::ZERO);
        let (b, _) = cam.camera_to_screen(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(b - a, Vec2::new(16.0, 0.0)));
    }
}
