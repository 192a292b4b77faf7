//! # Sprig — Depth-Composited Point Sprites
//!
//! A small wgpu renderer for drawing very large numbers of 2D sprites that
//! occlude, and are occluded by, a separately rendered depth buffer. Each
//! sprite is uploaded as a single instance record; the GPU expands it into a
//! screen-aligned quad, samples a color atlas and a baked per-pixel depth
//! atlas, discards cut-out texels, and writes a remapped depth value.
//!
//! Start with a [`SpriteSheetDesc`](sheet::SpriteSheetDesc), register it in a
//! [`SheetStore`](store::SheetStore), queue [`DrawRequest`](batch::DrawRequest)s
//! in a [`Batcher`](batch::Batcher), and hand the resulting batch to a
//! [`SpriteRenderer`](render::SpriteRenderer).

pub mod batch;
pub mod camera;
pub mod composite;
pub mod config;
pub mod error;
pub mod expand;
pub mod instance;
pub mod math;
pub mod render;
pub mod sheet;
pub mod store;

#[cfg(feature = "hot-reload")]
pub mod reload;

pub use error::{Result, SpriteError};
