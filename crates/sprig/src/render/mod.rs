//! Rendering subsystem — the wgpu side of the sprite pipeline.
//!
//! ```text
//!  GpuContext ──► SpritePipeline (Depth | Plain) ──┐
//!                                                  ├──► SpriteRenderer::draw_* ──► RenderTarget
//!  SheetStore<SheetTextures> ──────────────────────┘
//! ```

pub mod draw;
pub mod gpu;
pub mod pipeline;
pub mod target;
pub mod texture;

pub use draw::{DrawStats, SpriteRenderer};
pub use gpu::GpuContext;
pub use pipeline::SpritePipeline;
pub use target::RenderTarget;
pub use texture::{SheetBindings, SheetTextures};
