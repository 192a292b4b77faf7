//! # Render Target — Offscreen Color and Depth
//!
//! Sprites are composited into a pair of textures the caller owns:
//!
//! ```text
//! RenderTarget
//! ┌──────────────────────────────────────────────┐
//! │ color: Rgba8UnormSrgb   RENDER_ATTACHMENT    │
//! │                         COPY_SRC (readback)  │
//! │ depth: Depth32Float     RENDER_ATTACHMENT    │
//! │                         COPY_SRC (readback)  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The depth texture is the point of the whole exercise. A 3D pass can fill
//! it first; the sprite pass then loads it (see
//! [`DepthLoad`](crate::config::DepthLoad)) and every sprite fragment is
//! depth-tested against real geometry.
//!
//! ## Readback
//!
//! Buffer copies need each row padded to
//! [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`] (256) bytes. [`read_color`] and
//! [`read_depth`] copy into a padded staging buffer, map it, and strip the
//! padding back out so callers get tightly packed rows. The copy runs in a
//! validation scope and the call blocks until its submission has finished.
//! Adapters without `DEPTH_TEXTURE_AND_BUFFER_COPIES` (GL) can still read
//! color; [`read_depth`] returns an error on them.
//!
//! [`read_color`]: RenderTarget::read_color
//! [`read_depth`]: RenderTarget::read_depth

use std::sync::mpsc;

use super::GpuContext;
use crate::error::{Result, SpriteError};

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Offscreen color + depth attachments.
pub struct RenderTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (color, color_view) = create_attachment(gpu, "sprig color target", COLOR_FORMAT, width, height);
        let (depth, depth_view) = create_attachment(gpu, "sprig depth target", DEPTH_FORMAT, width, height);
        Self {
            color,
            color_view,
            depth,
            depth_view,
            width,
            height,
        }
    }

    /// Recreate both attachments at a new size. Contents are lost.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        *self = Self::new(gpu, width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        COLOR_FORMAT
    }

    pub fn depth_format(&self) -> wgpu::TextureFormat {
        DEPTH_FORMAT
    }

    /// Clear the color attachment to `color` and the depth attachment to
    /// `depth`, as a standalone pass.
    pub fn clear(&self, gpu: &GpuContext, color: [f64; 4], depth: f32) {
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sprig clear encoder"),
        });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color[0],
                            g: color[1],
                            b: color[2],
                            a: color[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Clear only the depth attachment.
    pub fn clear_depth(&self, gpu: &GpuContext, depth: f32) {
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sprig clear depth encoder"),
        });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear depth pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Read the color attachment back as tightly packed RGBA8 rows.
    pub fn read_color(&self, gpu: &GpuContext) -> Result<Vec<u8>> {
        read_texture(gpu, &self.color, wgpu::TextureAspect::All, self.width, self.height)
    }

    /// Read the depth attachment back, one `f32` per pixel, row-major.
    ///
    /// Fails with [`SpriteError::Readback`] on adapters that cannot copy
    /// depth textures (see [`GpuContext::can_read_depth`]).
    pub fn read_depth(&self, gpu: &GpuContext) -> Result<Vec<f32>> {
        if !gpu.can_read_depth() {
            return Err(SpriteError::Readback(
                "adapter cannot copy depth textures to buffers".into(),
            ));
        }
        let bytes = read_texture(gpu, &self.depth, wgpu::TextureAspect::DepthOnly, self.width, self.height)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

fn create_attachment(
    gpu: &GpuContext,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Bytes per row once padded to the copy alignment.
pub(crate) fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Both attachment formats are four bytes per texel.
const BYTES_PER_TEXEL: u32 = 4;

fn read_texture(
    gpu: &GpuContext,
    texture: &wgpu::Texture,
    aspect: wgpu::TextureAspect,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let unpadded = width * BYTES_PER_TEXEL;
    let padded = padded_bytes_per_row(unpadded);

    let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("sprig readback buffer"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let submission = gpu.scoped(
        |device| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprig readback encoder"),
            });
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &staging,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(padded),
                        rows_per_image: Some(height),
                    },
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
            gpu.queue.submit(std::iter::once(encoder.finish()))
        },
        SpriteError::Readback,
    )?;

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });

    gpu.device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })
        .map_err(|e| SpriteError::Readback(e.to_string()))?;
    let mapped = rx
        .recv()
        .map_err(|_| SpriteError::Readback("map callback dropped".into()))?;
    mapped.map_err(|e| SpriteError::Readback(e.to_string()))?;

    let mut out = Vec::with_capacity((unpadded * height) as usize);
    {
        let data = slice.get_mapped_range();
        for row in data.chunks_exact(padded as usize) {
            out.extend_from_slice(&row[..unpadded as usize]);
        }
    }
    staging.unmap();

    Ok(out)
}
