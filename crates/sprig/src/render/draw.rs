//! # Draw — The Orchestrator
//!
//! [`SpriteRenderer`] is the entry point the rest of a game talks to. It
//! owns the shared sheet bindings, both pipeline variants (created on first
//! use), and one growable instance buffer per variant.
//!
//! ## Per-Call Flow
//!
//! ```text
//! draw_batch(gpu, target, batch, store)
//!   │
//!   ├─ 1. Lazy init ─── depth pipeline on first call
//!   │
//!   ├─ 2. Resolve ─── check every group's range, look up its sheet textures
//!   │     A range past the instances or an unknown sheet fails the call
//!   │     here, before anything is encoded. Instances past max_sprites are
//!   │     dropped with a warning.
//!   │
//!   ├─ 3. Upload ─── write instances into the depth instance buffer
//!   │     (reallocated at the next power of two when too small)
//!   │
//!   ├─ 4. Render pass
//!   │     color: clear to clear_color, or load
//!   │     depth: load (composite against an earlier pass), or clear
//!   │     bind pipeline + settings
//!   │     for each group: bind sheet textures, draw(0..4, first..first+count)
//!   │
//!   └─ 5. Submit, return DrawStats
//! ```
//!
//! [`draw_plain`](SpriteRenderer::draw_plain) follows the same flow with the
//! plain pipeline and a single draw call. The two variants are never mixed
//! within one draw call.

use super::pipeline::SpritePipeline;
use super::target::RenderTarget;
use super::texture::{SheetBindings, SheetTextures};
use super::GpuContext;
use crate::batch::Batch;
use crate::config::{DepthLoad, RendererConfig};
use crate::error::{Result, SpriteError};
use crate::instance::{PlainRectInstance, SpriteDrawMode};
use crate::sheet::ValidSheet;
use crate::store::{SheetHandle, SheetStore};

/// Counters for one draw call to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: u32,
    pub instances: u32,
}

/// A vertex buffer for instance records that grows on demand.
struct InstanceBuffer {
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
}

impl InstanceBuffer {
    fn new(label: &'static str) -> Self {
        Self { label, buffer: None }
    }

    /// Write `bytes` at offset 0, reallocating first if needed.
    fn upload(&mut self, gpu: &GpuContext, bytes: &[u8]) -> &wgpu::Buffer {
        let needed = bytes.len() as u64;
        let buffer = match self.buffer.take() {
            Some(buffer) if buffer.size() >= needed => buffer,
            _ => {
                let size = needed.next_power_of_two().max(1024);
                log::debug!("Allocating {} ({size} bytes)", self.label);
                gpu.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(self.label),
                    size,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            }
        };
        gpu.queue.write_buffer(&buffer, 0, bytes);
        self.buffer.insert(buffer)
    }
}

/// Draws batches of depth-composited sprites and plain rectangles into a
/// [`RenderTarget`].
pub struct SpriteRenderer {
    config: RendererConfig,
    sheets: SheetBindings,
    depth: Option<SpritePipeline>,
    plain: Option<SpritePipeline>,
    depth_instances: InstanceBuffer,
    plain_instances: InstanceBuffer,
}

impl SpriteRenderer {
    pub fn new(gpu: &GpuContext, config: RendererConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sheets: SheetBindings::new(&gpu.device),
            depth: None,
            plain: None,
            depth_instances: InstanceBuffer::new("depth sprite instance buffer"),
            plain_instances: InstanceBuffer::new("plain rect instance buffer"),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Replace the configuration and push new uniforms to any pipelines
    /// already built.
    pub fn set_config(&mut self, gpu: &GpuContext, config: RendererConfig) -> Result<()> {
        config.validate()?;
        if let Some(p) = &self.depth {
            p.update_settings(&gpu.queue, &config.composite);
        }
        if let Some(p) = &self.plain {
            p.set_plain_color(&gpu.queue, config.plain_color);
        }
        self.config = config;
        Ok(())
    }

    /// Layout and sampler every [`SheetTextures`] must be built against.
    pub fn sheet_bindings(&self) -> &SheetBindings {
        &self.sheets
    }

    /// Load a sheet's atlases from disk and register it.
    pub fn load_sheet(
        &self,
        gpu: &GpuContext,
        store: &mut SheetStore<SheetTextures>,
        sheet: ValidSheet,
    ) -> Result<SheetHandle> {
        if let Some(handle) = store.handle(&sheet.name) {
            log::warn!("Sprite sheet '{}' is already loaded", sheet.name);
            return Ok(handle);
        }
        let textures = SheetTextures::load(gpu, &self.sheets, &sheet)?;
        store.insert(sheet, textures)
    }

    /// Build the pipeline for `mode` now instead of on first draw, so
    /// shader errors surface early.
    pub fn prepare(&mut self, gpu: &GpuContext, target: &RenderTarget, mode: SpriteDrawMode) -> Result<()> {
        let slot = match mode {
            SpriteDrawMode::Depth => &mut self.depth,
            SpriteDrawMode::Plain => &mut self.plain,
        };
        ensure_pipeline(slot, gpu, mode, &self.config, &self.sheets, target)?;
        Ok(())
    }

    pub fn pipeline(&self, mode: SpriteDrawMode) -> Option<&SpritePipeline> {
        match mode {
            SpriteDrawMode::Depth => self.depth.as_ref(),
            SpriteDrawMode::Plain => self.plain.as_ref(),
        }
    }

    /// Recompile a built pipeline from new WGSL source. A pipeline that has
    /// not been built yet is left alone.
    pub fn reload_shader(&mut self, gpu: &GpuContext, mode: SpriteDrawMode, source: &str) -> Result<()> {
        let slot = match mode {
            SpriteDrawMode::Depth => &mut self.depth,
            SpriteDrawMode::Plain => &mut self.plain,
        };
        match slot {
            Some(p) => p.rebuild(gpu, source),
            None => Ok(()),
        }
    }

    /// Draw every group of a batch with its sheet's textures.
    pub fn draw_batch(
        &mut self,
        gpu: &GpuContext,
        target: &RenderTarget,
        batch: &Batch,
        store: &SheetStore<SheetTextures>,
    ) -> Result<DrawStats> {
        let pipeline = ensure_pipeline(
            &mut self.depth,
            gpu,
            SpriteDrawMode::Depth,
            &self.config,
            &self.sheets,
            target,
        )?;

        let total = batch.instances.len();
        let limit = total.min(self.config.max_sprites);
        if total > limit {
            log::warn!(
                "Dropping {} sprites over the {} sprite limit",
                total - limit,
                self.config.max_sprites
            );
        }

        let cap = u32::try_from(limit).unwrap_or(u32::MAX);
        let mut groups = Vec::with_capacity(batch.groups.len());
        for group in &batch.groups {
            let range = group
                .range()
                .filter(|r| r.end as usize <= total)
                .ok_or(SpriteError::GroupOutOfRange {
                    first: group.first,
                    count: group.count,
                    instances: total,
                })?;
            let sheet = store.try_get(group.sheet)?;
            let range = range.start.min(cap)..range.end.min(cap);
            if !range.is_empty() {
                groups.push((&sheet.textures.bind_group, range));
            }
        }

        let buffer = if limit == 0 {
            None
        } else {
            Some(
                self.depth_instances
                    .upload(gpu, bytemuck::cast_slice(&batch.instances[..limit])),
            )
        };

        let mut stats = DrawStats::default();
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("depth sprite encoder"),
        });
        {
            let mut pass = begin_pass(&mut encoder, target, &self.config, "depth sprite pass");
            if let Some(buffer) = buffer {
                pass.set_pipeline(&pipeline.pipeline);
                pass.set_bind_group(0, &pipeline.settings_bind_group, &[]);
                pass.set_vertex_buffer(0, buffer.slice(..));
                for (bind_group, range) in groups {
                    pass.set_bind_group(1, bind_group, &[]);
                    stats.instances += range.len() as u32;
                    stats.draw_calls += 1;
                    pass.draw(0..4, range);
                }
            }
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));

        Ok(stats)
    }

    /// Draw untextured rectangles in one call.
    pub fn draw_plain(
        &mut self,
        gpu: &GpuContext,
        target: &RenderTarget,
        rects: &[PlainRectInstance],
    ) -> Result<DrawStats> {
        let pipeline = ensure_pipeline(
            &mut self.plain,
            gpu,
            SpriteDrawMode::Plain,
            &self.config,
            &self.sheets,
            target,
        )?;

        let rects = if rects.len() > self.config.max_sprites {
            log::warn!(
                "Dropping {} rectangles over the {} sprite limit",
                rects.len() - self.config.max_sprites,
                self.config.max_sprites
            );
            &rects[..self.config.max_sprites]
        } else {
            rects
        };

        let buffer = if rects.is_empty() {
            None
        } else {
            Some(self.plain_instances.upload(gpu, bytemuck::cast_slice(rects)))
        };

        let mut stats = DrawStats::default();
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("plain rect encoder"),
        });
        {
            let mut pass = begin_pass(&mut encoder, target, &self.config, "plain rect pass");
            if let Some(buffer) = buffer {
                pass.set_pipeline(&pipeline.pipeline);
                pass.set_bind_group(0, &pipeline.settings_bind_group, &[]);
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..4, 0..rects.len() as u32);
                stats.draw_calls = 1;
                stats.instances = rects.len() as u32;
            }
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));

        Ok(stats)
    }
}

fn ensure_pipeline<'a>(
    slot: &'a mut Option<SpritePipeline>,
    gpu: &GpuContext,
    mode: SpriteDrawMode,
    config: &RendererConfig,
    sheets: &SheetBindings,
    target: &RenderTarget,
) -> Result<&'a SpritePipeline> {
    let pipeline = match slot.take() {
        Some(p) => p,
        None => SpritePipeline::new(gpu, mode, config, sheets, target.color_format(), target.depth_format())?,
    };
    Ok(slot.insert(pipeline))
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &RenderTarget,
    config: &RendererConfig,
    label: &str,
) -> wgpu::RenderPass<'e> {
    let color_load = match config.clear_color {
        Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
        None => wgpu::LoadOp::Load,
    };
    let depth_load = match config.depth_load {
        DepthLoad::Load => wgpu::LoadOp::Load,
        DepthLoad::Clear(value) => wgpu::LoadOp::Clear(value),
    };

    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &target.color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &target.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: depth_load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::DrawGroup;
    use crate::composite::{composite, CompositeSettings, Fragment};
    use crate::instance::DepthSpriteInstance;
    use crate::math::{Rect, Vec2, Vec4};
    use crate::render::gpu::{depth_test_gpu, test_gpu};
    use crate::sheet::SpriteSheetDesc;

    const SIZE: u32 = 16;

    fn one_frame_sheet(name: &str, side: u16) -> ValidSheet {
        SpriteSheetDesc {
            name: name.into(),
            img_width: side,
            img_height: side,
            origin_x: 0,
            origin_y: 0,
            spr_width: side,
            spr_height: side,
            num_across: 1,
            num_down: 1,
            total: 1,
            color_path: "unused.png".into(),
            depth_path: "unused.png".into(),
        }
        .validate()
        .unwrap()
    }

    /// A 4x4 sheet with uniform color and depth texels.
    fn solid_sheet(
        gpu: &GpuContext,
        renderer: &SpriteRenderer,
        store: &mut SheetStore<SheetTextures>,
        name: &str,
        color: [u8; 4],
        depth_red: u8,
    ) -> SheetHandle {
        let color = color.repeat(16);
        let depth = [depth_red, 0, 0, 255].repeat(16);
        let textures =
            SheetTextures::from_rgba(gpu, renderer.sheet_bindings(), name, 4, 4, &color, &depth).unwrap();
        store.insert(one_frame_sheet(name, 4), textures).unwrap()
    }

    /// A 2x2 sheet whose texels are red, green (top row), blue, white
    /// (bottom row).
    fn quadrant_sheet(
        gpu: &GpuContext,
        renderer: &SpriteRenderer,
        store: &mut SheetStore<SheetTextures>,
    ) -> SheetHandle {
        let color: Vec<u8> = [
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 255, 255],
        ]
        .concat();
        let depth = [128u8, 0, 0, 255].repeat(4);
        let textures =
            SheetTextures::from_rgba(gpu, renderer.sheet_bindings(), "quadrants", 2, 2, &color, &depth).unwrap();
        store.insert(one_frame_sheet("quadrants", 2), textures).unwrap()
    }

    fn full_screen(sheet: SheetHandle, depth: f32) -> Batch {
        Batch {
            instances: vec![DepthSpriteInstance::new(
                Rect::new(Vec2::new(-1.0, 1.0), Vec2::new(1.0, -1.0)),
                Rect::FULL,
                depth,
            )],
            groups: vec![DrawGroup { sheet, first: 0, count: 1 }],
        }
    }

    fn centre<T: Copy>(pixels: &[T], per_pixel: usize) -> &[T] {
        pixel(pixels, per_pixel, SIZE / 2, SIZE / 2)
    }

    fn pixel<T: Copy>(pixels: &[T], per_pixel: usize, x: u32, y: u32) -> &[T] {
        let i = (y * SIZE + x) as usize * per_pixel;
        &pixels[i..i + per_pixel]
    }

    #[test]
    fn sprite_matches_host_composite() {
        let Some(gpu) = depth_test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        target.clear(&gpu, [0.0, 0.0, 0.0, 1.0], 1.0);

        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let mut store = SheetStore::new();
        let sheet = solid_sheet(&gpu, &renderer, &mut store, "red", [255, 0, 0, 255], 128);

        let stats = renderer
            .draw_batch(&gpu, &target, &full_screen(sheet, 10.0), &store)
            .unwrap();
        assert_eq!(stats, DrawStats { draw_calls: 1, instances: 1 });

        let expected = match composite(
            Vec4::new(128.0 / 255.0, 0.0, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            10.0,
            &CompositeSettings::default(),
        ) {
            Fragment::Keep { depth, .. } => depth,
            Fragment::Discard => panic!("reference should keep this fragment"),
        };

        let depth = target.read_depth(&gpu).unwrap();
        let got = centre(&depth, 1)[0];
        assert!((got - expected).abs() < 1e-4, "depth {got}, expected {expected}");

        let color = target.read_color(&gpu).unwrap();
        assert_eq!(centre(&color, 4), &[255, 0, 0, 255]);
    }

    #[test]
    fn nearer_existing_depth_hides_sprite() {
        let Some(gpu) = depth_test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        // Geometry from an earlier pass at 0.05 (5 m with max_depth 100).
        target.clear(&gpu, [0.0, 0.0, 1.0, 1.0], 0.05);

        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let mut store = SheetStore::new();
        let sheet = solid_sheet(&gpu, &renderer, &mut store, "red", [255, 0, 0, 255], 128);
        renderer
            .draw_batch(&gpu, &target, &full_screen(sheet, 10.0), &store)
            .unwrap();

        assert_eq!(centre(&target.read_color(&gpu).unwrap(), 4), &[0, 0, 255, 255]);
        assert!((centre(&target.read_depth(&gpu).unwrap(), 1)[0] - 0.05).abs() < 1e-6);
    }

    #[test]
    fn discarded_fragments_write_nothing() {
        let Some(gpu) = depth_test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        target.clear(&gpu, [0.0, 0.0, 0.0, 1.0], 1.0);

        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let mut store = SheetStore::new();
        let out_of_range = solid_sheet(&gpu, &renderer, &mut store, "far", [255, 255, 255, 255], 255);
        let transparent = solid_sheet(&gpu, &renderer, &mut store, "clear", [255, 255, 255, 0], 128);

        for sheet in [out_of_range, transparent] {
            renderer
                .draw_batch(&gpu, &target, &full_screen(sheet, 10.0), &store)
                .unwrap();
            assert_eq!(centre(&target.read_color(&gpu).unwrap(), 4), &[0, 0, 0, 255]);
            assert_eq!(centre(&target.read_depth(&gpu).unwrap(), 1)[0], 1.0);
        }
    }

    #[test]
    fn plain_rects_fill_without_depth() {
        let Some(gpu) = depth_test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        target.clear(&gpu, [0.0, 0.0, 0.0, 1.0], 0.5);

        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        // Left half of the screen.
        let rect = PlainRectInstance::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 2.0));
        let stats = renderer.draw_plain(&gpu, &target, &[rect]).unwrap();
        assert_eq!(stats.draw_calls, 1);

        let color = target.read_color(&gpu).unwrap();
        let row = (SIZE / 2 * SIZE) as usize * 4;
        assert_eq!(&color[row..row + 4], &[255, 255, 255, 255]);
        let right = row + (SIZE as usize - 1) * 4;
        assert_eq!(&color[right..right + 4], &[0, 0, 0, 255]);
        assert!(target.read_depth(&gpu).unwrap().iter().all(|d| *d == 0.5));
    }

    #[test]
    fn unknown_sheet_fails_before_drawing() {
        let Some(gpu) = test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let store = SheetStore::new();
        let err = renderer.draw_batch(&gpu, &target, &full_screen(SheetHandle(0), 1.0), &store);
        assert!(matches!(err, Err(crate::error::SpriteError::UnknownSheet(0))));
    }

    #[test]
    fn empty_batch_is_no_draw_calls() {
        let Some(gpu) = test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let stats = renderer
            .draw_batch(&gpu, &target, &Batch::default(), &SheetStore::new())
            .unwrap();
        assert_eq!(stats, DrawStats::default());
    }

    #[test]
    fn screen_corners_sample_matching_texture_corners() {
        let Some(gpu) = test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        target.clear(&gpu, [0.0, 0.0, 0.0, 1.0], 1.0);

        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let mut store = SheetStore::new();
        let sheet = quadrant_sheet(&gpu, &renderer, &mut store);
        renderer
            .draw_batch(&gpu, &target, &full_screen(sheet, 10.0), &store)
            .unwrap();

        let color = target.read_color(&gpu).unwrap();
        let (near, far) = (SIZE / 4, SIZE * 3 / 4);
        assert_eq!(pixel(&color, 4, near, near), &[255, 0, 0, 255], "top left");
        assert_eq!(pixel(&color, 4, far, near), &[0, 255, 0, 255], "top right");
        assert_eq!(pixel(&color, 4, near, far), &[0, 0, 255, 255], "bottom left");
        assert_eq!(pixel(&color, 4, far, far), &[255, 255, 255, 255], "bottom right");
    }

    #[test]
    fn instances_in_one_draw_stay_separate_quads() {
        let Some(gpu) = test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        target.clear(&gpu, [0.0, 0.0, 0.0, 1.0], 1.0);

        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let mut store = SheetStore::new();
        let sheet = solid_sheet(&gpu, &renderer, &mut store, "red", [255, 0, 0, 255], 128);

        // Left and right quarters of the screen, full height.
        let column = |left: f32| {
            DepthSpriteInstance::new(
                Rect::new(Vec2::new(left, 1.0), Vec2::new(left + 0.5, -1.0)),
                Rect::FULL,
                10.0,
            )
        };
        let batch = Batch {
            instances: vec![column(-1.0), column(0.5)],
            groups: vec![DrawGroup { sheet, first: 0, count: 2 }],
        };
        let stats = renderer.draw_batch(&gpu, &target, &batch, &store).unwrap();
        assert_eq!(stats, DrawStats { draw_calls: 1, instances: 2 });

        let color = target.read_color(&gpu).unwrap();
        for y in [0, SIZE / 2, SIZE - 1] {
            assert_eq!(pixel(&color, 4, 1, y), &[255, 0, 0, 255]);
            assert_eq!(pixel(&color, 4, SIZE - 2, y), &[255, 0, 0, 255]);
            for x in SIZE / 4 + 1..SIZE * 3 / 4 - 1 {
                assert_eq!(pixel(&color, 4, x, y), &[0, 0, 0, 255], "gap at ({x}, {y})");
            }
        }
    }

    #[test]
    fn group_past_the_instances_fails_before_drawing() {
        let Some(gpu) = test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        target.clear(&gpu, [0.0, 0.0, 0.0, 1.0], 1.0);

        let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default()).unwrap();
        let mut store = SheetStore::new();
        let sheet = solid_sheet(&gpu, &renderer, &mut store, "red", [255, 0, 0, 255], 128);

        let mut batch = full_screen(sheet, 10.0);
        batch.groups[0].count = 2;
        let err = renderer.draw_batch(&gpu, &target, &batch, &store);
        assert!(matches!(
            err,
            Err(SpriteError::GroupOutOfRange { first: 0, count: 2, instances: 1 })
        ));

        batch.groups[0] = DrawGroup { sheet, first: u32::MAX, count: 2 };
        let err = renderer.draw_batch(&gpu, &target, &batch, &store);
        assert!(matches!(err, Err(SpriteError::GroupOutOfRange { .. })));

        assert_eq!(centre(&target.read_color(&gpu).unwrap(), 4), &[0, 0, 0, 255]);
    }

    #[test]
    fn batch_draws_are_capped_at_max_sprites() {
        let Some(gpu) = test_gpu() else { return };
        let target = RenderTarget::new(&gpu, SIZE, SIZE);
        let config = RendererConfig {
            max_sprites: 1,
            ..Default::default()
        };
        let mut renderer = SpriteRenderer::new(&gpu, config).unwrap();
        let mut store = SheetStore::new();
        let red = solid_sheet(&gpu, &renderer, &mut store, "red", [255, 0, 0, 255], 128);
        let blue = solid_sheet(&gpu, &renderer, &mut store, "blue", [0, 0, 255, 255], 128);

        let mut batch = full_screen(red, 10.0);
        batch.instances.push(batch.instances[0]);
        batch.groups.push(DrawGroup { sheet: blue, first: 1, count: 1 });

        let stats = renderer.draw_batch(&gpu, &target, &batch, &store).unwrap();
        assert_eq!(stats, DrawStats { draw_calls: 1, instances: 1 });
    }
}
