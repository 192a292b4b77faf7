//! # Pipeline — Two Variants, One Shape
//!
//! Both sprite pipelines share the same skeleton: one instance record per
//! quad, four strip vertices per instance, corners picked from the vertex
//! index. They differ in what the record carries and what the fragment
//! stage does with it.
//!
//! ```text
//! ┌────────────────────┬──────────────────────────┬──────────────────────┐
//! │                    │ Depth                    │ Plain                │
//! ├────────────────────┼──────────────────────────┼──────────────────────┤
//! │ shader             │ depth_sprite.wgsl        │ plain_rect.wgsl      │
//! │ instance record    │ DepthSpriteInstance      │ PlainRectInstance    │
//! │ group 0            │ CompositeUniform         │ PlainUniform (color) │
//! │ group 1            │ sheet color + depth      │ —                    │
//! │ depth test         │ LessEqual, write on      │ Always, write off    │
//! │ blend              │ replace (alpha cut out)  │ alpha blending       │
//! └────────────────────┴──────────────────────────┴──────────────────────┘
//! ```
//!
//! Topology is `TriangleStrip` with no index buffer. Instances never share
//! vertices, so each one is its own sealed strip of two triangles.
//!
//! ## Validation
//!
//! Pipeline construction runs inside a wgpu validation error scope. A WGSL
//! error or a layout mismatch comes back as [`SpriteError::Pipeline`] from
//! [`SpritePipeline::new`], before any draw is issued. [`rebuild`] uses the
//! same scope for hot reload and keeps the previous pipeline on failure.
//!
//! [`SpriteError::Pipeline`]: crate::error::SpriteError::Pipeline
//! [`rebuild`]: SpritePipeline::rebuild

use std::path::PathBuf;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::GpuContext;
use super::texture::SheetBindings;
use crate::composite::CompositeSettings;
use crate::config::RendererConfig;
use crate::error::Result;
use crate::instance::{DepthSpriteInstance, PlainRectInstance, SpriteDrawMode};

/// Uniform block of `plain_rect.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct PlainUniform {
    pub color: [f32; 4],
}

impl SpriteDrawMode {
    fn shader_file(self) -> &'static str {
        match self {
            SpriteDrawMode::Depth => "depth_sprite.wgsl",
            SpriteDrawMode::Plain => "plain_rect.wgsl",
        }
    }

    /// WGSL source compiled into the crate.
    pub fn shader_source(self) -> &'static str {
        match self {
            SpriteDrawMode::Depth => include_str!("shaders/depth_sprite.wgsl"),
            SpriteDrawMode::Plain => include_str!("shaders/plain_rect.wgsl"),
        }
    }

    /// Location of the shader source on disk, if the crate sources are
    /// present (dev builds). Used for hot reload.
    pub fn shader_path(self) -> Option<PathBuf> {
        let p = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("src")
            .join("render")
            .join("shaders")
            .join(self.shader_file());
        if p.exists() { Some(p) } else { None }
    }
}

/// A compiled sprite pipeline and its settings uniform.
pub struct SpritePipeline {
    pub mode: SpriteDrawMode,
    pub pipeline: wgpu::RenderPipeline,
    settings_layout: wgpu::BindGroupLayout,
    sheet_layout: Option<wgpu::BindGroupLayout>,
    settings_buffer: wgpu::Buffer,
    pub settings_bind_group: wgpu::BindGroup,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
}

impl SpritePipeline {
    pub fn new(
        gpu: &GpuContext,
        mode: SpriteDrawMode,
        config: &RendererConfig,
        sheets: &SheetBindings,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let device = &gpu.device;

        let settings_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} settings layout", mode.label())),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let contents: Vec<u8> = match mode {
            SpriteDrawMode::Depth => bytemuck::bytes_of(&config.composite.to_uniform()).to_vec(),
            SpriteDrawMode::Plain => bytemuck::bytes_of(&PlainUniform {
                color: config.plain_color,
            })
            .to_vec(),
        };
        let settings_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} settings buffer", mode.label())),
            contents: &contents,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let settings_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} settings bind group", mode.label())),
            layout: &settings_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: settings_buffer.as_entire_binding(),
            }],
        });

        let sheet_layout = match mode {
            SpriteDrawMode::Depth => Some(sheets.layout.clone()),
            SpriteDrawMode::Plain => None,
        };

        let pipeline = gpu.validated(|device| {
            build_pipeline(
                device,
                mode,
                mode.shader_source(),
                &settings_layout,
                sheet_layout.as_ref(),
                color_format,
                depth_format,
            )
        })?;
        log::info!("Built {} pipeline", mode.label());

        Ok(Self {
            mode,
            pipeline,
            settings_layout,
            sheet_layout,
            settings_buffer,
            settings_bind_group,
            color_format,
            depth_format,
        })
    }

    /// Recompile from WGSL source. On error the current pipeline stays in
    /// place and the error is returned.
    pub fn rebuild(&mut self, gpu: &GpuContext, source: &str) -> Result<()> {
        let candidate = gpu.validated(|device| {
            build_pipeline(
                device,
                self.mode,
                source,
                &self.settings_layout,
                self.sheet_layout.as_ref(),
                self.color_format,
                self.depth_format,
            )
        });
        match candidate {
            Ok(pipeline) => {
                self.pipeline = pipeline;
                log::info!("Rebuilt {} pipeline", self.mode.label());
                Ok(())
            }
            Err(e) => {
                log::warn!("{} shader error: {e}. Keeping old pipeline.", self.mode.label());
                Err(e)
            }
        }
    }

    /// Rewrite the compositing uniform. Ignored by the plain pipeline.
    pub fn update_settings(&self, queue: &wgpu::Queue, settings: &CompositeSettings) {
        if self.mode == SpriteDrawMode::Depth {
            queue.write_buffer(&self.settings_buffer, 0, bytemuck::bytes_of(&settings.to_uniform()));
        }
    }

    /// Rewrite the fill color. Ignored by the depth pipeline.
    pub fn set_plain_color(&self, queue: &wgpu::Queue, color: [f32; 4]) {
        if self.mode == SpriteDrawMode::Plain {
            queue.write_buffer(&self.settings_buffer, 0, bytemuck::bytes_of(&PlainUniform { color }));
        }
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    mode: SpriteDrawMode,
    source: &str,
    settings_layout: &wgpu::BindGroupLayout,
    sheet_layout: Option<&wgpu::BindGroupLayout>,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let label = mode.label();

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let mut layouts = vec![settings_layout];
    layouts.extend(sheet_layout);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} pipeline layout")),
        bind_group_layouts: &layouts,
        push_constant_ranges: &[],
    });

    let (buffers, blend, depth_write_enabled, depth_compare) = match mode {
        SpriteDrawMode::Depth => (
            [DepthSpriteInstance::LAYOUT],
            wgpu::BlendState::REPLACE,
            true,
            wgpu::CompareFunction::LessEqual,
        ),
        SpriteDrawMode::Plain => (
            [PlainRectInstance::LAYOUT],
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            wgpu::CompareFunction::Always,
        ),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} pipeline")),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: depth_format,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
