//! # Texture — A Sheet's Atlases on the GPU
//!
//! Every sprite sheet is two images of the same size and grid:
//!
//! - the **color atlas**, sampled for the sprite's appearance. Stored as
//!   `Rgba8UnormSrgb`, so sampling returns linear color.
//! - the **depth atlas**, whose red channel encodes a per-texel depth offset
//!   around 0.5. Stored as `Rgba8Unorm`: it is data, not color, and an sRGB
//!   decode would bend the encoding.
//!
//! Both go into one bind group with a shared nearest-neighbour sampler:
//!
//! ```text
//! group 1 (fragment only)
//!   binding 0  color_tex   texture_2d<f32>
//!   binding 1  depth_tex   texture_2d<f32>
//!   binding 2  sheet_samp  sampler (Nearest, ClampToEdge)
//! ```
//!
//! Nearest filtering keeps frames from bleeding into their neighbours at the
//! cell edges and keeps depth values exact.
//!
//! The layout and sampler live in [`SheetBindings`], created once by the
//! [`SpriteRenderer`](super::SpriteRenderer) and shared by every sheet and by
//! the depth pipeline.

use std::path::Path;

use wgpu::util::DeviceExt;

use super::GpuContext;
use crate::error::{Result, SpriteError};
use crate::sheet::ValidSheet;

pub const SHEET_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const SHEET_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Bind group layout and sampler shared by all sheets.
pub struct SheetBindings {
    pub layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
}

impl SheetBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sheet bind group layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sheet sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self { layout, sampler }
    }
}

/// GPU textures and bind group for one sprite sheet.
pub struct SheetTextures {
    pub color: wgpu::Texture,
    pub depth: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

impl SheetTextures {
    /// Upload a sheet from raw RGBA8 pixels. Both atlases must be
    /// `width × height`, and neither side may be zero or exceed the device's
    /// `max_texture_dimension_2d`.
    pub fn from_rgba(
        gpu: &GpuContext,
        bindings: &SheetBindings,
        label: &str,
        width: u32,
        height: u32,
        color_rgba: &[u8],
        depth_rgba: &[u8],
    ) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        for (what, data) in [("color", color_rgba), ("depth", depth_rgba)] {
            if data.len() != expected {
                return Err(SpriteError::Image {
                    path: format!("{label} ({what})"),
                    message: format!("expected {expected} bytes of RGBA8, got {}", data.len()),
                });
            }
        }

        let max = gpu.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(SpriteError::Image {
                path: label.to_string(),
                message: format!("{width}x{height} atlas is outside the device limit of 1..={max} per side"),
            });
        }

        let (color, depth, bind_group) = gpu.scoped(
            |device| {
                let color = upload(gpu, &format!("{label} color"), SHEET_COLOR_FORMAT, width, height, color_rgba);
                let depth = upload(gpu, &format!("{label} depth"), SHEET_DEPTH_FORMAT, width, height, depth_rgba);

                let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
                let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(label),
                    layout: &bindings.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&color_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&depth_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&bindings.sampler),
                        },
                    ],
                });
                (color, depth, bind_group)
            },
            |message| SpriteError::Image {
                path: label.to_string(),
                message,
            },
        )?;

        Ok(Self {
            color,
            depth,
            bind_group,
            width,
            height,
        })
    }

    /// Load a sheet's atlases from the paths in its descriptor, relative to
    /// the working directory.
    pub fn load(gpu: &GpuContext, bindings: &SheetBindings, sheet: &ValidSheet) -> Result<Self> {
        Self::load_from_dir(gpu, bindings, sheet, Path::new(""))
    }

    /// Load a sheet's atlases with paths resolved against `dir`.
    pub fn load_from_dir(
        gpu: &GpuContext,
        bindings: &SheetBindings,
        sheet: &ValidSheet,
        dir: &Path,
    ) -> Result<Self> {
        let expected = (u32::from(sheet.img_width), u32::from(sheet.img_height));
        let color = load_rgba(&dir.join(&sheet.color_path), expected)?;
        let depth = load_rgba(&dir.join(&sheet.depth_path), expected)?;
        log::info!(
            "Loaded sprite sheet '{}' ({}x{}, {} frames)",
            sheet.name,
            expected.0,
            expected.1,
            sheet.frame_count()
        );
        Self::from_rgba(gpu, bindings, &sheet.name, expected.0, expected.1, &color, &depth)
    }
}

/// Decode an image file to RGBA8, checking it has the declared size.
pub fn load_rgba(path: &Path, expected: (u32, u32)) -> Result<Vec<u8>> {
    let img = image::open(path)
        .map_err(|e| SpriteError::Image {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
        .to_rgba8();

    let actual = img.dimensions();
    if actual != expected {
        return Err(SpriteError::ImageSizeMismatch {
            path: path.display().to_string(),
            expected,
            actual,
        });
    }
    Ok(img.into_raw())
}

fn upload(
    gpu: &GpuContext,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    data: &[u8],
) -> wgpu::Texture {
    gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
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
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        data,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::gpu::test_gpu;

    fn temp_png(name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("sprig-{}-{name}", std::process::id()));
        image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn load_rgba_checks_size() {
        let path = temp_png("size.png", 4, 2);
        let data = load_rgba(&path, (4, 2)).unwrap();
        assert_eq!(data.len(), 4 * 2 * 4);
        assert_eq!(&data[..4], &[10, 20, 30, 255]);

        let err = load_rgba(&path, (8, 8)).unwrap_err();
        assert!(matches!(
            err,
            SpriteError::ImageSizeMismatch { expected: (8, 8), actual: (4, 2), .. }
        ));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_image_is_an_image_error() {
        let err = load_rgba(Path::new("definitely/not/here.png"), (1, 1)).unwrap_err();
        assert!(matches!(err, SpriteError::Image { .. }));
    }

    #[test]
    fn from_rgba_rejects_short_data() {
        let Some(gpu) = test_gpu() else { return };
        let bindings = SheetBindings::new(&gpu.device);
        let ok = vec![0u8; 2 * 2 * 4];
        let short = vec![0u8; 3];
        assert!(SheetTextures::from_rgba(&gpu, &bindings, "t", 2, 2, &ok, &ok).is_ok());
        assert!(matches!(
            SheetTextures::from_rgba(&gpu, &bindings, "t", 2, 2, &ok, &short),
            Err(SpriteError::Image { .. })
        ));
    }

    #[test]
    fn from_rgba_rejects_sizes_the_device_cannot_hold() {
        let Some(gpu) = test_gpu() else { return };
        let bindings = SheetBindings::new(&gpu.device);

        // A u16 descriptor can declare atlases far past the default 8192 limit.
        let wide = gpu.device.limits().max_texture_dimension_2d + 1;
        let row = vec![0u8; wide as usize * 4];
        let err = SheetTextures::from_rgba(&gpu, &bindings, "wide", wide, 1, &row, &row);
        assert!(matches!(err, Err(SpriteError::Image { ref path, .. }) if path == "wide"));

        let err = SheetTextures::from_rgba(&gpu, &bindings, "empty", 0, 0, &[], &[]);
        assert!(matches!(err, Err(SpriteError::Image { .. })));

        // The device is still usable afterwards.
        let ok = vec![0u8; 4];
        assert!(SheetTextures::from_rgba(&gpu, &bindings, "one", 1, 1, &ok, &ok).is_ok());
    }
}
