//! Render a field of procedurally generated sprites headless and write the
//! result to a PNG.
//!
//! ```text
//! cargo run -p sprig --example depth_sprites -- out.png
//! ```

use sprig::batch::{Batcher, DrawRequest};
use sprig::camera::IsoCamera;
use sprig::config::RendererConfig;
use sprig::instance::PlainRectInstance;
use sprig::math::{Vec2, Vec3};
use sprig::render::{GpuContext, RenderTarget, SheetTextures, SpriteRenderer};
use sprig::sheet::SpriteSheetDesc;
use sprig::store::SheetStore;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FRAME: u32 = 32;

/// Four coloured discs in a 2x2 grid. The depth atlas bulges towards the
/// viewer at each disc's centre, so overlapping discs intersect instead of
/// stacking.
fn disc_atlas() -> (Vec<u8>, Vec<u8>) {
    let size = FRAME * 2;
    let colors = [[230, 80, 60], [70, 170, 90], [60, 110, 220], [230, 200, 70]];
    let mut color = vec![0u8; (size * size * 4) as usize];
    let mut depth = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let frame = (y / FRAME) * 2 + x / FRAME;
            let u = ((x % FRAME) as f32 + 0.5) / FRAME as f32 * 2.0 - 1.0;
            let v = ((y % FRAME) as f32 + 0.5) / FRAME as f32 * 2.0 - 1.0;
            let d2 = u * u + v * v;
            let i = ((y * size + x) * 4) as usize;
            if d2 > 1.0 {
                continue;
            }
            let bulge = (1.0 - d2).sqrt();
            let [r, g, b] = colors[frame as usize];
            let shade = 0.6 + 0.4 * bulge;
            color[i..i + 4].copy_from_slice(&[
                (r as f32 * shade) as u8,
                (g as f32 * shade) as u8,
                (b as f32 * shade) as u8,
                255,
            ]);
            let encoded = 0.5 - 0.3 * bulge;
            depth[i..i + 4].copy_from_slice(&[(encoded * 255.0) as u8, 0, 0, 255]);
        }
    }
    (color, depth)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let out = std::env::args().nth(1).unwrap_or_else(|| "depth_sprites.png".into());

    let gpu = GpuContext::headless()?;
    let target = RenderTarget::new(&gpu, WIDTH, HEIGHT);
    target.clear(&gpu, [0.08, 0.08, 0.12, 1.0], 1.0);

    let mut renderer = SpriteRenderer::new(&gpu, RendererConfig::default())?;

    let sheet = SpriteSheetDesc {
        name: "discs".into(),
        img_width: (FRAME * 2) as u16,
        img_height: (FRAME * 2) as u16,
        origin_x: 0,
        origin_y: 0,
        spr_width: FRAME as u16,
        spr_height: FRAME as u16,
        num_across: 2,
        num_down: 2,
        total: 4,
        color_path: "discs_color.png".into(),
        depth_path: "discs_depth.png".into(),
    }
    .validate()?;

    let (color, depth) = disc_atlas();
    let textures = SheetTextures::from_rgba(
        &gpu,
        renderer.sheet_bindings(),
        &sheet.name,
        FRAME * 2,
        FRAME * 2,
        &color,
        &depth,
    )?;
    let mut store = SheetStore::new();
    let discs = store.insert(sheet, textures)?;

    // A ground strip along the bottom, drawn without touching depth.
    let ground = PlainRectInstance::new(Vec2::new(-1.0, -1.0), Vec2::new(2.0, 0.25));
    renderer.draw_plain(&gpu, &target, &[ground])?;

    let camera = IsoCamera::new(32.0, Vec2::new(WIDTH as f32, HEIGHT as f32));
    let mut batcher = Batcher::from_config(renderer.config());
    for gy in -4i32..=4 {
        for gx in -4..=4 {
            let frame = ((gx + gy).rem_euclid(4)) as u32;
            let location = Vec3::new(gx as f32 * 0.6, gy as f32 * 0.6, 0.0);
            batcher.register(DrawRequest::new(discs, frame, location));
        }
    }
    let batch = batcher.build(&store, &camera);
    let stats = renderer.draw_batch(&gpu, &target, &batch, &store)?;
    log::info!("{} sprites in {} draw calls", stats.instances, stats.draw_calls);

    let pixels = target.read_color(&gpu)?;
    image::save_buffer(&out, &pixels, WIDTH, HEIGHT, image::ColorType::Rgba8)?;
    println!("wrote {out}");
    Ok(())
}
