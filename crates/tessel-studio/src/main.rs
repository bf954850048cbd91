//! Headless tessel demo.
//!
//! Tessellates a 16 × 16 grid of atlas tiles twice, once split per tile and
//! once as a single draw over the whole atlas, renders both into an
//! offscreen target and logs what was drawn.

use anyhow::{Context, Result};
use tessel_engine::config::TessConfig;
use tessel_engine::device::{Gpu, GpuInit};
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::render::{RenderCtx, RenderTarget, Viewport, WgpuIssuer};
use tessel_engine::tess::{
    self, AtlasRegistry, DrawIssuer, DrawMode, Tessellator, TextureId, TextureService, ATLAS_GRID,
};

const TARGET_SIZE: u32 = 512;
const TILE_PX: u32 = 16;
const ATLAS_PX: u32 = TILE_PX * ATLAS_GRID;
/// First texture id handed to individual tiles.
const TILE_TEXTURE_BASE: u32 = 1000;
/// On-screen size of one grid cell.
const CELL: f64 = 15.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let init = GpuInit {
        force_fallback_adapter: std::env::var_os("TESSEL_SOFTWARE_ADAPTER").is_some(),
        ..GpuInit::default()
    };
    let gpu = Gpu::headless_blocking(init).context("failed to open a headless GPU")?;
    let target = gpu.create_target(TARGET_SIZE, TARGET_SIZE)?;
    let ctx = RenderCtx::new(
        gpu.device(),
        gpu.queue(),
        gpu.target_format(),
        Viewport::new(TARGET_SIZE as f32, TARGET_SIZE as f32),
    );

    // ── textures ──────────────────────────────────────────────────────────
    let mut registry = AtlasRegistry::new();
    let atlas = registry.texture_id("/atlas/tiles.png");
    let tiles: Vec<TextureId> = (0..ATLAS_GRID * ATLAS_GRID)
        .map(|i| TextureId(TILE_TEXTURE_BASE + i))
        .collect();
    registry.set_tile_textures(atlas, tiles.clone());

    let mut issuer = WgpuIssuer::new();
    issuer
        .register_texture(&ctx, atlas, ATLAS_PX, ATLAS_PX, &atlas_pixels())
        .context("failed to upload the atlas")?;
    for (index, &id) in tiles.iter().enumerate() {
        issuer.register_texture(&ctx, id, TILE_PX, TILE_PX, &tile_pixels(index as u32))?;
    }

    let config = TessConfig {
        atlas_rendering: true,
        convert_quads_to_triangles: true,
        ..TessConfig::default()
    };
    let mut tess = Tessellator::new(config, registry, issuer);
    tess.set_texture(atlas);

    // ── atlas session: one draw per tile ──────────────────────────────────
    tess.begin(DrawMode::Quads)?;
    tile_grid(&mut tess)?;
    let atlas_bytes = tess.end()?;
    let atlas_draws = tess.issuer().pending_draws();

    // ── plain session: the whole atlas in one draw ────────────────────────
    tess.config_mut().atlas_rendering = false;
    tess.issuer_mut().bind_texture(atlas);
    tess.set_translation(TARGET_SIZE as f64 / 2.0, 0.0, 0.0);
    tess.begin(DrawMode::Quads)?;
    tess.set_normal(0.0, 0.0, 1.0);
    tile_grid(&mut tess)?;
    let plain_bytes = tess.end()?;
    tess.set_translation(0.0, 0.0, 0.0);

    // ── frame border as a line strip ──────────────────────────────────────
    tess.issuer_mut().bind_texture(TextureId::NONE);
    tess.begin(DrawMode::LineStrip)?;
    tess.set_color_opaque_packed(0xE0E0E0);
    let edge = TARGET_SIZE as f64 - 1.0;
    for (x, y) in [(1.0, 1.0), (edge, 1.0), (edge, edge), (1.0, edge), (1.0, 1.0)] {
        tess.add_vertex(x, y, 0.0)?;
    }
    tess.end()?;

    // ── encode ────────────────────────────────────────────────────────────
    let mut frame = gpu.begin_frame(&target);
    let stats = {
        let mut rt = RenderTarget::new(&mut frame.encoder, &frame.view).with_clear(wgpu::Color {
            r: 0.02,
            g: 0.02,
            b: 0.03,
            a: 1.0,
        });
        tess.issuer_mut().encode(&ctx, &mut rt)
    };
    gpu.submit(frame);

    log::info!(
        "atlas session: {atlas_bytes} bytes in {atlas_draws} draws; plain session: {plain_bytes} bytes"
    );
    log::info!(
        "frame: {} draws, {} vertices, {} bytes uploaded",
        stats.draws,
        stats.vertices,
        stats.bytes
    );
    Ok(())
}

/// One quad per atlas tile, laid out like the atlas itself.
fn tile_grid<I: DrawIssuer>(tess: &mut Tessellator<I>) -> Result<()> {
    let grid = ATLAS_GRID as f64;
    for row in 0..ATLAS_GRID {
        for col in 0..ATLAS_GRID {
            let (x0, y0) = (16.0 + col as f64 * CELL, 16.0 + row as f64 * CELL);
            let (x1, y1) = (x0 + CELL - 1.0, y0 + CELL - 1.0);
            let (u0, v0) = (col as f64 / grid, row as f64 / grid);
            let (u1, v1) = ((col + 1) as f64 / grid, (row + 1) as f64 / grid);

            let fade = 255 - (row * 8) as i32;
            tess.set_color_rgba(fade, fade, 255, 255);
            tess.set_brightness(tess::brightness((col * 15) as u16, 240));

            tess.add_vertex_with_uv(x0, y0, 0.0, u0, v0)?;
            tess.add_vertex_with_uv(x0, y1, 0.0, u0, v1)?;
            tess.add_vertex_with_uv(x1, y1, 0.0, u1, v1)?;
            tess.add_vertex_with_uv(x1, y0, 0.0, u1, v0)?;
        }
    }
    Ok(())
}

/// Texel `(x, y)` of tile `index`: a flat color with a darker one-pixel rim.
fn tile_texel(index: u32, x: u32, y: u32) -> [u8; 4] {
    let (col, row) = (index % ATLAS_GRID, index / ATLAS_GRID);
    let base = [
        (col * 16 + 15) as u8,
        (row * 16 + 15) as u8,
        (255 - (col + row) * 7) as u8,
        255,
    ];
    let rim = x == 0 || y == 0 || x == TILE_PX - 1 || y == TILE_PX - 1;
    if rim {
        [base[0] / 2, base[1] / 2, base[2] / 2, 255]
    } else {
        base
    }
}

fn tile_pixels(index: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((TILE_PX * TILE_PX * 4) as usize);
    for y in 0..TILE_PX {
        for x in 0..TILE_PX {
            rgba.extend_from_slice(&tile_texel(index, x, y));
        }
    }
    rgba
}

fn atlas_pixels() -> Vec<u8> {
    let mut rgba = Vec::with_capacity((ATLAS_PX * ATLAS_PX * 4) as usize);
    for y in 0..ATLAS_PX {
        for x in 0..ATLAS_PX {
            let index = (y / TILE_PX) * ATLAS_GRID + x / TILE_PX;
            rgba.extend_from_slice(&tile_texel(index, x % TILE_PX, y % TILE_PX));
        }
    }
    rgba
}
