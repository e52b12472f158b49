//! SVG rasterization and PNG encoding

use crate::alarms::error::{AlarmError, RenderStage, Result};
use png::{BitDepth, ColorType, Encoder, PixelDimensions, Unit};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};
use std::path::Path;
use std::sync::Arc;

const POINTS_PER_INCH: f32 = 72.0;
const METERS_PER_INCH: f64 = 0.0254;

/// Build the font database shared by every render
///
/// System fonts are always loaded; `font_dir` adds bundled fonts on top.
pub fn load_fonts(font_dir: Option<&Path>) -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = font_dir {
        db.load_fonts_dir(dir);
    }
    tracing::debug!(faces = db.len(), "Loaded font faces");
    if db.is_empty() {
        tracing::warn!("No fonts found, cell text will not be drawn");
    }
    Arc::new(db)
}

/// Rasterize an SVG (in points) at `dpi` into a `width_px` x `height_px` pixmap
pub fn rasterize(
    svg: &str,
    fonts: Arc<fontdb::Database>,
    font_family: &str,
    width_px: u32,
    height_px: u32,
    dpi: u32,
) -> Result<Pixmap> {
    let mut options = Options::default();
    options.fontdb = fonts;
    if let Some(first) = font_family.split(',').next() {
        options.font_family = first.trim().to_string();
    }

    let tree = Tree::from_str(svg, &options)
        .map_err(|e| AlarmError::render(RenderStage::Compose, format!("SVG parse failed: {}", e)))?;

    let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
        AlarmError::render(
            RenderStage::Rasterize,
            format!("cannot allocate {}x{} pixmap", width_px, height_px),
        )
    })?;

    let scale = dpi as f32 / POINTS_PER_INCH;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Encode a pixmap as RGBA PNG with the resolution recorded in pHYs
pub fn encode_png(pixmap: &Pixmap, dpi: u32) -> Result<Vec<u8>> {
    let encode_err = |e: png::EncodingError| AlarmError::render(RenderStage::Encode, e.to_string());

    let ppu = (dpi as f64 / METERS_PER_INCH).round() as u32;

    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, pixmap.width(), pixmap.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_pixel_dims(Some(PixelDimensions {
            xppu: ppu,
            yppu: ppu,
            unit: Unit::Meter,
        }));
        let mut writer = encoder.write_header().map_err(encode_err)?;
        writer.write_image_data(pixmap.data()).map_err(encode_err)?;
        writer.finish().map_err(encode_err)?;
    }

    Ok(out)
}
