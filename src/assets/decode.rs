use anyhow::Context;
use image::RgbaImage;

use crate::assets::store::ReferenceImage;
use crate::foundation::error::{CalheatError, CalheatResult};

/// Largest raster edge accepted when rasterizing an SVG reference image.
const MAX_DIM: u32 = 16_384;

/// Decode a reference image into straight-alpha RGBA8.
///
/// Raster formats go through `image`; anything `image` cannot identify is tried as SVG.
/// SVGs are rasterized at `svg_width` pixels wide when given (aspect ratio preserved),
/// otherwise at their intrinsic size.
pub fn decode_reference(
    image: &ReferenceImage,
    svg_width: Option<u32>,
) -> CalheatResult<RgbaImage> {
    let bytes = image.bytes.as_slice();
    if image::guess_format(bytes).is_ok() {
        return decode_raster(bytes)
            .map_err(|e| CalheatError::asset(format!("decode '{}': {e:#}", image.source)));
    }
    let tree = parse_svg(bytes)
        .map_err(|e| CalheatError::asset(format!("decode '{}': {e:#}", image.source)))?;
    rasterize_svg(&tree, svg_width)
}

fn decode_raster(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

fn parse_svg(bytes: &[u8]) -> anyhow::Result<usvg::Tree> {
    let opts = usvg::Options::default();
    usvg::Tree::from_data(bytes, &opts).context("parse svg tree")
}

/// Rasterize an SVG tree, optionally scaled to `width` pixels.
pub(crate) fn rasterize_svg(tree: &usvg::Tree, width: Option<u32>) -> CalheatResult<RgbaImage> {
    let size = tree.size();
    let (w0, h0) = (size.width(), size.height());
    if !w0.is_finite() || !h0.is_finite() || w0 <= 0.0 || h0 <= 0.0 {
        return Err(CalheatError::asset("svg has invalid width/height"));
    }

    let scale = match width {
        Some(w) if w > 0 => w as f32 / w0,
        _ => 1.0,
    };
    let w = (w0 * scale).round().max(1.0) as u32;
    let h = (h0 * scale).round().max(1.0) as u32;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(CalheatError::asset(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| CalheatError::asset("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(tree, xform, &mut pixmap.as_mut());

    // tiny-skia pixels are premultiplied; the compositor works in straight alpha.
    let mut out = Vec::with_capacity((w as usize) * (h as usize) * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(w, h, out)
        .ok_or_else(|| CalheatError::asset("svg raster buffer has wrong length"))
}
