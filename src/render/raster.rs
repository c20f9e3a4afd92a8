use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{Rgba, RgbaImage, imageops};
use serde::Serialize;

use crate::{
    assets::{decode::decode_reference, store::ReferenceImage},
    foundation::error::{CalheatError, CalheatResult},
    grid::mapper::CalendarGrid,
    render::{
        backend::{
            HeatmapRenderer, PanelBody, RasterEncoding, ReferencePlacement, RenderSettings,
            RendererVariant,
        },
        layout::{GridLayout, LayoutRow, check_cell_sizes},
    },
};

/// Largest accepted edge of a rendered panel, reference image included.
pub const MAX_RASTER_DIM: u32 = 16_384;

/// Encoded bitmap panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RasterPanel {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Top edge of the calendar grid inside the image (non-zero when a reference image is
    /// stacked above it).
    pub grid_top: u32,
    /// PNG bytes (serialized as base64).
    #[serde(serialize_with = "serialize_base64")]
    pub png: Vec<u8>,
    /// `data:image/png;base64,...` payload when inline encoding was requested.
    pub data_uri: Option<String>,
    /// Source URI of the stacked reference image, if any.
    pub reference_image: Option<String>,
}

impl RasterPanel {
    /// Decode `png` back into pixels.
    pub fn decode(&self) -> CalheatResult<RgbaImage> {
        image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)
            .map(|img| img.to_rgba8())
            .map_err(|e| CalheatError::render(format!("decode panel png: {e}")))
    }
}

fn serialize_base64<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// [`HeatmapRenderer`] producing [`PanelBody::Raster`]: one square per day on a fixed color
/// ramp, optionally stacked with the metric's reference image.
#[derive(Clone, Debug)]
pub struct RasterComposite {
    settings: RenderSettings,
}

impl RasterComposite {
    /// Renderer with the given settings; cell and gap sizes must pass
    /// [`check_cell_sizes`].
    pub fn new(settings: RenderSettings) -> CalheatResult<Self> {
        check_cell_sizes(settings.cell_px, settings.gap_px)?;
        Ok(Self { settings })
    }

    /// Paint the calendar grid alone.
    pub fn paint_grid(&self, grid: &CalendarGrid) -> CalheatResult<RgbaImage> {
        let s = &self.settings;
        let layout = GridLayout::build(grid, s.row_order);
        let geo = layout.geometry(s.cell_px, s.gap_px)?;
        if geo.height == 0 {
            return Err(CalheatError::render(format!(
                "grid for \"{}\" has no rows",
                grid.metric()
            )));
        }
        if geo.height > MAX_RASTER_DIM {
            return Err(CalheatError::render(format!(
                "grid for \"{}\" is {}px tall (max {MAX_RASTER_DIM})",
                grid.metric(),
                geo.height
            )));
        }

        let range = grid.range();
        let mut img = RgbaImage::from_pixel(geo.width, geo.height, Rgba(s.background.to_rgba8()));
        for (row, &top) in layout.rows().iter().zip(&geo.row_tops) {
            let LayoutRow::Week { days, .. } = row else {
                continue;
            };
            for (col, day) in days.iter().enumerate() {
                let Some(day) = day else {
                    continue;
                };
                let px = Rgba(s.color_scale.color_for(day.value, range).to_rgba8());
                let left = geo.column_left(col);
                for y in top..top + geo.cell_px {
                    for x in left..left + geo.cell_px {
                        img.put_pixel(x, y, px);
                    }
                }
            }
        }
        Ok(img)
    }

    /// Stack `reference` above or below `grid_img` on the background color.
    ///
    /// The reference image is scaled to the grid width with its aspect ratio preserved.
    /// Returns the composite and the grid's top edge. Fails when the composite would be
    /// taller than [`MAX_RASTER_DIM`].
    pub fn compose(
        &self,
        grid_img: &RgbaImage,
        reference: Option<&RgbaImage>,
    ) -> CalheatResult<(RgbaImage, u32)> {
        let Some(reference) = reference else {
            return Ok((grid_img.clone(), 0));
        };
        let s = &self.settings;
        let width = grid_img.width();
        let ref_height = fitted_height(reference, width);
        let height = u64::from(ref_height) + u64::from(s.gap_px) + u64::from(grid_img.height());
        if height > u64::from(MAX_RASTER_DIM) {
            return Err(CalheatError::render(format!(
                "composite with reference image is {height}px tall (max {MAX_RASTER_DIM})"
            )));
        }
        let height = height as u32;
        let scaled = fit_width(reference, width, ref_height);

        let mut out = RgbaImage::from_pixel(width, height, Rgba(s.background.to_rgba8()));
        let (ref_top, grid_top) = match s.reference_placement {
            ReferencePlacement::Above => (0, ref_height + s.gap_px),
            ReferencePlacement::Below => (grid_img.height() + s.gap_px, 0),
        };
        imageops::overlay(&mut out, &scaled, 0, i64::from(ref_top));
        imageops::replace(&mut out, grid_img, 0, i64::from(grid_top));
        Ok((out, grid_top))
    }

    fn encode(&self, img: &RgbaImage) -> CalheatResult<(Vec<u8>, Option<String>)> {
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| CalheatError::render(format!("encode png: {e}")))?;
        let data_uri = match self.settings.encoding {
            RasterEncoding::Png => None,
            RasterEncoding::InlineDataUri => {
                Some(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
            }
        };
        Ok((png, data_uri))
    }
}

impl HeatmapRenderer for RasterComposite {
    fn variant(&self) -> RendererVariant {
        RendererVariant::RasterComposite
    }

    #[tracing::instrument(skip_all, fields(metric = grid.metric()))]
    fn render(
        &self,
        grid: &CalendarGrid,
        reference: Option<&ReferenceImage>,
    ) -> CalheatResult<PanelBody> {
        let grid_img = self.paint_grid(grid)?;
        let decoded = reference
            .map(|r| decode_reference(r, Some(grid_img.width())))
            .transpose()?;
        let (img, grid_top) = self.compose(&grid_img, decoded.as_ref())?;
        let (png, data_uri) = self.encode(&img)?;
        tracing::debug!(
            width = img.width(),
            height = img.height(),
            bytes = png.len(),
            "rendered raster panel"
        );

        Ok(PanelBody::Raster(RasterPanel {
            width: img.width(),
            height: img.height(),
            grid_top,
            png,
            data_uri,
            reference_image: reference.map(|r| r.source.clone()),
        }))
    }
}

/// Height of `img` once scaled to `width`, aspect ratio preserved.
fn fitted_height(img: &RgbaImage, width: u32) -> u32 {
    if img.width() == width || img.width() == 0 {
        return img.height();
    }
    let scale = f64::from(width) / f64::from(img.width());
    (f64::from(img.height()) * scale)
        .round()
        .clamp(1.0, f64::from(u32::MAX)) as u32
}

fn fit_width(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.width() == width || img.width() == 0 {
        return img.clone();
    }
    imageops::resize(img, width, height, imageops::FilterType::Triangle)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
