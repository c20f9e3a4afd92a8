use serde::{Deserialize, Serialize};

use crate::{
    assets::store::ReferenceImage,
    foundation::core::Rgb8,
    foundation::error::CalheatResult,
    grid::mapper::CalendarGrid,
    render::{
        layout::RowOrder,
        palette::ColorScale,
        raster::{RasterComposite, RasterPanel},
        vector::{VectorGrid, VectorGridRenderer},
    },
};

/// Output of a [`HeatmapRenderer`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "variant", content = "data", rename_all = "snake_case")]
pub enum PanelBody {
    /// Data-driven grid description for interactive display.
    Vector(VectorGrid),
    /// Encoded bitmap, optionally stacked with a reference image.
    Raster(RasterPanel),
}

impl PanelBody {
    /// Which renderer produced this body.
    pub fn variant(&self) -> RendererVariant {
        match self {
            PanelBody::Vector(_) => RendererVariant::VectorGrid,
            PanelBody::Raster(_) => RendererVariant::RasterComposite,
        }
    }
}

/// A renderer turning a [`CalendarGrid`] into a displayable [`PanelBody`].
///
/// Implementations are stateless with respect to the grid, so one instance can serve every
/// metric of a page, including from worker threads.
pub trait HeatmapRenderer: Send + Sync {
    /// Variant implemented by this renderer.
    fn variant(&self) -> RendererVariant;

    /// Render one metric's grid. A missing `reference` simply omits that region.
    fn render(
        &self,
        grid: &CalendarGrid,
        reference: Option<&ReferenceImage>,
    ) -> CalheatResult<PanelBody>;
}

/// Available renderer kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererVariant {
    /// Interactive vector grid.
    #[default]
    VectorGrid,
    /// Pre-rendered bitmap with optional reference image.
    RasterComposite,
}

/// Where a raster reference image goes relative to the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePlacement {
    /// Reference image on top, grid below.
    #[default]
    Above,
    /// Grid on top, reference image below.
    Below,
}

/// How raster output is handed to the delivery layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterEncoding {
    /// PNG bytes only.
    #[default]
    Png,
    /// PNG bytes plus a self-contained `data:image/png;base64,` URI.
    InlineDataUri,
}

/// Axis captions shown by the vector grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisLabels {
    /// Column axis caption.
    pub x: String,
    /// Row axis caption.
    pub y: String,
    /// Value caption used in hover text.
    pub value: String,
}

impl Default for AxisLabels {
    fn default() -> Self {
        Self {
            x: "Day of Week".to_owned(),
            y: "Week Number".to_owned(),
            value: "Count".to_owned(),
        }
    }
}

/// Backend-agnostic rendering settings shared by both variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Palette applied to cell values.
    pub color_scale: ColorScale,
    /// Vertical order of week rows.
    pub row_order: RowOrder,
    /// Panel title; `{metric}` is replaced by the metric name.
    pub title_template: String,
    /// Axis captions.
    pub axis_labels: AxisLabels,
    /// Suggested panel height for the delivery layer.
    pub panel_height_px: u32,
    /// Edge length of one day cell.
    pub cell_px: u32,
    /// Spacing between cells and the size of year-gap rows.
    pub gap_px: u32,
    /// Color behind cells, gaps and empty slots.
    pub background: Rgb8,
    /// Reference image position for raster output.
    pub reference_placement: ReferencePlacement,
    /// Raster output encoding.
    pub encoding: RasterEncoding,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            color_scale: ColorScale::default(),
            row_order: RowOrder::default(),
            title_template: "Calendar Heatmap: {metric}".to_owned(),
            axis_labels: AxisLabels::default(),
            panel_height_px: 400,
            cell_px: 12,
            gap_px: 2,
            background: Rgb8::new(255, 255, 255),
            reference_placement: ReferencePlacement::default(),
            encoding: RasterEncoding::default(),
        }
    }
}

impl RenderSettings {
    /// Title of the panel for `metric`.
    pub fn panel_title(&self, metric: &str) -> String {
        self.title_template.replace("{metric}", metric)
    }
}

/// Create a renderer implementation.
pub fn create_renderer(
    variant: RendererVariant,
    settings: &RenderSettings,
) -> CalheatResult<Box<dyn HeatmapRenderer>> {
    match variant {
        RendererVariant::VectorGrid => Ok(Box::new(VectorGridRenderer::new(settings.clone()))),
        RendererVariant::RasterComposite => Ok(Box::new(RasterComposite::new(settings.clone())?)),
    }
}
