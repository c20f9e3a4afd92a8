//! Calheat turns sparse daily event-count logs into calendar heatmaps.
//!
//! The pipeline runs once per metric:
//!
//! - [`normalize`] a raw observation log into a gap-free [`DenseSeries`]
//! - [`to_grid`] the series into ISO week rows and weekday columns
//! - render the [`CalendarGrid`] through a [`HeatmapRenderer`] (vector grid or raster
//!   composite)
//!
//! [`assemble`] drives all of it for a set of metrics and returns an ordered
//! [`DashboardPage`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Reference image lookup and decoding.
pub mod assets;
/// Explicit pipeline configuration.
pub mod config;
pub mod dashboard;
/// Errors and shared value types.
pub mod foundation;
/// Grid coordinates.
pub mod grid;
pub mod ingest;
pub mod render;
pub mod series;

pub use crate::assets::store::{
    DirReferenceImages, InMemoryReferenceImages, NoReferenceImages, ReferenceImage,
    ReferenceImages,
};
pub use crate::config::{AssembleThreading, DashboardConfig, MissingMetricPolicy};
pub use crate::dashboard::assembler::{MetricSelection, assemble, render_panel};
pub use crate::dashboard::model::{DashboardPage, HeatmapPanel, SkippedMetric};
pub use crate::foundation::core::{RawObservation, Rect, Rgb8};
pub use crate::foundation::error::{CalheatError, CalheatResult};
pub use crate::grid::mapper::{CalendarGrid, GridCell, GridCoordinate, ValueRange, to_grid};
pub use crate::render::backend::{
    AxisLabels, HeatmapRenderer, PanelBody, RasterEncoding, ReferencePlacement, RenderSettings,
    RendererVariant, create_renderer,
};
pub use crate::render::layout::{GridLayout, LayoutRow, RowOrder};
pub use crate::render::palette::ColorScale;
pub use crate::render::raster::{RasterComposite, RasterPanel};
pub use crate::render::vector::{VectorGrid, VectorGridRenderer};
pub use crate::series::normalize::{DenseSeries, MetricSeries, discover_metrics, normalize};
