use serde::Serialize;

use crate::grid::mapper::CalendarGrid;
use crate::render::{backend::PanelBody, palette::ColorScale};

/// One metric's rendered calendar heatmap.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapPanel {
    /// Metric name.
    pub metric: String,
    /// Display title.
    pub title: String,
    /// Palette shared by every panel of the page.
    pub color_scale: ColorScale,
    /// The grid the body was rendered from.
    pub grid: CalendarGrid,
    /// Renderer output.
    pub body: PanelBody,
    /// Source URI of the metric's reference image, if one was found.
    pub reference_image: Option<String>,
}

/// A metric left off the page under [`crate::MissingMetricPolicy::Skip`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedMetric {
    /// Metric name.
    pub metric: String,
    /// Rendered error message.
    pub reason: String,
}

/// Ordered panels for the delivery layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardPage {
    /// Page heading.
    pub title: String,
    /// Panels in canonical metric order.
    pub panels: Vec<HeatmapPanel>,
    /// Metrics omitted from `panels`, in canonical order.
    pub skipped: Vec<SkippedMetric>,
}

impl DashboardPage {
    /// Metric names of the panels, in page order.
    pub fn metrics(&self) -> Vec<&str> {
        self.panels.iter().map(|p| p.metric.as_str()).collect()
    }

    /// Panel for `metric`.
    pub fn panel(&self, metric: &str) -> Option<&HeatmapPanel> {
        self.panels.iter().find(|p| p.metric == metric)
    }

    /// Serialize the page as pretty JSON.
    pub fn to_json_pretty(&self) -> crate::CalheatResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::CalheatError::serde(format!("dashboard page: {e}")))
    }
}
