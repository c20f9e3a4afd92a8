use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CalheatError, CalheatResult};
use crate::render::backend::{RenderSettings, RendererVariant};
use crate::render::layout::check_cell_sizes;

/// What the assembler does when one metric cannot be built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMetricPolicy {
    /// Fail the whole page with the metric's error.
    #[default]
    Abort,
    /// Log the failure, record it on the page and continue.
    Skip,
}

/// Per-metric parallelism.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssembleThreading {
    /// Build metrics on a worker pool when `true`.
    pub parallel: bool,
    /// Worker count; `None` lets rayon decide. Must be `>= 1` when set.
    pub threads: Option<usize>,
}

/// Everything the pipeline needs, passed explicitly into [`crate::assemble`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Page heading.
    pub title: String,
    /// Weekday of column 0 and of every series' first day.
    pub week_anchor_day: Weekday,
    /// Renderer used for every panel.
    pub renderer_variant: RendererVariant,
    /// Failure handling per metric.
    pub missing_metric_policy: MissingMetricPolicy,
    /// Renderer settings (palette, row order, sizes).
    pub render: RenderSettings,
    /// Worker pool settings.
    pub threading: AssembleThreading,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Calendar Heatmaps".to_owned(),
            week_anchor_day: Weekday::Sun,
            renderer_variant: RendererVariant::default(),
            missing_metric_policy: MissingMetricPolicy::default(),
            render: RenderSettings::default(),
            threading: AssembleThreading::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON configuration; absent fields take their defaults.
    pub fn from_json_str(s: &str) -> CalheatResult<Self> {
        serde_json::from_str(s).map_err(|e| CalheatError::serde(format!("dashboard config: {e}")))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_path(path: &Path) -> CalheatResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            CalheatError::serde(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Check settings that serde cannot.
    pub fn validate(&self) -> CalheatResult<()> {
        if self.threading.threads == Some(0) {
            return Err(CalheatError::validation(
                "threading.threads must be >= 1 when set",
            ));
        }
        check_cell_sizes(self.render.cell_px, self.render.gap_px)
    }
}
