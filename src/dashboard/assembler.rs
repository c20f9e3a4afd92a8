use std::collections::HashSet;

use rayon::prelude::*;

use crate::{
    assets::store::ReferenceImages,
    config::{DashboardConfig, MissingMetricPolicy},
    dashboard::model::{DashboardPage, HeatmapPanel, SkippedMetric},
    foundation::core::RawObservation,
    foundation::error::{CalheatError, CalheatResult},
    grid::mapper::to_grid,
    render::backend::{HeatmapRenderer, create_renderer},
    series::normalize::{discover_metrics, normalize},
};

/// Which metrics go on the page, and in what order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MetricSelection {
    /// Every metric in the raw log, in order of first appearance.
    #[default]
    Discover,
    /// Exactly these metrics, in this order (repeats dropped).
    Explicit(Vec<String>),
}

impl MetricSelection {
    /// Canonical metric order for `raw`.
    pub fn resolve(&self, raw: &[RawObservation]) -> Vec<String> {
        match self {
            MetricSelection::Discover => discover_metrics(raw),
            MetricSelection::Explicit(names) => {
                let mut seen = HashSet::new();
                names
                    .iter()
                    .filter(|n| seen.insert(n.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

/// Run normalize → grid → render for every selected metric and collect the panels.
///
/// Panel order is the canonical metric order of `selection`, also when metrics are built
/// in parallel. Under [`MissingMetricPolicy::Abort`] the first failing metric (in canonical
/// order) fails the page; a sequential run builds nothing after it, a parallel run builds
/// every metric before picking the error. Under [`MissingMetricPolicy::Skip`] failures are
/// logged and recorded in [`DashboardPage::skipped`].
#[tracing::instrument(
    skip_all,
    fields(
        observations = raw.len(),
        variant = ?cfg.renderer_variant,
        parallel = cfg.threading.parallel
    )
)]
pub fn assemble(
    selection: &MetricSelection,
    raw: &[RawObservation],
    cfg: &DashboardConfig,
    references: &dyn ReferenceImages,
) -> CalheatResult<DashboardPage> {
    cfg.validate()?;
    let metrics = selection.resolve(raw);
    let renderer = create_renderer(cfg.renderer_variant, &cfg.render)?;
    let renderer = renderer.as_ref();

    let mut panels = Vec::with_capacity(metrics.len());
    let mut skipped = Vec::new();
    let mut settle = |metric: &String, result: CalheatResult<HeatmapPanel>| {
        match result {
            Ok(panel) => panels.push(panel),
            Err(err) => match cfg.missing_metric_policy {
                MissingMetricPolicy::Abort => return Err(err),
                MissingMetricPolicy::Skip => {
                    tracing::warn!(metric = %metric, error = %err, "skipping metric");
                    skipped.push(SkippedMetric {
                        metric: metric.clone(),
                        reason: err.to_string(),
                    });
                }
            },
        }
        Ok(())
    };

    if cfg.threading.parallel {
        let pool = build_thread_pool(cfg.threading.threads)?;
        // Indexed collect keeps canonical order regardless of completion order.
        let results: Vec<CalheatResult<HeatmapPanel>> = pool.install(|| {
            metrics
                .par_iter()
                .map(|m| build_panel(m, raw, cfg, renderer, references))
                .collect()
        });
        for (metric, result) in metrics.iter().zip(results) {
            settle(metric, result)?;
        }
    } else {
        // Stops at the first failing metric under Abort.
        for metric in &metrics {
            settle(metric, build_panel(metric, raw, cfg, renderer, references))?;
        }
    }

    tracing::info!(
        panels = panels.len(),
        skipped = skipped.len(),
        "assembled dashboard"
    );
    Ok(DashboardPage {
        title: cfg.title.clone(),
        panels,
        skipped,
    })
}

/// Build a single metric's panel with the configured renderer.
pub fn render_panel(
    metric: &str,
    raw: &[RawObservation],
    cfg: &DashboardConfig,
    references: &dyn ReferenceImages,
) -> CalheatResult<HeatmapPanel> {
    cfg.validate()?;
    let renderer = create_renderer(cfg.renderer_variant, &cfg.render)?;
    build_panel(metric, raw, cfg, renderer.as_ref(), references)
}

fn build_panel(
    metric: &str,
    raw: &[RawObservation],
    cfg: &DashboardConfig,
    renderer: &dyn HeatmapRenderer,
    references: &dyn ReferenceImages,
) -> CalheatResult<HeatmapPanel> {
    let anchor = cfg.week_anchor_day;
    let series = normalize(raw, metric, anchor)?;
    let grid = to_grid(&series, anchor)?;

    let reference = references.lookup(metric)?;
    if reference.is_none() {
        tracing::debug!(metric, "no reference image");
    }
    let body = renderer.render(&grid, reference.as_ref())?;

    Ok(HeatmapPanel {
        metric: metric.to_owned(),
        title: cfg.render.panel_title(metric),
        color_scale: cfg.render.color_scale,
        grid,
        body,
        reference_image: reference.map(|r| r.source),
    })
}

fn build_thread_pool(threads: Option<usize>) -> CalheatResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CalheatError::validation(
            "assemble threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CalheatError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/dashboard/assembler.rs"]
mod tests;
