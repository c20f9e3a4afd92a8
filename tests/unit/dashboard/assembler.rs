use std::sync::Mutex;

use chrono::{Datelike, NaiveDate, Weekday};
use image::{Rgba, RgbaImage};

use super::*;
use crate::assets::store::{InMemoryReferenceImages, NoReferenceImages, ReferenceImage};
use crate::config::AssembleThreading;
use crate::render::backend::{PanelBody, RenderSettings, RendererVariant};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn obs(date: NaiveDate, metric: &str, value: f64) -> RawObservation {
    RawObservation::new(date, metric, value)
}

fn log() -> Vec<RawObservation> {
    vec![
        obs(d(2024, 1, 3), "visits", 5.0),
        obs(d(2024, 1, 5), "sightings", 1.0),
        obs(d(2024, 1, 10), "visits", 2.0),
        obs(d(2023, 12, 28), "photos", 12.0),
        obs(d(2024, 1, 2), "sightings", 3.0),
        obs(d(2024, 1, 6), "photos", 0.0),
    ]
}

fn many_metrics() -> Vec<RawObservation> {
    let mut raw = Vec::new();
    for m in 0..12 {
        for i in 0..30 {
            let date = d(2024, 2, 1) + chrono::Duration::days(i * (m + 1) % 90);
            if raw
                .iter()
                .any(|o: &RawObservation| o.date == date && o.metric == format!("m{m:02}"))
            {
                continue;
            }
            raw.push(obs(date, &format!("m{m:02}"), (i * m) as f64));
        }
    }
    raw
}

fn parallel(cfg: DashboardConfig, threads: Option<usize>) -> DashboardConfig {
    DashboardConfig {
        threading: AssembleThreading {
            parallel: true,
            threads,
        },
        ..cfg
    }
}

#[test]
fn discover_follows_first_appearance() {
    let page = assemble(
        &MetricSelection::Discover,
        &log(),
        &DashboardConfig::default(),
        &NoReferenceImages,
    )
    .unwrap();
    assert_eq!(page.title, "Calendar Heatmaps");
    assert_eq!(page.metrics(), ["visits", "sightings", "photos"]);
    assert!(page.skipped.is_empty());

    let visits = page.panel("visits").unwrap();
    assert_eq!(visits.title, "Calendar Heatmap: visits");
    assert_eq!(visits.grid.len(), 11);
    assert_eq!(visits.body.variant(), RendererVariant::VectorGrid);
    assert!(visits.reference_image.is_none());
}

#[test]
fn explicit_selection_keeps_caller_order_and_drops_repeats() {
    let sel = MetricSelection::Explicit(vec![
        "photos".to_owned(),
        "visits".to_owned(),
        "photos".to_owned(),
    ]);
    assert_eq!(sel.resolve(&log()), ["photos", "visits"]);

    let page = assemble(&sel, &log(), &DashboardConfig::default(), &NoReferenceImages).unwrap();
    assert_eq!(page.metrics(), ["photos", "visits"]);
}

#[test]
fn missing_metric_is_skipped_under_skip_policy() {
    let sel = MetricSelection::Explicit(vec!["visits".to_owned(), "x".to_owned()]);
    let cfg = DashboardConfig {
        missing_metric_policy: MissingMetricPolicy::Skip,
        ..DashboardConfig::default()
    };
    let page = assemble(&sel, &log(), &cfg, &NoReferenceImages).unwrap();

    assert_eq!(page.metrics(), ["visits"]);
    assert_eq!(page.skipped.len(), 1);
    assert_eq!(page.skipped[0].metric, "x");
    assert!(page.skipped[0].reason.contains("empty series"));
}

#[test]
fn missing_metric_fails_page_under_abort_policy() {
    let sel = MetricSelection::Explicit(vec!["visits".to_owned(), "x".to_owned()]);
    let err = assemble(&sel, &log(), &DashboardConfig::default(), &NoReferenceImages).unwrap_err();
    assert!(matches!(err, CalheatError::EmptySeries { ref metric } if metric == "x"));
}

#[test]
fn abort_reports_first_failure_in_canonical_order() {
    let mut raw = log();
    raw.push(obs(d(2024, 1, 5), "sightings", 9.0));
    raw.push(obs(d(2024, 1, 1), "photos", -1.0));

    let sel = MetricSelection::Explicit(vec![
        "visits".to_owned(),
        "sightings".to_owned(),
        "photos".to_owned(),
    ]);
    for cfg in [
        DashboardConfig::default(),
        parallel(DashboardConfig::default(), Some(3)),
    ] {
        let err = assemble(&sel, &raw, &cfg, &NoReferenceImages).unwrap_err();
        assert!(
            matches!(err, CalheatError::DuplicateDate { ref metric, .. } if metric == "sightings"),
            "{err}"
        );
    }
}

/// Records every metric the assembler asks a reference image for.
#[derive(Default)]
struct LookupLog(Mutex<Vec<String>>);

impl ReferenceImages for LookupLog {
    fn lookup(&self, metric: &str) -> CalheatResult<Option<ReferenceImage>> {
        self.0.lock().unwrap().push(metric.to_owned());
        Ok(None)
    }
}

#[test]
fn sequential_abort_stops_at_first_failure() {
    let sel = MetricSelection::Explicit(vec![
        "visits".to_owned(),
        "x".to_owned(),
        "sightings".to_owned(),
        "photos".to_owned(),
    ]);

    let lookups = LookupLog::default();
    let err = assemble(&sel, &log(), &DashboardConfig::default(), &lookups).unwrap_err();
    assert!(matches!(err, CalheatError::EmptySeries { ref metric } if metric == "x"));
    assert_eq!(*lookups.0.lock().unwrap(), ["visits"]);

    // Parallel runs still build every metric, then report the same error.
    let lookups = LookupLog::default();
    let cfg = parallel(DashboardConfig::default(), Some(2));
    let err = assemble(&sel, &log(), &cfg, &lookups).unwrap_err();
    assert!(matches!(err, CalheatError::EmptySeries { ref metric } if metric == "x"));
    let mut seen = lookups.0.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, ["photos", "sightings", "visits"]);
}

#[test]
fn oversized_cells_fail_validation_in_every_mode() {
    for variant in [RendererVariant::VectorGrid, RendererVariant::RasterComposite] {
        for (cell_px, gap_px) in [(1_000_000_000, 2), (12, 1_000_000_000)] {
            let seq = DashboardConfig {
                renderer_variant: variant,
                render: RenderSettings {
                    cell_px,
                    gap_px,
                    ..RenderSettings::default()
                },
                ..DashboardConfig::default()
            };
            for cfg in [seq.clone(), parallel(seq, Some(2))] {
                let err = assemble(&MetricSelection::Discover, &log(), &cfg, &NoReferenceImages)
                    .unwrap_err();
                assert!(matches!(err, CalheatError::Validation(_)), "{err}");
            }
        }
    }
}

#[test]
fn tall_grid_is_a_render_error_not_a_panic() {
    let raw: Vec<RawObservation> = (0..300)
        .map(|i| obs(d(2024, 1, 7) + chrono::Duration::days(i), "long", 1.0))
        .collect();
    let cfg = DashboardConfig {
        renderer_variant: RendererVariant::RasterComposite,
        render: RenderSettings {
            cell_px: 256,
            gap_px: 256,
            ..RenderSettings::default()
        },
        ..DashboardConfig::default()
    };
    let err = assemble(&MetricSelection::Discover, &raw, &cfg, &NoReferenceImages).unwrap_err();
    assert!(matches!(err, CalheatError::Render(_)), "{err}");
}

#[test]
fn parallel_matches_sequential() {
    let raw = many_metrics();
    let cfg = DashboardConfig::default();
    let seq = assemble(&MetricSelection::Discover, &raw, &cfg, &NoReferenceImages).unwrap();

    for threads in [None, Some(1), Some(4)] {
        let par = assemble(
            &MetricSelection::Discover,
            &raw,
            &parallel(cfg.clone(), threads),
            &NoReferenceImages,
        )
        .unwrap();
        assert_eq!(par, seq);
    }
    assert_eq!(seq.panels.len(), 12);
    assert_eq!(seq.metrics()[0], "m00");
    assert_eq!(seq.metrics()[11], "m11");
}

#[test]
fn assembly_is_idempotent() {
    let raw = many_metrics();
    for variant in [RendererVariant::VectorGrid, RendererVariant::RasterComposite] {
        let cfg = DashboardConfig {
            renderer_variant: variant,
            ..DashboardConfig::default()
        };
        let a = assemble(&MetricSelection::Discover, &raw, &cfg, &NoReferenceImages).unwrap();
        let b = assemble(&MetricSelection::Discover, &raw, &cfg, &NoReferenceImages).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_json_pretty().unwrap(), b.to_json_pretty().unwrap());
    }
}

#[test]
fn raster_variant_attaches_reference_images() {
    let mut png = Vec::new();
    RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255]))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let mut refs = InMemoryReferenceImages::new();
    refs.insert("visits", ReferenceImage::new("mem://visits.png", png));

    let cfg = DashboardConfig {
        renderer_variant: RendererVariant::RasterComposite,
        ..DashboardConfig::default()
    };
    let page = assemble(&MetricSelection::Discover, &log(), &cfg, &refs).unwrap();

    let visits = page.panel("visits").unwrap();
    assert_eq!(visits.reference_image.as_deref(), Some("mem://visits.png"));
    let PanelBody::Raster(body) = &visits.body else {
        panic!("expected raster body");
    };
    assert!(body.grid_top > 0);

    let photos = page.panel("photos").unwrap();
    assert!(photos.reference_image.is_none());
    let PanelBody::Raster(body) = &photos.body else {
        panic!("expected raster body");
    };
    assert_eq!(body.grid_top, 0);
}

#[test]
fn week_anchor_flows_into_every_panel() {
    let cfg = DashboardConfig {
        week_anchor_day: Weekday::Mon,
        ..DashboardConfig::default()
    };
    let page = assemble(&MetricSelection::Discover, &log(), &cfg, &NoReferenceImages).unwrap();
    for panel in &page.panels {
        assert_eq!(panel.grid.week_anchor(), Weekday::Mon);
        let first = panel.grid.cells().iter().map(|c| c.date).min().unwrap();
        assert_eq!(first.weekday(), Weekday::Mon);
    }
}

#[test]
fn zero_threads_are_rejected() {
    let cfg = parallel(DashboardConfig::default(), Some(0));
    let err = assemble(&MetricSelection::Discover, &log(), &cfg, &NoReferenceImages).unwrap_err();
    assert!(matches!(err, CalheatError::Validation(_)));
}

#[test]
fn render_panel_builds_one_metric() {
    let panel = render_panel(
        "sightings",
        &log(),
        &DashboardConfig::default(),
        &NoReferenceImages,
    )
    .unwrap();
    assert_eq!(panel.metric, "sightings");
    assert_eq!(panel.grid.total(), 4.0);
}
