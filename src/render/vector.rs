use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::{
    assets::store::ReferenceImage,
    foundation::core::{Rect, Rgb8},
    foundation::error::CalheatResult,
    grid::mapper::{CalendarGrid, ValueRange},
    render::{
        backend::{AxisLabels, HeatmapRenderer, PanelBody, RenderSettings, RendererVariant},
        layout::{GridLayout, LayoutRow, RowOrder},
        palette::ColorScale,
    },
};

/// Width reserved left of the grid for row labels.
const ROW_LABEL_W: f64 = 64.0;
/// Height reserved above the grid for the title and column headers.
const HEADER_H: f64 = 40.0;
const MARGIN: f64 = 8.0;

/// One day cell of a [`VectorGrid`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VectorCell {
    /// Weekday column (offset from the week-anchor).
    pub column: u8,
    /// Calendar day.
    pub date: NaiveDate,
    /// Exact value, for hover inspection.
    pub value: f64,
    /// Fill color.
    pub color: Rgb8,
    /// Hover text.
    pub tooltip: String,
    /// Cell placement in panel coordinates.
    pub rect: Rect,
}

/// One display row of a [`VectorGrid`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorRow {
    /// A week row.
    Week {
        /// Row caption, e.g. `2024-W01`.
        label: String,
        /// ISO week-year.
        year: i32,
        /// ISO week number.
        week: u32,
        /// Cells present in this week, in column order.
        cells: Vec<VectorCell>,
    },
    /// Blank separator between ISO week-years.
    YearGap {
        /// Year of the row above.
        upper: i32,
        /// Year of the row below.
        lower: i32,
    },
}

/// Data-driven description of a calendar heatmap, ready for interactive display.
///
/// Rows are weeks and columns are weekdays starting at the week-anchor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VectorGrid {
    /// Panel title.
    pub title: String,
    /// Metric name.
    pub metric: String,
    /// Palette used for `color` fields.
    pub color_scale: ColorScale,
    /// Value range the palette was stretched over.
    pub range: ValueRange,
    /// Row order (explicit, never an axis default).
    pub row_order: RowOrder,
    /// Axis captions.
    pub axis: AxisLabels,
    /// Column captions, anchor weekday first.
    pub columns: Vec<String>,
    /// Left edge of each column.
    pub column_x: Vec<f64>,
    /// Rows top to bottom.
    pub rows: Vec<VectorRow>,
    /// Drawing width.
    pub width: f64,
    /// Drawing height.
    pub height: f64,
    /// Suggested display height for the delivery layer.
    pub panel_height_px: u32,
    /// Source URI of the metric's reference image, if any.
    pub reference_image: Option<String>,
}

impl VectorGrid {
    /// Number of day cells.
    pub fn cell_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| match r {
                VectorRow::Week { cells, .. } => cells.len(),
                VectorRow::YearGap { .. } => 0,
            })
            .sum()
    }

    /// Iterate all day cells, top row first.
    pub fn cells(&self) -> impl Iterator<Item = &VectorCell> {
        self.rows.iter().flat_map(|r| match r {
            VectorRow::Week { cells, .. } => cells.as_slice(),
            VectorRow::YearGap { .. } => &[][..],
        })
    }

    /// Standalone SVG document of the grid. Each cell carries a `<title>` for hover.
    pub fn to_svg(&self, background: Rgb8) -> String {
        use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

        let mut s = String::new();
        let (w, h) = (self.width, self.height);
        let _ = writeln!(
            s,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#
        );
        let _ = writeln!(
            s,
            r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}"/>"#,
            background.to_hex()
        );
        let _ = writeln!(
            s,
            r#"<text x="{MARGIN}" y="{}" font-size="14">{}</text>"#,
            MARGIN + 12.0,
            text(&self.title)
        );

        for (label, x) in self.columns.iter().zip(&self.column_x) {
            let _ = writeln!(
                s,
                r#"<text x="{x}" y="{}" font-size="9">{}</text>"#,
                HEADER_H - 4.0,
                text(label)
            );
        }

        for row in &self.rows {
            let VectorRow::Week { label, cells, .. } = row else {
                continue;
            };
            let Some(first) = cells.first() else {
                continue;
            };
            let _ = writeln!(
                s,
                r#"<text x="{MARGIN}" y="{}" font-size="9">{}</text>"#,
                first.rect.y1 - 2.0,
                text(label)
            );
            for c in cells {
                let _ = writeln!(
                    s,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" data-date="{}" data-value="{}"><title>{}</title></rect>"#,
                    c.rect.x0,
                    c.rect.y0,
                    c.rect.width(),
                    c.rect.height(),
                    c.color.to_hex(),
                    c.date,
                    attr(&format_value(c.value)),
                    text(&c.tooltip)
                );
            }
        }

        s.push_str("</svg>\n");
        s
    }
}

/// [`HeatmapRenderer`] producing [`PanelBody::Vector`].
#[derive(Clone, Debug)]
pub struct VectorGridRenderer {
    settings: RenderSettings,
}

impl VectorGridRenderer {
    /// Renderer with the given settings.
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    /// Build the grid description for `grid`.
    pub fn build(
        &self,
        grid: &CalendarGrid,
        reference: Option<&ReferenceImage>,
    ) -> CalheatResult<VectorGrid> {
        let s = &self.settings;
        let layout = GridLayout::build(grid, s.row_order);
        let geo = layout.geometry(s.cell_px, s.gap_px)?;
        let range = grid.range();
        let origin_x = MARGIN + ROW_LABEL_W;
        let origin_y = HEADER_H;
        let cell = f64::from(geo.cell_px);

        let mut rows = Vec::with_capacity(layout.len());
        for (row, &top) in layout.rows().iter().zip(&geo.row_tops) {
            match row {
                LayoutRow::YearGap { upper, lower } => rows.push(VectorRow::YearGap {
                    upper: *upper,
                    lower: *lower,
                }),
                LayoutRow::Week { year, week, days } => {
                    let y0 = origin_y + f64::from(top);
                    let cells = days
                        .iter()
                        .enumerate()
                        .filter_map(|(col, day)| {
                            let day = (*day)?;
                            let x0 = origin_x + f64::from(geo.column_left(col));
                            Some(VectorCell {
                                column: col as u8,
                                date: day.date,
                                value: day.value,
                                color: s.color_scale.color_for(day.value, range),
                                tooltip: tooltip(day.date, day.value, &s.axis_labels),
                                rect: Rect::new(x0, y0, x0 + cell, y0 + cell),
                            })
                        })
                        .collect();
                    rows.push(VectorRow::Week {
                        label: format!("{year}-W{week:02}"),
                        year: *year,
                        week: *week,
                        cells,
                    });
                }
            }
        }

        Ok(VectorGrid {
            title: s.panel_title(grid.metric()),
            metric: grid.metric().to_owned(),
            color_scale: s.color_scale,
            range,
            row_order: layout.order(),
            axis: s.axis_labels.clone(),
            columns: weekday_labels(grid.week_anchor()),
            column_x: (0..7)
                .map(|col| origin_x + f64::from(geo.column_left(col)))
                .collect(),
            rows,
            width: origin_x + f64::from(geo.width) + MARGIN,
            height: origin_y + f64::from(geo.height) + MARGIN,
            panel_height_px: s.panel_height_px,
            reference_image: reference.map(|r| r.source.clone()),
        })
    }
}

impl HeatmapRenderer for VectorGridRenderer {
    fn variant(&self) -> RendererVariant {
        RendererVariant::VectorGrid
    }

    fn render(
        &self,
        grid: &CalendarGrid,
        reference: Option<&ReferenceImage>,
    ) -> CalheatResult<PanelBody> {
        self.build(grid, reference).map(PanelBody::Vector)
    }
}

/// Seven weekday captions starting at `anchor`.
pub fn weekday_labels(anchor: Weekday) -> Vec<String> {
    let mut out = Vec::with_capacity(7);
    let mut day = anchor;
    for _ in 0..7 {
        out.push(day.to_string());
        day = day.succ();
    }
    out
}

fn tooltip(date: NaiveDate, value: f64, labels: &AxisLabels) -> String {
    format!(
        "{date} ({})\n{}: {}",
        date.weekday(),
        labels.value,
        format_value(value)
    )
}

/// Whole numbers print without a fractional part.
fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/vector.rs"]
mod tests;
