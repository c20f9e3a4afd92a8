use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CalheatError, CalheatResult};
use crate::grid::mapper::CalendarGrid;

/// Largest accepted cell edge.
pub const MAX_CELL_PX: u32 = 256;
/// Largest accepted spacing between cells.
pub const MAX_GAP_PX: u32 = 256;

/// Vertical ordering of week rows.
///
/// This is always chosen explicitly; neither backend relies on an axis default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Earliest week on top, latest at the bottom.
    #[default]
    OldestFirst,
    /// Latest week on top (reversed chronological order).
    NewestFirst,
}

/// A day placed into a layout slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LayoutDay {
    /// Calendar day.
    pub date: NaiveDate,
    /// Day value.
    pub value: f64,
}

/// One display row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutRow {
    /// A week; slot `i` is weekday offset `i` from the week-anchor. Slots outside the series
    /// stay empty.
    Week {
        /// ISO week-year.
        year: i32,
        /// ISO week number.
        week: u32,
        /// Seven weekday slots.
        days: [Option<LayoutDay>; 7],
    },
    /// Separator between two adjacent rows of different ISO week-years.
    YearGap {
        /// Year of the row displayed above the gap.
        upper: i32,
        /// Year of the row displayed below the gap.
        lower: i32,
    },
}

impl LayoutRow {
    /// `true` for [`LayoutRow::YearGap`].
    pub fn is_gap(&self) -> bool {
        matches!(self, LayoutRow::YearGap { .. })
    }
}

/// Backend-independent row arrangement of a [`CalendarGrid`].
///
/// Both renderers draw from this, so they agree on row order, gap rows and slot positions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridLayout {
    order: RowOrder,
    rows: Vec<LayoutRow>,
}

impl GridLayout {
    /// Arrange `grid` into week rows with year-boundary gap rows.
    pub fn build(grid: &CalendarGrid, order: RowOrder) -> Self {
        let mut weeks: Vec<LayoutRow> = Vec::new();
        let mut current: Option<(i32, u32)> = None;

        for cell in grid.cells() {
            let key = cell.coord.row_key();
            if current != Some(key) {
                // Cells are in date order and each ISO week is contiguous, so a new key
                // always starts a new row.
                weeks.push(LayoutRow::Week {
                    year: key.0,
                    week: key.1,
                    days: [None; 7],
                });
                current = Some(key);
            }
            if let Some(LayoutRow::Week { days, .. }) = weeks.last_mut() {
                days[usize::from(cell.coord.weekday)] = Some(LayoutDay {
                    date: cell.date,
                    value: cell.value,
                });
            }
        }

        if order == RowOrder::NewestFirst {
            weeks.reverse();
        }

        let mut rows = Vec::with_capacity(weeks.len() + 4);
        let mut prev_year: Option<i32> = None;
        for row in weeks {
            if let LayoutRow::Week { year, .. } = row {
                if let Some(upper) = prev_year
                    && upper != year
                {
                    rows.push(LayoutRow::YearGap { upper, lower: year });
                }
                prev_year = Some(year);
            }
            rows.push(row);
        }

        Self { order, rows }
    }

    /// Row order used to build this layout.
    pub fn order(&self) -> RowOrder {
        self.order
    }

    /// Rows in display order, top first.
    pub fn rows(&self) -> &[LayoutRow] {
        &self.rows
    }

    /// Total rows, gaps included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of week rows.
    pub fn week_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_gap()).count()
    }

    /// Pixel geometry for square cells of `cell_px` separated by `gap_px`.
    ///
    /// Fails with [`CalheatError::Validation`] when the sizes are outside
    /// `1..=MAX_CELL_PX` / `0..=MAX_GAP_PX` or the grid height does not fit in `u32`.
    pub fn geometry(&self, cell_px: u32, gap_px: u32) -> CalheatResult<LayoutGeometry> {
        check_cell_sizes(cell_px, gap_px)?;
        let overflow = || {
            CalheatError::validation(format!(
                "grid of {} rows at cell_px {cell_px}, gap_px {gap_px} overflows u32",
                self.rows.len()
            ))
        };

        let mut row_tops = Vec::with_capacity(self.rows.len());
        let mut y = 0u32;
        for i in 0..self.rows.len() {
            if i > 0 {
                y = y.checked_add(gap_px).ok_or_else(overflow)?;
            }
            row_tops.push(y);
            // Gap rows are blank rows of the same height as a week.
            y = y.checked_add(cell_px).ok_or_else(overflow)?;
        }
        Ok(LayoutGeometry {
            cell_px,
            gap_px,
            width: 7 * cell_px + 6 * gap_px,
            height: y,
            row_tops,
        })
    }
}

/// Check cell and gap sizes against [`MAX_CELL_PX`] and [`MAX_GAP_PX`].
pub fn check_cell_sizes(cell_px: u32, gap_px: u32) -> CalheatResult<()> {
    if cell_px == 0 || cell_px > MAX_CELL_PX {
        return Err(CalheatError::validation(format!(
            "cell_px must be in 1..={MAX_CELL_PX}, got {cell_px}"
        )));
    }
    if gap_px > MAX_GAP_PX {
        return Err(CalheatError::validation(format!(
            "gap_px must be in 0..={MAX_GAP_PX}, got {gap_px}"
        )));
    }
    Ok(())
}

/// Pixel placement of a [`GridLayout`], relative to the grid's top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutGeometry {
    /// Cell edge length.
    pub cell_px: u32,
    /// Spacing between rows and columns.
    pub gap_px: u32,
    /// Grid width.
    pub width: u32,
    /// Grid height (0 for an empty layout).
    pub height: u32,
    /// Top edge of each row, in layout row order.
    pub row_tops: Vec<u32>,
}

impl LayoutGeometry {
    /// Left edge of weekday column `col`.
    pub fn column_left(&self, col: usize) -> u32 {
        col as u32 * (self.cell_px + self.gap_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
