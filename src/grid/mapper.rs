use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::foundation::core::weekday_offset;
use crate::foundation::error::{CalheatError, CalheatResult};
use crate::series::normalize::DenseSeries;

/// Calendar-grid address of one day.
///
/// `year` is the ISO week-year, not the calendar year, so all days of a week share it.
/// Ordering is `(year, week, weekday)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GridCoordinate {
    /// ISO 8601 week-numbering year.
    pub year: i32,
    /// ISO week number, `1..=53`.
    pub week: u32,
    /// Offset from the week-anchor day, `0..=6`.
    pub weekday: u8,
}

impl GridCoordinate {
    /// Address of `date` for the given week-anchor.
    pub fn of(date: NaiveDate, anchor: Weekday) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
            weekday: weekday_offset(date.weekday(), anchor),
        }
    }

    /// `(year, week)` row key.
    pub fn row_key(self) -> (i32, u32) {
        (self.year, self.week)
    }
}

/// Inclusive value bounds of a grid, used for color scaling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValueRange {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl ValueRange {
    /// Bounds of `values`; `0..=0` for an empty slice.
    pub fn of(values: &[f64]) -> Self {
        let mut it = values.iter().copied();
        let Some(first) = it.next() else {
            return Self { min: 0.0, max: 0.0 };
        };
        let (min, max) = it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Self { min, max }
    }

    /// Position of `value` inside the range in `0..=1`.
    ///
    /// A degenerate range (`max <= min`) maps everything to `0`.
    pub fn normalize(self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span.is_nan() || span <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// One day of a calendar grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridCell {
    /// Grid address.
    pub coord: GridCoordinate,
    /// Calendar day.
    pub date: NaiveDate,
    /// Day value, unchanged from the dense series.
    pub value: f64,
}

/// Dense series laid out by `(ISO week-year, ISO week, weekday offset)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalendarGrid {
    metric: String,
    week_anchor: Weekday,
    range: ValueRange,
    cells: Vec<GridCell>,
    #[serde(skip)]
    index: BTreeMap<GridCoordinate, usize>,
}

impl CalendarGrid {
    /// Metric name.
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Weekday occupying column 0.
    pub fn week_anchor(&self) -> Weekday {
        self.week_anchor
    }

    /// Value bounds over all cells.
    pub fn range(&self) -> ValueRange {
        self.range
    }

    /// Cells in date order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Number of cells (equal to the number of days in the source series).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` for a grid without days.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `coord`.
    pub fn get(&self, coord: GridCoordinate) -> Option<&GridCell> {
        self.index.get(&coord).map(|&i| &self.cells[i])
    }

    /// Cell for `date`.
    pub fn get_date(&self, date: NaiveDate) -> Option<&GridCell> {
        self.get(GridCoordinate::of(date, self.week_anchor))
            .filter(|c| c.date == date)
    }

    /// Sum of all cell values.
    pub fn total(&self) -> f64 {
        self.cells.iter().map(|c| c.value).sum()
    }

    /// Distinct `(year, week)` rows in chronological order.
    pub fn row_keys(&self) -> Vec<(i32, u32)> {
        let mut keys: Vec<(i32, u32)> = self.index.keys().map(|c| c.row_key()).collect();
        keys.dedup();
        keys
    }
}

/// Map every day of `series` to its grid coordinate.
///
/// The mapping is one-to-one; a coordinate collision means the input was not a well-formed
/// daily series and is reported rather than silently merged.
#[tracing::instrument(skip(series), fields(metric = series.metric(), days = series.len()))]
pub fn to_grid(series: &DenseSeries, anchor: Weekday) -> CalheatResult<CalendarGrid> {
    let mut cells = Vec::with_capacity(series.len());
    let mut index = BTreeMap::new();

    for (date, value) in series.iter() {
        let coord = GridCoordinate::of(date, anchor);
        if let Some(prev) = index.insert(coord, cells.len()) {
            let prev: &GridCell = &cells[prev];
            return Err(CalheatError::validation(format!(
                "grid coordinate collision: {} and {date} both map to {}-W{:02} day {}",
                prev.date, coord.year, coord.week, coord.weekday
            )));
        }
        cells.push(GridCell { coord, date, value });
    }

    Ok(CalendarGrid {
        metric: series.metric().to_owned(),
        week_anchor: anchor,
        range: ValueRange::of(series.values()),
        cells,
        index,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/grid/mapper.rs"]
mod tests;
