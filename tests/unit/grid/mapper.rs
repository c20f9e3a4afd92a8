use std::collections::HashSet;

use super::*;
use crate::foundation::core::RawObservation;
use crate::series::normalize::normalize;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dense(start: NaiveDate, values: Vec<f64>) -> DenseSeries {
    let end = start + chrono::Duration::days(values.len() as i64 - 1);
    DenseSeries::from_parts("m", start, end, values).unwrap()
}

#[test]
fn december_31_in_iso_week_one_groups_under_next_year() {
    // 2024-12-31 is a Tuesday in ISO week 2025-W01.
    let c = GridCoordinate::of(d(2024, 12, 31), Weekday::Sun);
    assert_eq!(c.year, 2025);
    assert_eq!(c.week, 1);
    assert_eq!(c.weekday, 2);
}

#[test]
fn early_january_in_week_53_groups_under_previous_year() {
    // 2021-01-01 is a Friday in ISO week 2020-W53.
    let c = GridCoordinate::of(d(2021, 1, 1), Weekday::Mon);
    assert_eq!((c.year, c.week, c.weekday), (2020, 53, 4));
}

#[test]
fn mapper_is_a_bijection_across_year_boundaries() {
    let start = d(2019, 12, 1);
    let values: Vec<f64> = (0..800).map(|i| f64::from(i % 13)).collect();
    let series = dense(start, values);
    for anchor in [Weekday::Sun, Weekday::Mon, Weekday::Sat] {
        let grid = to_grid(&series, anchor).unwrap();
        assert_eq!(grid.len(), series.len());

        let coords: HashSet<GridCoordinate> = grid.cells().iter().map(|c| c.coord).collect();
        assert_eq!(coords.len(), series.len());

        for (cell, (date, value)) in grid.cells().iter().zip(series.iter()) {
            assert_eq!(cell.date, date);
            assert_eq!(cell.value, value);
            assert!((1..=53).contains(&cell.coord.week));
            assert!(cell.coord.weekday <= 6);
            assert_eq!(grid.get_date(date).map(|c| c.value), Some(value));
        }
    }
}

#[test]
fn iso_week_days_share_one_row() {
    let series = dense(d(2024, 12, 29), vec![1.0; 14]);
    let grid = to_grid(&series, Weekday::Sun).unwrap();
    // Mon 2024-12-30 ..= Sun 2025-01-05 is ISO 2025-W01.
    let row: Vec<&GridCell> = grid
        .cells()
        .iter()
        .filter(|c| c.coord.row_key() == (2025, 1))
        .collect();
    assert_eq!(row.len(), 7);
    assert_eq!(row[0].date, d(2024, 12, 30));
    assert_eq!(row[6].date, d(2025, 1, 5));
    assert_eq!(grid.row_keys(), vec![(2024, 52), (2025, 1), (2025, 2)]);
}

#[test]
fn value_range_tracks_min_and_max() {
    let grid = to_grid(&dense(d(2024, 1, 7), vec![0.0, 4.0, 2.0]), Weekday::Sun).unwrap();
    assert_eq!(grid.range(), ValueRange { min: 0.0, max: 4.0 });
    assert_eq!(grid.total(), 6.0);
    assert_eq!(grid.range().normalize(2.0), 0.5);
}

#[test]
fn all_zero_range_normalizes_to_zero() {
    let r = ValueRange::of(&[0.0; 7]);
    assert_eq!(r, ValueRange { min: 0.0, max: 0.0 });
    assert_eq!(r.normalize(0.0), 0.0);
    assert_eq!(ValueRange::of(&[]), ValueRange { min: 0.0, max: 0.0 });
}

#[test]
fn pipeline_example_maps_eleven_days() {
    let raw = vec![
        RawObservation::new(d(2024, 1, 3), "visits", 5.0),
        RawObservation::new(d(2024, 1, 10), "visits", 2.0),
    ];
    let series = normalize(&raw, "visits", Weekday::Sun).unwrap();
    let grid = to_grid(&series, Weekday::Sun).unwrap();
    assert_eq!(grid.len(), 11);

    let first = grid.get_date(d(2023, 12, 31)).unwrap();
    assert_eq!(first.coord, GridCoordinate {
        year: 2023,
        week: 52,
        weekday: 0
    });
    let jan3 = grid.get_date(d(2024, 1, 3)).unwrap();
    assert_eq!(jan3.coord, GridCoordinate {
        year: 2024,
        week: 1,
        weekday: 3
    });
    assert_eq!(jan3.value, 5.0);
}
