use chrono::Datelike;

use super::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn obs(date: NaiveDate, metric: &str, value: f64) -> RawObservation {
    RawObservation::new(date, metric, value)
}

#[test]
fn visits_example_fills_back_to_sunday() {
    let raw = vec![
        obs(d(2024, 1, 3), "visits", 5.0),
        obs(d(2024, 1, 10), "visits", 2.0),
    ];
    let dense = normalize(&raw, "visits", Weekday::Sun).unwrap();

    assert_eq!(dense.anchor_start(), d(2023, 12, 31));
    assert_eq!(dense.end(), d(2024, 1, 10));
    assert_eq!(dense.len(), 11);
    assert_eq!(dense.get(d(2024, 1, 3)), Some(5.0));
    assert_eq!(dense.get(d(2024, 1, 10)), Some(2.0));
    for (date, v) in dense.iter() {
        if date != d(2024, 1, 3) && date != d(2024, 1, 10) {
            assert_eq!(v, 0.0, "{date} should be zero-filled");
        }
    }
}

#[test]
fn dense_range_is_contiguous_and_anchored() {
    let raw = vec![
        obs(d(2025, 5, 15), "a", 1.0),
        obs(d(2025, 5, 1), "a", 3.0),
        obs(d(2025, 6, 2), "a", 4.0),
        obs(d(2025, 5, 20), "b", 9.0),
    ];
    for anchor in [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ] {
        let dense = normalize(&raw, "a", anchor).unwrap();
        let start = dense.anchor_start();
        assert_eq!(start.weekday(), anchor);
        let lead = (d(2025, 5, 1) - start).num_days();
        assert!((0..=6).contains(&lead), "lead {lead} for {anchor}");

        let dates: Vec<NaiveDate> = dense.iter().map(|(date, _)| date).collect();
        let expected = (dense.end() - start).num_days() as usize + 1;
        assert_eq!(dates.len(), expected);
        for pair in dates.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_days(), 1);
        }
        assert_eq!(dates.last().copied(), Some(d(2025, 6, 2)));
    }
}

#[test]
fn start_already_on_anchor_is_kept() {
    let raw = vec![obs(d(2023, 12, 31), "x", 1.0)];
    let dense = normalize(&raw, "x", Weekday::Sun).unwrap();
    assert_eq!(dense.anchor_start(), d(2023, 12, 31));
    assert_eq!(dense.len(), 1);
}

#[test]
fn missing_metric_is_empty_series() {
    let raw = vec![obs(d(2024, 1, 3), "visits", 5.0)];
    let err = normalize(&raw, "x", Weekday::Sun).unwrap_err();
    assert!(matches!(err, CalheatError::EmptySeries { ref metric } if metric == "x"));
}

#[test]
fn duplicate_dates_are_rejected() {
    let raw = vec![
        obs(d(2024, 1, 3), "visits", 5.0),
        obs(d(2024, 1, 3), "visits", 1.0),
    ];
    let err = normalize(&raw, "visits", Weekday::Sun).unwrap_err();
    assert!(matches!(err, CalheatError::DuplicateDate { date, .. } if date == d(2024, 1, 3)));
}

#[test]
fn same_date_in_different_metrics_is_fine() {
    let raw = vec![obs(d(2024, 1, 3), "a", 5.0), obs(d(2024, 1, 3), "b", 1.0)];
    assert!(normalize(&raw, "a", Weekday::Sun).is_ok());
    assert!(normalize(&raw, "b", Weekday::Sun).is_ok());
}

#[test]
fn negative_values_are_rejected() {
    let raw = vec![obs(d(2024, 1, 3), "a", -2.0)];
    let err = normalize(&raw, "a", Weekday::Sun).unwrap_err();
    assert!(matches!(err, CalheatError::InvalidValue { .. }));
}

#[test]
fn from_parts_validates_range_and_length() {
    let err = DenseSeries::from_parts("a", d(2024, 1, 10), d(2024, 1, 1), vec![]).unwrap_err();
    assert!(matches!(err, CalheatError::InvalidDateRange { .. }));

    let err =
        DenseSeries::from_parts("a", d(2024, 1, 1), d(2024, 1, 3), vec![0.0, 1.0]).unwrap_err();
    assert!(matches!(err, CalheatError::Validation(_)));

    let ok = DenseSeries::from_parts("a", d(2024, 1, 1), d(2024, 1, 3), vec![0.0, 1.0, 2.0])
        .unwrap();
    assert_eq!(ok.get(d(2024, 1, 3)), Some(2.0));
    assert_eq!(ok.get(d(2024, 1, 4)), None);
}

#[test]
fn metric_discovery_keeps_first_seen_order() {
    let raw = vec![
        obs(d(2024, 1, 1), "deer", 1.0),
        obs(d(2024, 1, 1), "bear", 1.0),
        obs(d(2024, 1, 2), "deer", 1.0),
        obs(d(2024, 1, 2), "fox", 1.0),
    ];
    assert_eq!(discover_metrics(&raw), vec!["deer", "bear", "fox"]);
}

#[test]
fn normalize_is_deterministic() {
    let raw = vec![
        obs(d(2024, 3, 9), "a", 3.0),
        obs(d(2024, 2, 1), "a", 1.0),
    ];
    let a = normalize(&raw, "a", Weekday::Sun).unwrap();
    let b = normalize(&raw, "a", Weekday::Sun).unwrap();
    assert_eq!(a, b);
}
