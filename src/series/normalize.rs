use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use crate::foundation::core::{RawObservation, anchor_on_or_before};
use crate::foundation::error::{CalheatError, CalheatResult};

/// Observed values of one metric, keyed by date.
///
/// Only days that were actually observed are present; see [`MetricSeries::densify`] for the
/// gap-filled form.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSeries {
    metric: String,
    values: BTreeMap<NaiveDate, f64>,
}

impl MetricSeries {
    /// Collect the observations of `metric` out of a mixed raw log.
    ///
    /// Fails with [`CalheatError::EmptySeries`] when nothing matches, with
    /// [`CalheatError::DuplicateDate`] when a date repeats, and with
    /// [`CalheatError::InvalidValue`] for negative or non-finite values.
    pub fn collect(raw: &[RawObservation], metric: &str) -> CalheatResult<Self> {
        let mut values = BTreeMap::new();
        for obs in raw.iter().filter(|o| o.metric == metric) {
            obs.validate()?;
            if values.insert(obs.date, obs.value).is_some() {
                return Err(CalheatError::DuplicateDate {
                    metric: metric.to_owned(),
                    date: obs.date,
                });
            }
        }
        if values.is_empty() {
            return Err(CalheatError::empty_series(metric));
        }
        Ok(Self {
            metric: metric.to_owned(),
            values,
        })
    }

    /// Metric name.
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Number of observed days.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; construction rejects empty series.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Earliest observed date.
    pub fn min_date(&self) -> NaiveDate {
        // Non-empty by construction.
        *self.values.keys().next().unwrap_or(&NaiveDate::MIN)
    }

    /// Latest observed date.
    pub fn max_date(&self) -> NaiveDate {
        *self.values.keys().next_back().unwrap_or(&NaiveDate::MIN)
    }

    /// Fill every day from the anchor day on or before the first observation through the
    /// last observation; unobserved days become `0`.
    pub fn densify(&self, anchor: Weekday) -> CalheatResult<DenseSeries> {
        let start = anchor_on_or_before(self.min_date(), anchor);
        let end = self.max_date();
        let span = days_inclusive(start, end)?;

        let mut values = vec![0.0; span];
        for (date, v) in &self.values {
            let idx = (*date - start).num_days() as usize;
            values[idx] = *v;
        }

        DenseSeries::from_parts(self.metric.clone(), start, end, values)
    }
}

/// Gap-free daily series from `anchor_start` through `end`, inclusive.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DenseSeries {
    metric: String,
    anchor_start: NaiveDate,
    end: NaiveDate,
    values: Vec<f64>,
}

impl DenseSeries {
    /// Build a dense series from an explicit range and one value per day.
    pub fn from_parts(
        metric: impl Into<String>,
        anchor_start: NaiveDate,
        end: NaiveDate,
        values: Vec<f64>,
    ) -> CalheatResult<Self> {
        let span = days_inclusive(anchor_start, end)?;
        if values.len() != span {
            return Err(CalheatError::validation(format!(
                "dense series needs {span} values for {anchor_start}..={end}, got {}",
                values.len()
            )));
        }
        Ok(Self {
            metric: metric.into(),
            anchor_start,
            end,
            values,
        })
    }

    /// Metric name.
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// First day of the series (always on the week-anchor weekday when built by
    /// [`normalize`]).
    pub fn anchor_start(&self) -> NaiveDate {
        self.anchor_start
    }

    /// Last day of the series (the latest observation).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Never true for a series built by [`normalize`].
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Day values in date order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value on `date`, or `None` outside the range.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        if date < self.anchor_start || date > self.end {
            return None;
        }
        let idx = (date - self.anchor_start).num_days() as usize;
        self.values.get(idx).copied()
    }

    /// `(date, value)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.anchor_start
            .iter_days()
            .zip(self.values.iter().copied())
    }
}

/// Gap-fill one metric of a raw observation log.
///
/// The series starts on the most recent `anchor` weekday on or before the first observation
/// and ends on the last observation.
#[tracing::instrument(skip(raw), fields(observations = raw.len()))]
pub fn normalize(
    raw: &[RawObservation],
    metric: &str,
    anchor: Weekday,
) -> CalheatResult<DenseSeries> {
    let series = MetricSeries::collect(raw, metric)?;
    let dense = series.densify(anchor)?;
    tracing::debug!(
        observed = series.len(),
        days = dense.len(),
        start = %dense.anchor_start(),
        end = %dense.end(),
        "normalized series"
    );
    Ok(dense)
}

/// Metric names in order of first appearance.
pub fn discover_metrics(raw: &[RawObservation]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for obs in raw {
        if seen.insert(obs.metric.as_str()) {
            out.push(obs.metric.clone());
        }
    }
    out
}

fn days_inclusive(start: NaiveDate, end: NaiveDate) -> CalheatResult<usize> {
    if end < start {
        return Err(CalheatError::InvalidDateRange { start, end });
    }
    Ok((end - start).num_days() as usize + 1)
}

#[cfg(test)]
#[path = "../../tests/unit/series/normalize.rs"]
mod tests;
