//! Observation readers for the command-line front end.
//!
//! The pipeline itself only sees `&[RawObservation]`; these helpers turn the two supported
//! file shapes into that form.

use std::io::Read;

use chrono::NaiveDate;

use crate::foundation::core::RawObservation;
use crate::foundation::error::{CalheatError, CalheatResult};

/// Read a wide table: first column the date, every other column one metric.
///
/// Dates are `YYYY-MM-DD`, optionally followed by a time part which is ignored. Blank cells
/// are "no observation" rather than zero. Rows are emitted column by column within each
/// row, so metric discovery order follows the header.
#[tracing::instrument(skip_all)]
pub fn read_wide_csv<R: Read>(reader: R) -> CalheatResult<Vec<RawObservation>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| CalheatError::serde(format!("csv header: {e}")))?
        .clone();
    if headers.len() < 2 {
        return Err(CalheatError::validation(
            "csv needs a date column and at least one metric column",
        ));
    }
    let metrics: Vec<&str> = headers.iter().skip(1).collect();
    if let Some(blank) = metrics.iter().position(|m| m.is_empty()) {
        return Err(CalheatError::validation(format!(
            "csv metric column {} has an empty header",
            blank + 2
        )));
    }

    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let line = i + 2;
        let record = record.map_err(|e| CalheatError::serde(format!("csv line {line}: {e}")))?;
        let date_cell = record.get(0).unwrap_or_default();
        if date_cell.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }
        let date = parse_date(date_cell).ok_or_else(|| {
            CalheatError::validation(format!("csv line {line}: bad date '{date_cell}'"))
        })?;

        for (metric, cell) in metrics.iter().zip(record.iter().skip(1)) {
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| {
                CalheatError::validation(format!(
                    "csv line {line}: column '{metric}' is not a number: '{cell}'"
                ))
            })?;
            out.push(RawObservation::new(date, *metric, value));
        }
    }

    tracing::debug!(
        metrics = metrics.len(),
        observations = out.len(),
        "read wide csv"
    );
    Ok(out)
}

/// Read a JSON array of `{ "date", "metric", "value" }` objects.
pub fn read_json_observations<R: Read>(reader: R) -> CalheatResult<Vec<RawObservation>> {
    serde_json::from_reader(reader)
        .map_err(|e| CalheatError::serde(format!("json observations: {e}")))
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    let day = match cell.char_indices().nth(10) {
        Some((idx, 'T' | ' ')) => &cell[..idx],
        Some(_) => return None,
        None => cell,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
