use chrono::NaiveDate;

/// Result alias used across the crate.
pub type CalheatResult<T> = Result<T, CalheatError>;

/// Error taxonomy of the heatmap pipeline.
///
/// All variants are deterministic functions of the input; nothing here is transient or
/// worth retrying.
#[derive(thiserror::Error, Debug)]
pub enum CalheatError {
    /// A requested metric has no observations.
    #[error("empty series: metric \"{metric}\" has no observations")]
    EmptySeries {
        /// Metric name.
        metric: String,
    },

    /// Two observations of one metric share a date.
    #[error("duplicate date: metric \"{metric}\" has more than one observation on {date}")]
    DuplicateDate {
        /// Metric name.
        metric: String,
        /// The colliding date.
        date: NaiveDate,
    },

    /// A series range ends before it starts.
    #[error("invalid date range: {end} precedes {start}")]
    InvalidDateRange {
        /// Range start.
        start: NaiveDate,
        /// Range end.
        end: NaiveDate,
    },

    /// An observation value is negative or not finite.
    #[error("invalid value: metric \"{metric}\" on {date} has value {value}")]
    InvalidValue {
        /// Metric name.
        metric: String,
        /// Observation date.
        date: NaiveDate,
        /// Offending value.
        value: f64,
    },

    /// Structural precondition violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A renderer could not produce its output.
    #[error("render error: {0}")]
    Render(String),

    /// A reference image could not be read or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// Input/output encoding failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CalheatError {
    /// Build a [`CalheatError::EmptySeries`].
    pub fn empty_series(metric: impl Into<String>) -> Self {
        Self::EmptySeries {
            metric: metric.into(),
        }
    }

    /// Build a [`CalheatError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CalheatError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CalheatError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`CalheatError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
