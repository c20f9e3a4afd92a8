use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CalheatError, CalheatResult};

pub use kurbo::Rect;

/// One raw `(date, metric, value)` record as delivered by ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Calendar day of the observation.
    pub date: NaiveDate,
    /// Metric (column) name.
    pub metric: String,
    /// Non-negative event count.
    pub value: f64,
}

impl RawObservation {
    /// Create an observation.
    pub fn new(date: NaiveDate, metric: impl Into<String>, value: f64) -> Self {
        Self {
            date,
            metric: metric.into(),
            value,
        }
    }

    /// Reject negative or non-finite values.
    pub fn validate(&self) -> CalheatResult<()> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(CalheatError::InvalidValue {
                metric: self.metric.clone(),
                date: self.date,
                value: self.value,
            });
        }
        Ok(())
    }
}

/// Offset of `day` from the week-anchor day, in `0..=6`.
pub fn weekday_offset(day: Weekday, anchor: Weekday) -> u8 {
    let d = day.num_days_from_monday();
    let a = anchor.num_days_from_monday();
    ((d + 7 - a) % 7) as u8
}

/// Most recent `anchor` weekday on or before `date`.
pub fn anchor_on_or_before(date: NaiveDate, anchor: Weekday) -> NaiveDate {
    let back = weekday_offset(date.weekday(), anchor);
    date - chrono::Duration::days(i64::from(back))
}

/// Opaque 8-bit sRGB color.
///
/// Serializes as a `#rrggbb` hex string so page models stay readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`, lowercase.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` (leading `#` optional, case-insensitive).
    pub fn parse_hex(s: &str) -> CalheatResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return Err(CalheatError::validation(format!(
                "hex color must be #RRGGBB, got \"{s}\""
            )));
        }
        let byte = |pair: &str| {
            u8::from_str_radix(pair, 16)
                .map_err(|_| CalheatError::validation(format!("invalid hex byte \"{pair}\"")))
        };
        Ok(Self::new(byte(&s[0..2])?, byte(&s[2..4])?, byte(&s[4..6])?))
    }

    /// Opaque RGBA8 pixel.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// Linear interpolation per channel, `t` clamped to `0..=1`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
