//! Raw observation log to dense, anchor-aligned daily series.

/// Per-metric collection and densification.
pub mod normalize;
