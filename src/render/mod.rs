//! Heatmap renderers.
//!
//! Both variants consume a [`crate::CalendarGrid`] through [`backend::HeatmapRenderer`] and
//! share the row layout in [`layout`] and the color ramp in [`palette`], so a day gets the
//! same color whichever renderer drew it.

/// Renderer trait, settings and factory.
pub mod backend;
/// Week rows and pixel geometry.
pub mod layout;
/// Sequential color scales.
pub mod palette;
/// Bitmap renderer with reference-image stacking.
pub mod raster;
/// Interactive-style vector renderer.
pub mod vector;
