/// Reference image decoding (raster formats and SVG).
pub mod decode;
/// Reference image lookup by metric name.
pub mod store;
