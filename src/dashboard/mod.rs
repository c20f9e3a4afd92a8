//! Page assembly.

/// Per-metric pipeline driver.
pub mod assembler;
/// Page and panel types.
pub mod model;
