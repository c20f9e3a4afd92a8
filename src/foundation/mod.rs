/// Shared value types and date helpers.
pub mod core;
/// Crate error type.
pub mod error;
