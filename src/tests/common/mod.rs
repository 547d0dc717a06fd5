//! Common Test Utilities
//!
//! Shared fixtures used across test modules:
//! - Rendered letter pages with known references (`fixtures`)
//! - A fixed-geometry [`Layout`](crate::core::tooltip::Layout) for tooltip tests

pub mod fixtures;

pub use fixtures::*;
