//! Coverage map rendering.

pub mod coverage_map;

pub use coverage_map::*;
