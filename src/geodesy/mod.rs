//! Coordinate utilities: sexagesimal parsing and the metric projection used to
//! buffer protected contours.

pub mod dms;
pub mod polyconic;

pub use dms::*;
pub use polyconic::*;
