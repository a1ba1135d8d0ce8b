//! Protected contour and coverage resolution.
//!
//! `contour` builds the buffered circle around the proposed station; `resolver`
//! intersects it with the census-sector dataset.

pub mod contour;
pub mod resolver;

pub use contour::*;
pub use resolver::*;
