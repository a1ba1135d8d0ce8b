//! Static classification tables and the lookups over them.
//!
//! - class order, groups and promotion periods (`classes`)
//! - per-state reference cities and transition values (`reference`)
//! - protected-contour radius per class/channel (`radius`)

pub mod classes;
pub mod radius;
pub mod reference;

pub use classes::*;
pub use radius::*;
pub use reference::*;
