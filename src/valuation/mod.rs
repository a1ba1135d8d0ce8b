//! Population aggregation and the promotion valuation.

pub mod engine;
pub mod population;

pub use engine::*;
pub use population::*;
