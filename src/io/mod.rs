//! Input/output helpers.
//!
//! - input form load + validation (`form`)
//! - result exports (JSON/CSV) (`export`)

pub mod export;
pub mod form;

pub use export::*;
pub use form::*;
