//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - classification enums (`ClassCode`, `Group`, `ClassChange`, `ChangeKind`, `PaymentRequirement`)
//! - the `Applicability` sum type for values that only exist for promotions
//! - request/site types (`PromotionRequest`, `StationSite`, `ProcessInfo`)
//! - coverage outputs (`CoveredMunicipality`) and the run configuration (`CalcConfig`)

pub mod types;

pub use types::*;
