//! `promocao-classe` library crate.
//!
//! Values a broadcast station's class promotion: the protected contour of the
//! proposed site is intersected with census sectors to find the municipalities
//! whose urban area it reaches, and their population is priced against the
//! state's reference city.
//!
//! The binary (`promocao`) is a thin wrapper around this library so the
//! pipeline is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod coverage;
pub mod data;
pub mod domain;
pub mod error;
pub mod geodesy;
pub mod io;
pub mod plot;
pub mod report;
pub mod tables;
pub mod valuation;
