//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the coverage resolver, the valuation engine and the assembler
//! - exported to JSON/CSV for the document renderers
//! - compared in tests (the engine is deterministic)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::EngineError;

/// Sentinel text used wherever a value does not apply to the class change.
pub const NOT_APPLICABLE_LABEL: &str = "não se aplica";

/// Station technical class, declared from lowest to highest.
///
/// The derived `Ord` is the regulatory class order, so comparisons between
/// classes are comparisons of positions in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ClassCode {
    C,
    B2,
    B1,
    A4,
    A3,
    A2,
    A1,
    E3,
    E2,
    E1,
}

impl ClassCode {
    /// Every class, lowest first.
    pub const ORDER: [ClassCode; 10] = [
        ClassCode::C,
        ClassCode::B2,
        ClassCode::B1,
        ClassCode::A4,
        ClassCode::A3,
        ClassCode::A2,
        ClassCode::A1,
        ClassCode::E3,
        ClassCode::E2,
        ClassCode::E1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClassCode::C => "C",
            ClassCode::B2 => "B2",
            ClassCode::B1 => "B1",
            ClassCode::A4 => "A4",
            ClassCode::A3 => "A3",
            ClassCode::A2 => "A2",
            ClassCode::A1 => "A1",
            ClassCode::E3 => "E3",
            ClassCode::E2 => "E2",
            ClassCode::E1 => "E1",
        }
    }

    /// Position in the class order (0 = lowest).
    pub fn rank(self) -> usize {
        self as usize
    }
}

impl FromStr for ClassCode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        ClassCode::ORDER
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| EngineError::UnknownClass(code.to_string()))
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse charging tier. Ordering `A < B < C` is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Group {
    A,
    B,
    C,
}

impl Group {
    pub fn letter(self) -> char {
        match self {
            Group::A => 'A',
            Group::B => 'B',
            Group::C => 'C',
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A value that only exists when the class change is a promotion.
///
/// Used for the time-to-promotion and for `Vpc` so callers cannot do arithmetic
/// on a "not applicable" outcome by accident.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applicability<T> {
    Applicable(T),
    NotApplicable,
}

impl<T: Copy> Applicability<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Applicability::Applicable(v) => Some(*v),
            Applicability::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Applicability::Applicable(_))
    }
}

impl<T: fmt::Display> fmt::Display for Applicability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applicability::Applicable(v) => write!(f, "{v}"),
            Applicability::NotApplicable => f.write_str(NOT_APPLICABLE_LABEL),
        }
    }
}

// Renderers expect either the number or the sentinel text in the same key.
impl<T: Serialize> Serialize for Applicability<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Applicability::Applicable(v) => v.serialize(serializer),
            Applicability::NotApplicable => serializer.serialize_str(NOT_APPLICABLE_LABEL),
        }
    }
}

/// Time-to-promotion in years.
pub type PromotionPeriod = Applicability<u32>;

/// Outcome of comparing two class codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassChange {
    Unchanged,
    Promoted,
    Demoted,
    OneUnknown,
    BothUnknown,
}

/// Outcome of comparing the groups of two classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChange {
    Unchanged(Group),
    Promoted { from: Group, to: Group },
    Demoted { from: Group, to: Group },
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Gradual,
    NonGradual,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRequirement {
    NoCharge,
    Required,
    NotApplicable,
}

/// Administrative data of the licensing process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub process_number: String,
    pub service: String,
    pub entity: String,
    pub purpose: String,
    pub public_consultation: String,
}

/// One station situation (current or proposed), immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSite {
    pub municipality: String,
    /// Upper-case state abbreviation, e.g. `SP`.
    pub state: String,
    /// Upper-case class code as typed; validated by the engine.
    pub class: String,
    pub channel: u32,
    /// Sexagesimal latitude, e.g. `23°32'51" S`.
    pub latitude: String,
    /// Sexagesimal longitude, e.g. `46°38'10" W`.
    pub longitude: String,
}

/// A validated calculation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRequest {
    pub process: ProcessInfo,
    pub current: StationSite,
    pub proposed: StationSite,
}

/// A municipality whose urban area is reached by the protected contour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoveredMunicipality {
    pub code: String,
    pub state_name: String,
    pub name: String,
    pub population: u64,
}

impl fmt::Display for CoveredMunicipality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.state_name, self.name, self.population)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, `.env` and environment variables (plus defaults).
#[derive(Debug, Clone)]
pub struct CalcConfig {
    pub input: PathBuf,
    pub sectors_path: PathBuf,
    pub states_path: PathBuf,
    pub ipca_fallback_path: PathBuf,

    /// Skip the remote index source and use the bundled series only.
    pub offline: bool,
    /// Skip monetary index correction entirely.
    pub skip_index: bool,

    pub output: Option<PathBuf>,
    pub export_covered: Option<PathBuf>,
    /// Keep the temporary coverage map instead of deleting it after the run.
    pub keep_map: bool,
}
