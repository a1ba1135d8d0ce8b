use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the valuation engine and its data collaborators.
///
/// Geometry and classification errors propagate unmodified to the caller; the
/// application layer converts them into an [`AppError`] with a stable exit code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed sexagesimal coordinate or numeric field.
    #[error("invalid {field} '{value}': {reason}")]
    Format {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Required input fields are empty or still hold the form placeholder.
    #[error("required fields missing or still holding the placeholder: {}", .0.join(", "))]
    IncompleteForm(Vec<String>),

    /// Class code outside the fixed class order.
    #[error("unknown station class '{0}'")]
    UnknownClass(String),

    /// Proposed municipality absent from the geographic dataset.
    ///
    /// Non-fatal inside the pipeline: it is logged and the municipality code
    /// degrades to "not found".
    #[error("municipality '{municipality}' not found in state '{state}'")]
    MunicipalityNotFound { municipality: String, state: String },

    /// The reference municipality has zero population, so `Vpc` is undefined.
    #[error("reference population for '{reference}' is zero; cannot compute the promotion value")]
    ReferencePopulation { reference: String },

    /// The proposed group has no reference city (group A, or a state outside
    /// the table), so there is no reference population to divide by.
    #[error("no reference city applies to group {group} in state '{state}'; the promotion value needs a reference population")]
    NoReferenceCity { state: String, group: char },

    /// A transition value was needed but the reference table has no entry.
    #[error("no reference value for state '{state}' in group {group}")]
    MissingReferenceValue { state: String, group: char },

    /// Geographic or reference-name file missing or corrupt.
    #[error("failed to load {what} '{}': {reason}", path.display())]
    DatasetLoad {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Result, export or map file could not be written.
    #[error("failed to write {what} '{}': {reason}", path.display())]
    Output {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Projection or contour construction failed.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Both the remote and the bundled index sources failed.
    #[error("monetary index correction unavailable: {0}")]
    IndexCorrection(String),
}

impl EngineError {
    pub fn format(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn output(what: &'static str, path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Output {
            what,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn dataset(what: &'static str, path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::DatasetLoad {
            what,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Process exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::DatasetLoad { .. } | EngineError::IncompleteForm(_) | EngineError::Output { .. } => 2,
            EngineError::Format { .. } | EngineError::UnknownClass(_) => 3,
            EngineError::MunicipalityNotFound { .. }
            | EngineError::ReferencePopulation { .. }
            | EngineError::NoReferenceCity { .. }
            | EngineError::MissingReferenceValue { .. }
            | EngineError::Geometry(_)
            | EngineError::IndexCorrection(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_stable_exit_codes() {
        let err: AppError = EngineError::UnknownClass("X9".to_string()).into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("X9"));

        let err: AppError = EngineError::dataset("census sectors", "/nope.geojson", "missing").into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("/nope.geojson"));

        let err: AppError = EngineError::ReferencePopulation {
            reference: "Campinas".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 4);
    }
}
