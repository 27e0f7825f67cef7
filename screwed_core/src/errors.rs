//! # Error Types
//!
//! Structured error types for screwed_core. Every variant carries enough
//! context for a caller to decide what to do next: which slot conflicts with
//! which sources, which operator was rejected, which input failed to parse.
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::errors::{CalcError, CalcResult};
//!
//! fn validate_pitch(pitch: f64) -> CalcResult<()> {
//!     if pitch <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "pitch",
//!             pitch.to_string(),
//!             "Pitch must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for screwed_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// Arithmetic between incompatible operands, or an operator that
    /// tolerance stacking does not define (division, power, ...)
    #[error("Unsupported operation: {operation} with {operand}")]
    UnsupportedOperation { operation: String, operand: String },

    /// Scale factor is not a whole number
    #[error("Scale factor {factor} is not integral")]
    NonIntegralScale { factor: f64 },

    /// Direct assignment to a slot that is already derived from other slots
    #[error("'{slot}' already defined through: {}", quoted(.sources))]
    AlreadyDefined { slot: String, sources: Vec<String> },

    /// Deletion of a slot whose value comes from other slots
    #[error("'{slot}' cannot be deleted. Defined through: {}", quoted(.sources))]
    ConflictingSource { slot: String, sources: Vec<String> },

    /// A dimension group resolved to a physically invalid combination
    #[error("Impossible geometry for '{group}': {reason}")]
    ImpossibleGeometry { group: String, reason: String },

    /// Slot has no direct value and no rule could derive it
    #[error("'{slot}' is not defined")]
    AttributeNotDefined { slot: String },

    /// Slot name was never declared on the graph
    #[error("Unknown parameter: '{slot}'")]
    UnknownSlot { slot: String },

    /// Slot is computed only and cannot be set or deleted explicitly
    #[error("'{slot}' cannot be explicitly set")]
    ReadOnlySlot { slot: String },

    /// An input value is invalid (out of range, wrong sign, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Text input could not be parsed
    #[error("Parse error in '{input}' at {position}: {reason}")]
    ParseError {
        input: String,
        position: usize,
        reason: String,
    },

    /// A formula was evaluated outside its validity range
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON or CSV serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Workbook schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

fn quoted(sources: &[String]) -> String {
    sources
        .iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}

impl CalcError {
    /// Create an UnsupportedOperation error
    pub fn unsupported(operation: impl Into<String>, operand: impl Into<String>) -> Self {
        CalcError::UnsupportedOperation {
            operation: operation.into(),
            operand: operand.into(),
        }
    }

    /// Create an AlreadyDefined error
    pub fn already_defined(slot: impl Into<String>, sources: Vec<String>) -> Self {
        CalcError::AlreadyDefined {
            slot: slot.into(),
            sources,
        }
    }

    /// Create a ConflictingSource error
    pub fn conflicting_source(slot: impl Into<String>, sources: Vec<String>) -> Self {
        CalcError::ConflictingSource {
            slot: slot.into(),
            sources,
        }
    }

    /// Create an ImpossibleGeometry error
    pub fn impossible_geometry(group: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::ImpossibleGeometry {
            group: group.into(),
            reason: reason.into(),
        }
    }

    /// Create an AttributeNotDefined error
    pub fn not_defined(slot: impl Into<String>) -> Self {
        CalcError::AttributeNotDefined { slot: slot.into() }
    }

    /// Create an UnknownSlot error
    pub fn unknown_slot(slot: impl Into<String>) -> Self {
        CalcError::UnknownSlot { slot: slot.into() }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a ParseError
    pub fn parse(input: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        CalcError::ParseError {
            input: input.into(),
            position,
            reason: reason.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Slots named by a graph conflict, if this is one.
    pub fn conflicting_slots(&self) -> Option<&[String]> {
        match self {
            CalcError::AlreadyDefined { sources, .. } | CalcError::ConflictingSource { sources, .. } => {
                Some(sources)
            }
            _ => None,
        }
    }

    /// Check if the caller can recover by changing inputs and retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::UnsupportedOperation { .. }
                | CalcError::AlreadyDefined { .. }
                | CalcError::ConflictingSource { .. }
                | CalcError::AttributeNotDefined { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            CalcError::NonIntegralScale { .. } => "NON_INTEGRAL_SCALE",
            CalcError::AlreadyDefined { .. } => "ALREADY_DEFINED",
            CalcError::ConflictingSource { .. } => "CONFLICTING_SOURCE",
            CalcError::ImpossibleGeometry { .. } => "IMPOSSIBLE_GEOMETRY",
            CalcError::AttributeNotDefined { .. } => "ATTRIBUTE_NOT_DEFINED",
            CalcError::UnknownSlot { .. } => "UNKNOWN_SLOT",
            CalcError::ReadOnlySlot { .. } => "READ_ONLY_SLOT",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::ParseError { .. } => "PARSE_ERROR",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError { reason: e.to_string() }
    }
}

impl From<csv::Error> for CalcError {
    fn from(e: csv::Error) -> Self {
        CalcError::SerializationError { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::already_defined("mean_diameter", vec!["external_diameter".into(), "wire_width".into()]);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("AlreadyDefined"));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_conflict_message_names_sources() {
        let error = CalcError::already_defined("mean_diameter", vec!["external_diameter".into(), "wire_width".into()]);
        assert_eq!(
            error.to_string(),
            "'mean_diameter' already defined through: 'external_diameter', 'wire_width'"
        );
        assert_eq!(error.conflicting_slots().unwrap().len(), 2);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::not_defined("pitch").error_code(), "ATTRIBUTE_NOT_DEFINED");
        assert_eq!(CalcError::NonIntegralScale { factor: 1.5 }.error_code(), "NON_INTEGRAL_SCALE");
        assert!(CalcError::unsupported("divide", "dimension").is_recoverable());
        assert!(!CalcError::NonIntegralScale { factor: 1.5 }.is_recoverable());
    }
}
