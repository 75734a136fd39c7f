//! Error types for people-db
//!
//! Provides structured error types so callers can tell a rejected write,
//! a missing record, and a broken storage backend apart.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for people-db operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    #[error("Missing required field '{field}' in collection '{collection}'")]
    MissingRequiredField { collection: String, field: String },

    #[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Reserved name '{name}' cannot be used")]
    ReservedName { name: String },

    // ==========================================================================
    // Logical Errors
    // ==========================================================================
    #[error("Person not found")]
    PersonNotFound { id: String },

    #[error("Document '{id}' not found in collection '{collection}'")]
    DocumentNotFound { collection: String, id: String },

    // ==========================================================================
    // Storage Errors
    // ==========================================================================
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt document '{id}': {message}")]
    CorruptDocument { id: String, message: String },

    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    // ==========================================================================
    // Serialization Errors
    // ==========================================================================
    #[error("Failed to parse YAML: {message}")]
    YamlParseError { message: String },

    #[error("Failed to serialize to YAML: {message}")]
    YamlSerializeError { message: String },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

/// Result type alias for people-db operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The write was rejected before reaching storage
    Validation,
    /// The request was well formed but names a record that does not exist
    Logical,
    /// The storage backend failed
    Transport,
    /// The process was configured incorrectly
    Config,
}

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlParseError {
            message: err.to_string(),
        }
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        match err {
            crate::validation::ValidationError::InvalidIdentifier(value, reason) => {
                Error::InvalidIdentifier {
                    kind: "identifier",
                    value,
                    reason,
                }
            }
            crate::validation::ValidationError::TooLong(value, _max) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason: "exceeds maximum length",
            },
            crate::validation::ValidationError::Empty => Error::InvalidIdentifier {
                kind: "identifier",
                value: String::new(),
                reason: "cannot be empty",
            },
            crate::validation::ValidationError::Reserved(name) => Error::ReservedName { name },
        }
    }
}

impl From<crate::schema::ValidationError> for Error {
    fn from(err: crate::schema::ValidationError) -> Self {
        match err {
            crate::schema::ValidationError::MissingRequired { collection, field } => {
                Error::MissingRequiredField { collection, field }
            }
            crate::schema::ValidationError::TypeMismatch {
                field,
                expected,
                actual,
            } => Error::TypeMismatch {
                field,
                expected,
                actual,
            },
        }
    }
}

// =============================================================================
// Error Display Helpers
// =============================================================================

impl Error {
    /// Classify the error so callers can distinguish "no such record"
    /// from "storage broke"
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingRequiredField { .. }
            | Error::TypeMismatch { .. }
            | Error::InvalidIdentifier { .. }
            | Error::ReservedName { .. } => ErrorKind::Validation,
            Error::PersonNotFound { .. } | Error::DocumentNotFound { .. } => ErrorKind::Logical,
            Error::Config { .. } => ErrorKind::Config,
            _ => ErrorKind::Transport,
        }
    }

    /// Returns a user-friendly suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::MissingRequiredField { .. } => Some("Provide a non-empty value for the field"),
            Error::PersonNotFound { .. } => Some("Check the person ID"),
            Error::InvalidIdentifier { .. } => {
                Some("Use an ID returned by a previous create operation")
            }
            Error::Config { .. } => {
                Some("Check MONGO_URI, PEOPLE_DATA_DIR and PEOPLE_COLLECTION")
            }
            _ => None,
        }
    }

    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Logical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_not_found_message() {
        let err = Error::PersonNotFound {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Person not found");
        assert_eq!(err.kind(), ErrorKind::Logical);
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_error_kinds() {
        let missing = Error::MissingRequiredField {
            collection: "people".into(),
            field: "name".into(),
        };
        assert_eq!(missing.kind(), ErrorKind::Validation);
        assert!(missing.is_recoverable());

        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        assert_eq!(io.kind(), ErrorKind::Transport);
        assert!(!io.is_recoverable());
    }
}
