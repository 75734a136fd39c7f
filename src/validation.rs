//! Input validation for people-db
//!
//! Collection names become directory names and document IDs become file
//! names in the file backend, so both are checked for filesystem safety
//! before they touch a path.

use thiserror::Error;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Identifier '{0}' is too long (max {1} characters)")]
    TooLong(String, usize),

    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Reserved name: '{0}'")]
    Reserved(String),
}

/// Maximum length for identifiers
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Reserved names that cannot be used
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "con", "prn", "aux", "nul",
    "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8", "com9",
    "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Validate a collection name
///
/// Rules:
/// - Must be 1-255 characters
/// - Only alphanumeric, underscore, and hyphen allowed
/// - Cannot start with a hyphen or underscore
/// - Cannot be a reserved name (case-insensitive)
pub fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    validate_identifier(name)
}

/// Validate a document ID
///
/// Same character rules as collection names. Backends layer their own
/// format check (UUID, ObjectId) on top.
pub fn validate_document_id(id: &str) -> Result<(), ValidationError> {
    validate_identifier(id)
}

fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_IDENTIFIER_LENGTH));
    }

    for (i, c) in name.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "contains invalid characters (only alphanumeric, underscore, and hyphen allowed)",
            ));
        }
        if i == 0 && (c == '-' || c == '_') {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "cannot start with hyphen or underscore",
            ));
        }
    }

    if RESERVED_NAMES.contains(&name.to_lowercase().as_str()) {
        return Err(ValidationError::Reserved(name.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_collection_name("people").is_ok());
        assert!(validate_collection_name("people-archive").is_ok());
        assert!(validate_collection_name("People2").is_ok());
        assert!(validate_document_id("0190b1d2-8e1f-7c3a-9f00-1a2b3c4d5e6f").is_ok());
        assert!(validate_document_id("65a1f0c2e4b0a1b2c3d4e5f6").is_ok());
    }

    #[test]
    fn test_path_traversal_blocked() {
        assert!(validate_collection_name("..").is_err());
        assert!(validate_collection_name("../secret").is_err());
        assert!(validate_collection_name("foo/bar").is_err());
        assert!(validate_collection_name("foo\\bar").is_err());
        assert!(validate_document_id("../../../etc/passwd").is_err());
    }

    #[test]
    fn test_invalid_characters_and_start() {
        assert!(validate_collection_name("foo bar").is_err());
        assert!(validate_collection_name("foo.bar").is_err());
        assert!(validate_collection_name("-foo").is_err());
        assert!(validate_collection_name("_foo").is_err());
    }

    #[test]
    fn test_reserved_names() {
        assert!(matches!(
            validate_collection_name("CON"),
            Err(ValidationError::Reserved(_))
        ));
        assert!(validate_collection_name("nul").is_err());
    }

    #[test]
    fn test_empty_and_too_long() {
        assert!(matches!(validate_document_id(""), Err(ValidationError::Empty)));
        let long_name = "a".repeat(256);
        assert!(matches!(
            validate_collection_name(&long_name),
            Err(ValidationError::TooLong(_, 255))
        ));
    }
}
