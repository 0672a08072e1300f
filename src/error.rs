//! Error types for cell map generation and queries

use thiserror::Error;

/// Errors that can occur while generating or querying a cell map
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellMapError {
    /// Input that cannot be triangulated or queried
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required attribute was not present on an entity
    #[error("missing attribute: {key}")]
    MissingAttribute {
        /// Name of the missing key
        key: &'static str,
    },

    /// A section could not be materialized
    #[error("generation of section ({}, {}) failed: {reason}", section.0, section.1)]
    GenerationFailed {
        /// Section coordinate
        section: (i32, i32),
        /// Underlying cause
        reason: String,
    },
}

/// Result type alias for cell map operations
pub type Result<T> = std::result::Result<T, CellMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CellMapError::InvalidInput("less than three points".into());
        assert_eq!(err.to_string(), "invalid input: less than three points");

        let err = CellMapError::MissingAttribute { key: "moisture" };
        assert_eq!(err.to_string(), "missing attribute: moisture");

        let err = CellMapError::GenerationFailed {
            section: (-1, 2),
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "generation of section (-1, 2) failed: boom");
    }
}
