//! Error types for criteria-core.
//!
//! Compilation is pure, so every error is raised synchronously from the
//! compile pass and aborts the whole statement.

use thiserror::Error;

/// Criteria compilation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CriteriaError {
    /// A property path does not denote the expected kind of value.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// A function, collection role, alias or column could not be resolved.
    #[error("Query error: {0}")]
    Query(String),

    #[error("could not resolve property: {property} of: {entity}")]
    PropertyNotFound { property: String, entity: String },

    #[error("Unknown entity: {0}")]
    EntityNotFound(String),

    /// An example prototype does not match the target entity.
    #[error("Classification error: {0}")]
    Classification(String),

    /// Dialect-dependent configuration that is only checked on first use.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for criteria operations
pub type CriteriaResult<T> = Result<T, CriteriaError>;

impl CriteriaError {
    pub fn property_not_found(property: impl Into<String>, entity: impl Into<String>) -> Self {
        CriteriaError::PropertyNotFound {
            property: property.into(),
            entity: entity.into(),
        }
    }
}

impl serde::Serialize for CriteriaError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
