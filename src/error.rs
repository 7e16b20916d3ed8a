//! Error taxonomy for a metadata import pass
//!
//! Every variant is fatal: the pipeline stops at the first error and hands
//! no partially resolved schema back to the caller.

use crate::primitives::PrimitiveError;
use serde::{Deserialize, Serialize};

/// Error raised by relationship inference, annotation dispatch, enum
/// synthesis or a pipeline adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum MetadataError {
    /// A navigation property references an entity type the schema does not declare
    #[error("Entity type not found: {0}")]
    EntityNotFound(String),

    /// An annotation target path does not resolve to a schema element
    #[error("Annotation target not found: {0}")]
    TargetNotFound(String),

    /// No explicit constraint, convention or shared-key fallback applies
    #[error(
        "Unable to resolve referential constraint for association '{association}' \
         ({dependent} -> {principal})"
    )]
    UnresolvedReferentialConstraint {
        association: String,
        dependent: String,
        principal: String,
    },

    /// Both ends are collections and many-to-many is disabled
    #[error("Many-to-many association '{0}' is not allowed (set allow_many_to_many to permit it)")]
    DisallowedManyToMany(String),

    /// A primitive value failed to parse or normalize
    #[error("Invalid primitive value: {0}")]
    InvalidPrimitiveValue(#[from] PrimitiveError),

    /// A user-registered adapter failed
    #[error("Adapter '{adapter}' failed: {message}")]
    Adapter { adapter: String, message: String },
}

pub type MetadataResult<T> = Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_errors_convert() {
        let err: MetadataError = PrimitiveError::new("P", "Edm.Duration", "empty").into();
        assert!(matches!(err, MetadataError::InvalidPrimitiveValue(_)));
        assert!(err.to_string().contains("Edm.Duration"));
    }

    #[test]
    fn entity_not_found_names_the_type() {
        let err = MetadataError::EntityNotFound("Demo.Missing".to_string());
        assert_eq!(err.to_string(), "Entity type not found: Demo.Missing");
    }
}
