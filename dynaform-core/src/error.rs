//! Core error types shared across the Dynaform crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::IdentifierError;

/// Input validation errors, detected before any mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field title must not be empty")]
    EmptyTitle,

    #[error("field title exceeds {max} characters (got {actual})")]
    TitleTooLong { max: usize, actual: usize },

    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("field type '{0}' requires at least one option")]
    MissingOptions(String),

    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("field ordering must be a permutation of the form's fields: {0}")]
    InvalidOrdering(String),
}

/// Errors from the external column-name resolver
#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    #[error("resolver produced an unusable identifier for title '{title}': {source}")]
    InvalidIdentifier {
        title: String,
        #[source]
        source: IdentifierError,
    },

    #[error("resolver unavailable: {0}")]
    Unavailable(String),
}

/// A row whose value failed a trial type conversion
///
/// Returned in bounded samples inside incompatibility errors; never the
/// full offending set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompatibleValue {
    /// Row id in the dynamic table
    pub row_id: i64,
    /// The stored value, rendered as text
    pub value: String,
}
