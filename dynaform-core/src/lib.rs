//! Core domain types for the Dynaform field migration engine
//!
//! This crate defines the vocabulary shared by the storage layer and the
//! migration engine: semantic field types and their SQL mapping, validated
//! SQL identifiers, field drafts, and the column-name resolver contract.
//! It deliberately has no database dependency.

pub mod draft;
pub mod error;
pub mod field_type;
pub mod identifier;
pub mod resolver;

// Re-export main types
pub use draft::FieldDraft;
pub use error::{IncompatibleValue, ResolverError, ValidationError};
pub use field_type::{FieldType, SqlDialect, StorageClass};
pub use identifier::{ColumnName, IdentifierError, TableName, SYSTEM_COLUMNS};
pub use resolver::{ColumnNameResolver, SlugResolver};
