//! Error taxonomy of the migration engine
//!
//! Validation, confirmation, and conflict errors are detected before any
//! mutation; execution errors after the metadata transaction rolled back
//! always leave a failed audit record behind.

use chrono::{DateTime, Utc};
use dynaform_core::{IncompatibleValue, ResolverError, ValidationError};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Result type for migration operations
pub type MigrationResult<T> = std::result::Result<T, MigrationError>;

/// Migration engine errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Bad input shape; recoverable by the caller correcting input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Column-name resolver failure
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Destructive operation not yet acknowledged
    #[error(
        "Deleting column '{column}' would discard {rows_at_risk} stored value(s); \
         re-submit with confirmed=true to proceed"
    )]
    ConfirmationRequired { column: String, rows_at_risk: u64 },

    /// Derived column name collides with an existing active column
    #[error("Column '{column}' already exists on this table")]
    DuplicateColumnName { column: String },

    /// Type conversion rejected; carries a bounded sample of offending rows
    #[error(
        "{incompatible_count} of {total} value(s) cannot be converted to the requested type"
    )]
    TypeConversion {
        total: u64,
        incompatible_count: u64,
        sample: Vec<IncompatibleValue>,
    },

    /// Form, field, migration, or backup missing
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Another migration is already in flight on this table
    #[error("A migration is already in progress on table '{table}'")]
    MigrationInProgress { table: String },

    /// The migration kind has no inverse procedure
    #[error("Migration of kind {kind} cannot be rolled back")]
    NotRollbackable { kind: String },

    /// Idempotency guard: the record is already rolled back
    #[error("Migration {migration} is already rolled back")]
    AlreadyRolledBack { migration: Uuid },

    /// Idempotency guard: the backup is already consumed
    #[error("Backup {backup} has already been restored")]
    AlreadyRestored { backup: Uuid },

    /// The backup's retention window has passed
    #[error("Backup {backup} expired at {expired_at}")]
    ExpiredBackup {
        backup: Uuid,
        expired_at: DateTime<Utc>,
    },

    /// Full-column scan exceeded the configured deadline; nothing mutated
    #[error("Operation timed out after {seconds} seconds before any change was applied")]
    Timeout { seconds: u64 },

    /// The metadata store is not one of the supported backends
    #[error("Unsupported database backend: {0}")]
    UnsupportedBackend(&'static str),

    /// DDL or storage failure, surfaced with context to retry
    #[error("Execution error: {0}")]
    Execution(String),

    /// Underlying database error
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Snapshot (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrationError {
    /// Not-found helper with consistent formatting
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
