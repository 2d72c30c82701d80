//! Metadata store and field migration engine for Dynaform
//!
//! Each form owns an ordered set of field definitions in the normalized
//! metadata store plus one physically separate dynamic table for direct
//! querying. This crate keeps the two in sync: the [`engine::MigrationEngine`]
//! validates, executes, audits, and can roll back every column-level change
//! to a dynamic table, with column backups making destructive operations
//! reversible inside the retention window.

pub mod engine;
pub mod seaorm;

// Testing utilities (feature-gated)
#[cfg(feature = "testing")]
pub mod testing;

// Re-export main types
pub use engine::{
    backup::BackupManager,
    compat::{CompatReport, TypeCompatibilityValidator},
    error::{MigrationError, MigrationResult},
    executor::SchemaExecutor,
    lock::{TableLockGuard, TableLockRegistry},
    DeleteOutcome, MigrationEngine, RollbackOutcome,
};
pub use seaorm::connection::{DatabaseConnection, DatabaseError};
pub use seaorm::entities::field_migrations::{FieldSnapshot, MigrationKind, MigrationStatus};
