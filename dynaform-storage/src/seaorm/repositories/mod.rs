//! Repository pattern over the metadata entities
//!
//! Repositories hold the shared connection for plain reads; every mutating
//! method takes a generic [`sea_orm::ConnectionTrait`] so it can join the
//! migration engine's transaction. Nothing outside the engine is permitted
//! to write to the metadata store.

pub mod backup_repository;
pub mod field_repository;
pub mod form_repository;
pub mod migration_repository;

pub use backup_repository::BackupRepository;
pub use field_repository::FieldRepository;
pub use form_repository::FormRepository;
pub use migration_repository::MigrationRepository;
