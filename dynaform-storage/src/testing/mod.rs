//! Testing utilities for dynaform-storage
//!
//! Enabled by the `testing` feature. Provides:
//! - `TestDatabase` - isolated in-memory or file-backed metadata stores
//!   with migrations applied and an engine factory
//! - Builder patterns - `FormBuilder`, `FieldBuilder` for test data
//! - `MockResolver` - mockall mock of the column-name resolver contract

pub mod builders;
pub mod database;
pub mod mocks;

pub use builders::{FieldBuilder, FormBuilder};
pub use database::{TestDatabase, TestDatabaseError};
pub use mocks::MockResolver;
