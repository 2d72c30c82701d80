//! Database testing utilities
//!
//! Isolated metadata stores for tests: in-memory SQLite by default, a
//! tempdir-backed file database when connection-pool behavior matters.
//! Migrations run on creation; the engine factory wires the deterministic
//! slug resolver so tests get stable column names.

use std::sync::Arc;
use std::time::Duration;

use dynaform_config::{DatabaseConfig, MigrationConfig};
use dynaform_core::{ColumnNameResolver, SlugResolver};
use tempfile::TempDir;
use thiserror::Error;

use crate::engine::MigrationEngine;
use crate::seaorm::connection::DatabaseConnection;
use crate::seaorm::entities::forms;
use crate::seaorm::repositories::FormRepository;

/// Test database errors
#[derive(Debug, Error)]
pub enum TestDatabaseError {
    #[error("Failed to create temp directory: {0}")]
    TempDirCreation(String),

    #[error("Failed to connect: {0}")]
    Connection(String),

    #[error("Failed to seed test data: {0}")]
    Seeding(String),
}

/// Isolated metadata store for tests
pub struct TestDatabase {
    _temp_dir: Option<TempDir>,
    pub db: DatabaseConnection,
}

impl TestDatabase {
    /// Create an in-memory SQLite test database with migrations applied
    ///
    /// The pool is capped at one connection; an in-memory SQLite database
    /// exists per connection.
    pub async fn new() -> Result<Self, TestDatabaseError> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connection_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let db = DatabaseConnection::new(config)
            .await
            .map_err(|e| TestDatabaseError::Connection(e.to_string()))?;
        Ok(Self {
            _temp_dir: None,
            db,
        })
    }

    /// Create a file-backed SQLite test database in a temp directory
    pub async fn new_file() -> Result<Self, TestDatabaseError> {
        let temp_dir =
            TempDir::new().map_err(|e| TestDatabaseError::TempDirCreation(e.to_string()))?;
        let db_path = temp_dir.path().join("test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 1,
            min_connections: 1,
            connection_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let db = DatabaseConnection::new(config)
            .await
            .map_err(|e| TestDatabaseError::Connection(e.to_string()))?;
        Ok(Self {
            _temp_dir: Some(temp_dir),
            db,
        })
    }

    /// A migration engine with default config and the slug resolver
    pub fn engine(&self) -> MigrationEngine {
        self.engine_with(MigrationConfig::default())
    }

    /// A migration engine with a custom migration config
    pub fn engine_with(&self, config: MigrationConfig) -> MigrationEngine {
        MigrationEngine::new(self.db.clone(), Arc::new(SlugResolver::new()), config)
    }

    /// A migration engine with a custom resolver
    pub fn engine_with_resolver(&self, resolver: Arc<dyn ColumnNameResolver>) -> MigrationEngine {
        MigrationEngine::new(self.db.clone(), resolver, MigrationConfig::default())
    }

    /// Seed a form row
    pub async fn create_form(
        &self,
        name: impl Into<String>,
    ) -> Result<forms::Model, TestDatabaseError> {
        FormRepository::new(self.db.clone())
            .create(forms::Model::new(name, "test-user"))
            .await
            .map_err(|e| TestDatabaseError::Seeding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_migrates() {
        let test_db = TestDatabase::new().await.unwrap();
        let form = test_db.create_form("Feedback").await.unwrap();
        assert!(form.id > 0);
        assert!(form.table_name.is_none());
    }

    #[tokio::test]
    async fn test_file_database_in_tempdir() {
        let test_db = TestDatabase::new_file().await.unwrap();
        assert!(test_db.db.ping().await.is_ok());
    }
}
