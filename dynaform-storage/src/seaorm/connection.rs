use dynaform_config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection as SeaConnection, DbErr};
use thiserror::Error;
use tracing::{debug, info};

/// Database connection wrapper with configuration
#[derive(Clone)]
pub struct DatabaseConnection {
    connection: SeaConnection,
    config: DatabaseConfig,
}

/// Database-related errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    DbError(#[from] DbErr),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DatabaseConnection {
    /// Create a new database connection with configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Connecting to database: {}", config.url);

        // Handle SQLite file creation if needed
        Self::ensure_sqlite_file_exists(&config.url)?;

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connection_timeout)
            .acquire_timeout(config.connection_timeout)
            .idle_timeout(config.idle_timeout)
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let connection = Database::connect(opts).await?;

        debug!(
            "Database connection established with {} max connections",
            config.max_connections
        );

        let db = Self { connection, config };

        if db.config.auto_migrate {
            db.migrate().await?;
        }

        Ok(db)
    }

    /// Ensure SQLite database file and directory exist for file-based databases
    fn ensure_sqlite_file_exists(database_url: &str) -> Result<(), DatabaseError> {
        if database_url.starts_with("sqlite:") && !database_url.contains(":memory:") {
            let file_path = database_url
                .strip_prefix("sqlite://")
                .or_else(|| database_url.strip_prefix("sqlite:"))
                .ok_or_else(|| {
                    DatabaseError::ConfigError(format!(
                        "Invalid SQLite URL format: {}",
                        database_url
                    ))
                })?;

            let path = std::path::Path::new(file_path);
            if let Some(parent_dir) = path.parent() {
                if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                    info!("Creating database directory: {:?}", parent_dir);
                    std::fs::create_dir_all(parent_dir).map_err(|e| {
                        DatabaseError::ConfigError(format!(
                            "Failed to create database directory {:?}: {}",
                            parent_dir, e
                        ))
                    })?;
                }
            }
        } else if database_url.contains(":memory:") {
            debug!("Using in-memory SQLite database");
        } else {
            debug!("Non-SQLite database detected, skipping file creation logic");
        }

        Ok(())
    }

    /// Get the underlying Sea-ORM connection
    pub fn get_connection(&self) -> &SeaConnection {
        &self.connection
    }

    /// Get database configuration
    pub fn get_config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Run metadata-store migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        use sea_orm_migration::MigratorTrait;

        info!("Running metadata store migrations");

        crate::seaorm::migrations::Migrator::up(&self.connection, None)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

        info!("Metadata store migrations completed");
        Ok(())
    }

    /// Check database connectivity
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.connection.ping().await.map_err(DatabaseError::DbError)
    }

    /// Close the database connection
    pub async fn close(self) -> Result<(), DatabaseError> {
        info!("Closing database connection");
        self.connection.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_and_migrate_in_memory() {
        let db = DatabaseConnection::new(memory_config()).await.unwrap();
        assert!(db.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_file_database_directory_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        assert!(!db_path.parent().unwrap().exists());
        DatabaseConnection::ensure_sqlite_file_exists(&db_url).unwrap();
        assert!(db_path.parent().unwrap().exists());
    }

    #[test]
    fn test_ensure_sqlite_file_exists_in_memory() {
        assert!(DatabaseConnection::ensure_sqlite_file_exists("sqlite::memory:").is_ok());
    }

    #[test]
    fn test_ensure_sqlite_file_exists_non_sqlite() {
        assert!(
            DatabaseConnection::ensure_sqlite_file_exists("postgresql://localhost/test").is_ok()
        );
    }
}
