//! Domain-specific configuration modules

pub mod database;
pub mod logging;
pub mod migration;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Dynaform configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DynaformConfig {
    /// Metadata database configuration
    #[serde(default)]
    pub database: database::DatabaseConfig,

    /// Migration engine configuration
    #[serde(default)]
    pub migration: migration::MigrationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl DynaformConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.migration.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
