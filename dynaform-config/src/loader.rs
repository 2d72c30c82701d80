//! Configuration loading and environment variable handling

use crate::domains::DynaformConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "DYNAFORM".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<DynaformConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: DynaformConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<DynaformConfig> {
        let mut config = DynaformConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<DynaformConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut DynaformConfig) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("DATABASE_URL") {
            config.database.url = url;
        }

        if let Ok(max_conns) = self.get_env_var("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = max_conns.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e))
            })?;
        }

        if let Ok(retention) = self.get_env_var("BACKUP_RETENTION_DAYS") {
            config.migration.backup_retention_days = retention.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid BACKUP_RETENTION_DAYS: {}", e))
            })?;
        }

        if let Ok(timeout) = self.get_env_var("SCAN_TIMEOUT_SECONDS") {
            let seconds: u64 = timeout.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid SCAN_TIMEOUT_SECONDS: {}", e))
            })?;
            config.migration.scan_timeout = Duration::from_secs(seconds);
        }

        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = serde_yaml::from_str(&level)
                .map_err(|e| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", e)))?;
        }

        Ok(())
    }

    /// Get an environment variable with the configured prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database:\n  url: \"sqlite::memory:\"\n  max_connections: 3\nmigration:\n  backup_retention_days: 30\n"
        )
        .unwrap();

        let config = ConfigLoader::new().from_file(file.path()).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.migration.backup_retention_days, 30);
        // untouched domains keep their defaults
        assert_eq!(config.migration.incompatible_sample_limit, 10);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database:\n  max_connections: 0\n").unwrap();
        assert!(ConfigLoader::new().from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_override() {
        // Distinct prefix so parallel tests cannot interfere
        std::env::set_var("DYNATEST_BACKUP_RETENTION_DAYS", "7");
        let config = ConfigLoader::with_prefix("DYNATEST").from_env().unwrap();
        assert_eq!(config.migration.backup_retention_days, 7);
        std::env::remove_var("DYNATEST_BACKUP_RETENTION_DAYS");
    }
}
