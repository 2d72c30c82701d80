//! Migration engine configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Migration engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// How long column backups are retained before the expiry sweep may
    /// collect them
    #[serde(default = "default_backup_retention_days")]
    pub backup_retention_days: i64,

    /// Deadline for full-column scans (compatibility checks, backups)
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_scan_timeout")]
    pub scan_timeout: Duration,

    /// Maximum number of offending rows reported in a type-conversion error
    #[serde(default = "default_incompatible_sample_limit")]
    pub incompatible_sample_limit: usize,

    /// Prefix for generated dynamic table names
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            backup_retention_days: default_backup_retention_days(),
            scan_timeout: default_scan_timeout(),
            incompatible_sample_limit: default_incompatible_sample_limit(),
            table_prefix: default_table_prefix(),
        }
    }
}

impl Validatable for MigrationConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.backup_retention_days,
            "backup_retention_days",
            self.domain_name(),
        )?;
        if self.scan_timeout.is_zero() {
            return Err(self.validation_error("scan_timeout must be greater than 0"));
        }
        if self.incompatible_sample_limit == 0 {
            return Err(self.validation_error("incompatible_sample_limit must be greater than 0"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "migration"
    }
}

fn default_backup_retention_days() -> i64 {
    90
}

fn default_scan_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_incompatible_sample_limit() -> usize {
    10
}

fn default_table_prefix() -> String {
    "form_data_".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.backup_retention_days, 90);
        assert_eq!(config.scan_timeout, Duration::from_secs(30));
        assert_eq!(config.incompatible_sample_limit, 10);
        assert_eq!(config.table_prefix, "form_data_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_retention_rejected() {
        let config = MigrationConfig {
            backup_retention_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sample_limit_rejected() {
        let config = MigrationConfig {
            incompatible_sample_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
