//! Per-table migration serialization
//!
//! At most one migration may be in flight per dynamic table. Concurrent
//! `ALTER TABLE` statements on the same relation from two sessions are
//! liable to deadlock or interleave in undefined order, so a second caller
//! fails fast with [`MigrationError::MigrationInProgress`] instead of
//! racing. The registry is in-process; a multi-instance deployment would
//! replace it with a database advisory lock behind the same seam.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::error::MigrationError;

/// Registry of tables with a migration currently in flight
#[derive(Clone, Default)]
pub struct TableLockRegistry {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Guard holding one table's migration slot; released on drop
pub struct TableLockGuard {
    registry: Arc<Mutex<HashSet<String>>>,
    table: String,
}

impl TableLockRegistry {
    /// Create a new registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the migration slot for a table, failing fast when busy
    pub fn try_acquire(&self, table: &str) -> Result<TableLockGuard, MigrationError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !in_flight.insert(table.to_string()) {
            return Err(MigrationError::MigrationInProgress {
                table: table.to_string(),
            });
        }

        debug!(table, "acquired table migration lock");
        Ok(TableLockGuard {
            registry: Arc::clone(&self.in_flight),
            table: table.to_string(),
        })
    }
}

impl Drop for TableLockGuard {
    fn drop(&mut self) {
        let mut in_flight = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.table);
        debug!(table = %self.table, "released table migration lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_fast() {
        let registry = TableLockRegistry::new();
        let _guard = registry.try_acquire("form_data_a").unwrap();

        assert!(matches!(
            registry.try_acquire("form_data_a"),
            Err(MigrationError::MigrationInProgress { .. })
        ));
    }

    #[test]
    fn test_distinct_tables_are_independent() {
        let registry = TableLockRegistry::new();
        let _a = registry.try_acquire("form_data_a").unwrap();
        assert!(registry.try_acquire("form_data_b").is_ok());
    }

    #[test]
    fn test_released_on_drop() {
        let registry = TableLockRegistry::new();
        {
            let _guard = registry.try_acquire("form_data_a").unwrap();
        }
        assert!(registry.try_acquire("form_data_a").is_ok());
    }

    #[test]
    fn test_released_on_error_path() {
        let registry = TableLockRegistry::new();
        let result: Result<(), MigrationError> = (|| {
            let _guard = registry.try_acquire("form_data_a")?;
            Err(MigrationError::Execution("boom".to_string()))
        })();
        assert!(result.is_err());
        assert!(registry.try_acquire("form_data_a").is_ok());
    }
}
