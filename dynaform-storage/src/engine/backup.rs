//! Column data backup and restore
//!
//! Backups capture the full `(row_id, value)` content of one column as a
//! typed JSON array, keyed by the field's declared type at capture time.
//! A backup is single-use: restoring it flips `is_restored`, and a second
//! restore attempt fails rather than silently re-applying stale data.

use chrono::{Duration, Utc};
use dynaform_core::{ColumnName, FieldType, StorageClass, TableName};
use sea_orm::{ConnectionTrait, Value};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{MigrationError, MigrationResult};
use super::executor::SchemaExecutor;
use crate::seaorm::entities::field_data_backups::{self, BackupEntry};
use crate::seaorm::repositories::BackupRepository;

/// Captures and restores column data around destructive migrations
#[derive(Clone)]
pub struct BackupManager {
    executor: SchemaExecutor,
    retention_days: i64,
}

impl BackupManager {
    /// Create a manager whose backups expire after `retention_days`
    pub fn new(retention_days: i64) -> Self {
        Self {
            executor: SchemaExecutor::new(),
            retention_days,
        }
    }

    /// Snapshot every non-null value of a column
    ///
    /// Runs on the caller's connection so the insert joins the enclosing
    /// migration transaction. The returned model carries the assigned id
    /// for linking into the audit record.
    pub async fn backup_column<C: ConnectionTrait>(
        &self,
        conn: &C,
        repo: &BackupRepository,
        form_id: i32,
        table: &TableName,
        column: &ColumnName,
        field_type: FieldType,
    ) -> MigrationResult<field_data_backups::Model> {
        let pairs = self.executor.fetch_column_text(conn, table, column).await?;
        let row_count = pairs.len() as i32;

        let entries: Vec<BackupEntry> = pairs
            .into_iter()
            .map(|(row_id, text)| BackupEntry {
                row_id,
                value: Self::encode_value(&text, field_type.storage_class()),
            })
            .collect();

        let now = Utc::now();
        let backup = field_data_backups::Model {
            id: 0, // assigned on insert
            uuid: Uuid::new_v4(),
            form_id,
            table_name: table.as_str().to_string(),
            column_name: column.as_str().to_string(),
            field_type: field_type.as_str().to_string(),
            data: serde_json::to_value(&entries)?,
            row_count,
            is_restored: false,
            created_at: now,
            expires_at: now + Duration::days(self.retention_days),
        };

        let inserted = repo.insert_in(conn, backup).await?;
        info!(
            table = %table,
            column = %column,
            rows = row_count,
            backup = %inserted.uuid,
            "column backed up"
        );
        Ok(inserted)
    }

    /// Write a backup's values back into the (existing) column
    ///
    /// Guards: the backup must be unconsumed and inside its retention
    /// window; the caller verifies the target column exists. Returns the
    /// number of rows written; rows deleted since capture are skipped.
    pub async fn restore<C: ConnectionTrait>(
        &self,
        conn: &C,
        repo: &BackupRepository,
        backup: &field_data_backups::Model,
        table: &TableName,
        column: &ColumnName,
    ) -> MigrationResult<u64> {
        if backup.is_restored {
            return Err(MigrationError::AlreadyRestored {
                backup: backup.uuid,
            });
        }
        let now = Utc::now();
        if backup.is_expired(now) {
            return Err(MigrationError::ExpiredBackup {
                backup: backup.uuid,
                expired_at: backup.expires_at,
            });
        }

        let mut restored = 0u64;
        for entry in backup.entries()? {
            let affected = self
                .executor
                .update_row_value(conn, table, column, entry.row_id, Self::bind_value(&entry.value))
                .await?;
            if affected == 0 {
                debug!(row_id = entry.row_id, "row gone since backup, skipping");
            } else {
                restored += affected;
            }
        }

        repo.mark_restored_in(conn, backup.id).await?;
        info!(
            table = %table,
            column = %column,
            rows = restored,
            backup = %backup.uuid,
            "backup restored"
        );
        Ok(restored)
    }

    /// Re-encode a text-rendered value as typed JSON per storage class
    ///
    /// Values that no longer parse as their declared class are kept as
    /// strings rather than dropped; fidelity beats strictness here.
    fn encode_value(text: &str, class: StorageClass) -> serde_json::Value {
        match class {
            StorageClass::Integer => text
                .trim()
                .parse::<i64>()
                .map(|n| json!(n))
                .unwrap_or_else(|_| json!(text)),
            StorageClass::Float => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| json!(f))
                .unwrap_or_else(|| json!(text)),
            StorageClass::Json => {
                serde_json::from_str(text).unwrap_or_else(|_| json!(text))
            }
            StorageClass::Text | StorageClass::Date | StorageClass::Time | StorageClass::Timestamp => {
                json!(text)
            }
        }
    }

    /// Map a captured JSON value to a bindable database value
    fn bind_value(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Number(n) if n.is_i64() => Value::from(n.as_i64()),
            serde_json::Value::Number(n) => Value::from(n.as_f64()),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Bool(b) => Value::from(*b),
            serde_json::Value::Null => Value::String(None),
            // Arrays and objects are stored as their JSON text
            other => Value::from(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_integer() {
        assert_eq!(
            BackupManager::encode_value("42", StorageClass::Integer),
            json!(42)
        );
        // Unparseable values keep their text form
        assert_eq!(
            BackupManager::encode_value("n/a", StorageClass::Integer),
            json!("n/a")
        );
    }

    #[test]
    fn test_encode_float() {
        assert_eq!(
            BackupManager::encode_value("3.5", StorageClass::Float),
            json!(3.5)
        );
    }

    #[test]
    fn test_encode_json() {
        assert_eq!(
            BackupManager::encode_value("[\"a\",\"b\"]", StorageClass::Json),
            json!(["a", "b"])
        );
        assert_eq!(
            BackupManager::encode_value("broken{", StorageClass::Json),
            json!("broken{")
        );
    }

    #[test]
    fn test_encode_text_classes_stay_text() {
        assert_eq!(
            BackupManager::encode_value("2026-03-01", StorageClass::Date),
            json!("2026-03-01")
        );
        assert_eq!(
            BackupManager::encode_value("081-111-1111", StorageClass::Text),
            json!("081-111-1111")
        );
    }

    #[test]
    fn test_bind_value_shapes() {
        assert_eq!(BackupManager::bind_value(&json!(7)), Value::from(7i64));
        assert_eq!(
            BackupManager::bind_value(&json!("hello")),
            Value::from("hello")
        );
        assert_eq!(
            BackupManager::bind_value(&json!(["a"])),
            Value::from("[\"a\"]")
        );
    }
}
