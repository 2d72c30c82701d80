//! Trial-cast type compatibility checking
//!
//! Before a CHANGE_TYPE migration may issue DDL, every non-null value in
//! the column is trial-converted to the target representation in process.
//! One failing row rejects the whole operation; the error carries a
//! bounded sample of offenders, never the full list.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use dynaform_core::{ColumnName, FieldType, IncompatibleValue, SqlDialect, StorageClass, TableName};
use sea_orm::ConnectionTrait;
use tracing::debug;

use super::error::MigrationResult;
use super::executor::SchemaExecutor;

/// Outcome of a compatibility check
#[derive(Debug, Clone)]
pub struct CompatReport {
    /// Whether every stored value converts cleanly
    pub compatible: bool,
    /// Number of non-null values examined
    pub total: u64,
    /// Number of values that failed the trial conversion
    pub incompatible_count: u64,
    /// Bounded sample of offending rows
    pub sample: Vec<IncompatibleValue>,
    /// Deterministic cast expression for the `ALTER COLUMN .. TYPE` step
    pub using_expr: String,
}

/// Validates that a column's data survives a type change
#[derive(Debug, Clone)]
pub struct TypeCompatibilityValidator {
    executor: SchemaExecutor,
    sample_limit: usize,
}

impl TypeCompatibilityValidator {
    /// Create a validator reporting at most `sample_limit` offending rows
    pub fn new(sample_limit: usize) -> Self {
        Self {
            executor: SchemaExecutor::new(),
            sample_limit,
        }
    }

    /// Check whether every non-null value converts to the target type
    pub async fn check<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
        old_type: FieldType,
        new_type: FieldType,
    ) -> MigrationResult<CompatReport> {
        let dialect = SchemaExecutor::dialect(conn.get_database_backend())?;
        let using_expr = Self::using_expr(dialect, column, new_type);

        // Same representation: nothing to convert, no scan needed
        if old_type.storage_class() == new_type.storage_class() {
            let total = self.executor.count_nonnull(conn, table, column).await?;
            return Ok(CompatReport {
                compatible: true,
                total,
                incompatible_count: 0,
                sample: Vec::new(),
                using_expr,
            });
        }

        let pairs = self.executor.fetch_column_text(conn, table, column).await?;
        let total = pairs.len() as u64;
        let target = new_type.storage_class();

        let mut incompatible_count = 0u64;
        let mut sample = Vec::new();
        for (row_id, value) in pairs {
            if !Self::value_converts(&value, target) {
                incompatible_count += 1;
                if sample.len() < self.sample_limit {
                    sample.push(IncompatibleValue { row_id, value });
                }
            }
        }

        debug!(
            table = %table,
            column = %column,
            total,
            incompatible_count,
            "trial conversion finished"
        );

        Ok(CompatReport {
            compatible: incompatible_count == 0,
            total,
            incompatible_count,
            sample,
            using_expr,
        })
    }

    /// Deterministic cast expression for the target type
    pub fn using_expr(dialect: SqlDialect, column: &ColumnName, target: FieldType) -> String {
        format!(
            "CAST({} AS {})",
            column.quoted(),
            target.sql_type(dialect)
        )
    }

    /// Whether a single text-rendered value converts to the target class
    fn value_converts(value: &str, target: StorageClass) -> bool {
        let trimmed = value.trim();
        match target {
            StorageClass::Text => true,
            StorageClass::Integer => {
                trimmed.parse::<i64>().is_ok()
                    // Whole-numbered floats survive the cast losslessly
                    || trimmed
                        .parse::<f64>()
                        .map(|f| f.fract() == 0.0 && f.is_finite())
                        .unwrap_or(false)
            }
            StorageClass::Float => trimmed
                .parse::<f64>()
                .map(|f| f.is_finite())
                .unwrap_or(false),
            StorageClass::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok(),
            StorageClass::Time => {
                NaiveTime::parse_from_str(trimmed, "%H:%M:%S").is_ok()
                    || NaiveTime::parse_from_str(trimmed, "%H:%M").is_ok()
            }
            StorageClass::Timestamp => {
                DateTime::parse_from_rfc3339(trimmed).is_ok()
                    || NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").is_ok()
                    || NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").is_ok()
            }
            StorageClass::Json => serde_json::from_str::<serde_json::Value>(trimmed).is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_accepts_everything() {
        assert!(TypeCompatibilityValidator::value_converts("anything", StorageClass::Text));
        assert!(TypeCompatibilityValidator::value_converts("", StorageClass::Text));
    }

    #[test]
    fn test_integer_conversions() {
        assert!(TypeCompatibilityValidator::value_converts("42", StorageClass::Integer));
        assert!(TypeCompatibilityValidator::value_converts(" 42 ", StorageClass::Integer));
        assert!(TypeCompatibilityValidator::value_converts("4.0", StorageClass::Integer));
        assert!(!TypeCompatibilityValidator::value_converts("4.5", StorageClass::Integer));
        assert!(!TypeCompatibilityValidator::value_converts("not-a-number", StorageClass::Integer));
    }

    #[test]
    fn test_float_conversions() {
        assert!(TypeCompatibilityValidator::value_converts("3.14", StorageClass::Float));
        assert!(TypeCompatibilityValidator::value_converts("10", StorageClass::Float));
        assert!(!TypeCompatibilityValidator::value_converts("NaN-ish", StorageClass::Float));
        assert!(!TypeCompatibilityValidator::value_converts("inf", StorageClass::Float));
    }

    #[test]
    fn test_date_time_conversions() {
        assert!(TypeCompatibilityValidator::value_converts("2026-03-01", StorageClass::Date));
        assert!(!TypeCompatibilityValidator::value_converts("01/03/2026", StorageClass::Date));
        assert!(TypeCompatibilityValidator::value_converts("14:30", StorageClass::Time));
        assert!(TypeCompatibilityValidator::value_converts("14:30:15", StorageClass::Time));
        assert!(!TypeCompatibilityValidator::value_converts("2pm", StorageClass::Time));
        assert!(TypeCompatibilityValidator::value_converts(
            "2026-03-01T14:30:15+07:00",
            StorageClass::Timestamp
        ));
        assert!(TypeCompatibilityValidator::value_converts(
            "2026-03-01 14:30:15",
            StorageClass::Timestamp
        ));
        assert!(!TypeCompatibilityValidator::value_converts("yesterday", StorageClass::Timestamp));
    }

    #[test]
    fn test_json_conversions() {
        assert!(TypeCompatibilityValidator::value_converts("[\"a\",\"b\"]", StorageClass::Json));
        assert!(TypeCompatibilityValidator::value_converts("{\"lat\":13.75}", StorageClass::Json));
        assert!(!TypeCompatibilityValidator::value_converts("plain text", StorageClass::Json));
    }

    #[test]
    fn test_using_expr_is_deterministic() {
        let col = ColumnName::new("age").unwrap();
        assert_eq!(
            TypeCompatibilityValidator::using_expr(SqlDialect::Postgres, &col, FieldType::Rating),
            "CAST(\"age\" AS BIGINT)"
        );
        assert_eq!(
            TypeCompatibilityValidator::using_expr(SqlDialect::Sqlite, &col, FieldType::Rating),
            "CAST(\"age\" AS INTEGER)"
        );
    }
}
