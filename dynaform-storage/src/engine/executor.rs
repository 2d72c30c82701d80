//! Raw DDL execution against dynamic tables
//!
//! Stateless wrapper issuing exactly one kind of statement per call. It
//! knows nothing about forms or fields; it only sees pre-validated table
//! names, column names, and SQL types. Identifiers arrive exclusively as
//! the validated newtypes, which is what keeps unchecked strings out of
//! DDL assembly — they cannot be parameterized through normal binding.

use dynaform_core::{ColumnName, SqlDialect, TableName};
use sea_orm::{ConnectionTrait, DbBackend, Statement, Value};
use tracing::{debug, warn};

use super::error::{MigrationError, MigrationResult};

/// Stateless DDL executor for dynamic tables
#[derive(Debug, Clone, Default)]
pub struct SchemaExecutor;

impl SchemaExecutor {
    /// Create a new executor
    pub fn new() -> Self {
        Self
    }

    /// Map the connection backend to a supported dialect
    pub fn dialect(backend: DbBackend) -> MigrationResult<SqlDialect> {
        match backend {
            DbBackend::Sqlite => Ok(SqlDialect::Sqlite),
            DbBackend::Postgres => Ok(SqlDialect::Postgres),
            DbBackend::MySql => Err(MigrationError::UnsupportedBackend("mysql")),
        }
    }

    /// Create a dynamic table holding only the system columns
    ///
    /// Idempotent via IF NOT EXISTS; called lazily the first time a form
    /// gains a field.
    pub async fn create_dynamic_table<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
    ) -> MigrationResult<()> {
        let backend = conn.get_database_backend();
        let sql = match Self::dialect(backend)? {
            SqlDialect::Sqlite => format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
                 \"form_id\" INTEGER NOT NULL, \
                 \"submitted_by\" TEXT, \
                 \"created_at\" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP)",
                table.quoted()
            ),
            SqlDialect::Postgres => format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 \"id\" BIGSERIAL PRIMARY KEY, \
                 \"form_id\" INTEGER NOT NULL, \
                 \"submitted_by\" TEXT, \
                 \"created_at\" TIMESTAMPTZ NOT NULL DEFAULT now())",
                table.quoted()
            ),
        };

        debug!(table = %table, "creating dynamic table");
        conn.execute(Statement::from_string(backend, sql)).await?;
        Ok(())
    }

    /// List the live columns of a dynamic table
    pub async fn list_columns<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
    ) -> MigrationResult<Vec<String>> {
        let backend = conn.get_database_backend();
        let rows = match Self::dialect(backend)? {
            SqlDialect::Sqlite => {
                let stmt = Statement::from_string(
                    backend,
                    format!("PRAGMA table_info({})", table.quoted()),
                );
                conn.query_all(stmt).await?
            }
            SqlDialect::Postgres => {
                let stmt = Statement::from_sql_and_values(
                    backend,
                    "SELECT column_name AS name FROM information_schema.columns \
                     WHERE table_name = $1",
                    [Value::from(table.as_str())],
                );
                conn.query_all(stmt).await?
            }
        };

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            columns.push(row.try_get::<String>("", "name")?);
        }
        Ok(columns)
    }

    /// Whether a column currently exists on the table
    pub async fn column_exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
    ) -> MigrationResult<bool> {
        let columns = self.list_columns(conn, table).await?;
        Ok(columns.iter().any(|c| c == column.as_str()))
    }

    /// Add a column; no-op when it already exists
    pub async fn add_column<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
        sql_type: &str,
    ) -> MigrationResult<bool> {
        if self.column_exists(conn, table, column).await? {
            warn!(table = %table, column = %column, "column already exists, skipping ADD");
            return Ok(false);
        }

        let backend = conn.get_database_backend();
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table.quoted(),
            column.quoted(),
            sql_type
        );
        debug!(table = %table, column = %column, sql_type, "adding column");
        conn.execute(Statement::from_string(backend, sql)).await?;
        Ok(true)
    }

    /// Drop a column; tolerant no-op when it is already missing
    pub async fn drop_column<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
    ) -> MigrationResult<bool> {
        if !self.column_exists(conn, table, column).await? {
            warn!(table = %table, column = %column, "column already missing, skipping DROP");
            return Ok(false);
        }

        let backend = conn.get_database_backend();
        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            table.quoted(),
            column.quoted()
        );
        debug!(table = %table, column = %column, "dropping column");
        conn.execute(Statement::from_string(backend, sql)).await?;
        Ok(true)
    }

    /// Rename a column
    pub async fn rename_column<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        from: &ColumnName,
        to: &ColumnName,
    ) -> MigrationResult<()> {
        let backend = conn.get_database_backend();
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            table.quoted(),
            from.quoted(),
            to.quoted()
        );
        debug!(table = %table, from = %from, to = %to, "renaming column");
        conn.execute(Statement::from_string(backend, sql)).await?;
        Ok(())
    }

    /// Change a column's type using the caller-supplied cast expression
    ///
    /// The using-expression must come from the compatibility checker;
    /// silently-truncating implicit casts are never issued. Postgres gets a
    /// native `ALTER COLUMN .. TYPE .. USING`; SQLite cannot alter a column
    /// type in place and is rebuilt through a staged temporary column.
    pub async fn change_column_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
        new_sql_type: &str,
        using_expr: &str,
    ) -> MigrationResult<()> {
        let backend = conn.get_database_backend();
        match Self::dialect(backend)? {
            SqlDialect::Postgres => {
                let sql = format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}",
                    table.quoted(),
                    column.quoted(),
                    new_sql_type,
                    using_expr
                );
                debug!(table = %table, column = %column, new_sql_type, "altering column type");
                conn.execute(Statement::from_string(backend, sql)).await?;
            }
            SqlDialect::Sqlite => {
                self.rebuild_column_sqlite(conn, table, column, new_sql_type, using_expr)
                    .await?;
            }
        }
        Ok(())
    }

    /// SQLite staged rebuild: add temp column, copy cast values, drop the
    /// original, rename the temp into place
    async fn rebuild_column_sqlite<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
        new_sql_type: &str,
        using_expr: &str,
    ) -> MigrationResult<()> {
        let backend = conn.get_database_backend();
        let tmp = Self::staging_column(column)?;

        debug!(table = %table, column = %column, new_sql_type, "rebuilding column via staging");
        self.add_column(conn, table, &tmp, new_sql_type).await?;

        let copy = format!(
            "UPDATE {} SET {} = {} WHERE {} IS NOT NULL",
            table.quoted(),
            tmp.quoted(),
            using_expr,
            column.quoted()
        );
        conn.execute(Statement::from_string(backend, copy)).await?;

        self.drop_column(conn, table, column).await?;
        self.rename_column(conn, table, &tmp, column).await?;
        Ok(())
    }

    /// Staging column name for the SQLite rebuild
    fn staging_column(column: &ColumnName) -> MigrationResult<ColumnName> {
        let mut base = column.as_str().to_string();
        base.truncate(50);
        ColumnName::new(format!("{base}_retype_tmp"))
            .map_err(|e| MigrationError::Execution(format!("staging column name: {e}")))
    }

    /// Count the non-null values currently stored in a column
    pub async fn count_nonnull<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
    ) -> MigrationResult<u64> {
        let backend = conn.get_database_backend();
        let sql = format!(
            "SELECT COUNT(*) AS cnt FROM {} WHERE {} IS NOT NULL",
            table.quoted(),
            column.quoted()
        );
        let row = conn
            .query_one(Statement::from_string(backend, sql))
            .await?
            .ok_or_else(|| MigrationError::Execution("count query returned no row".to_string()))?;
        Ok(row.try_get::<i64>("", "cnt")? as u64)
    }

    /// Fetch all non-null `(row id, value-as-text)` pairs of a column
    ///
    /// Values are cast to text so one code path serves every storage
    /// class; callers re-interpret them via the declared field type.
    pub async fn fetch_column_text<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
    ) -> MigrationResult<Vec<(i64, String)>> {
        let backend = conn.get_database_backend();
        let sql = format!(
            "SELECT \"id\", CAST({} AS TEXT) AS value FROM {} WHERE {} IS NOT NULL ORDER BY \"id\"",
            column.quoted(),
            table.quoted(),
            column.quoted()
        );
        let rows = conn.query_all(Statement::from_string(backend, sql)).await?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.try_get::<i64>("", "id")?;
            let value = row.try_get::<String>("", "value")?;
            pairs.push((id, value));
        }
        Ok(pairs)
    }

    /// Write a single value back by row id
    pub async fn update_row_value<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        column: &ColumnName,
        row_id: i64,
        value: Value,
    ) -> MigrationResult<u64> {
        let backend = conn.get_database_backend();
        let sql = match Self::dialect(backend)? {
            SqlDialect::Sqlite => format!(
                "UPDATE {} SET {} = ? WHERE \"id\" = ?",
                table.quoted(),
                column.quoted()
            ),
            SqlDialect::Postgres => format!(
                "UPDATE {} SET {} = $1 WHERE \"id\" = $2",
                table.quoted(),
                column.quoted()
            ),
        };
        let result = conn
            .execute(Statement::from_sql_and_values(
                backend,
                sql,
                [value, Value::from(row_id)],
            ))
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert a bare row into a dynamic table (testing and restore seams)
    pub async fn insert_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &TableName,
        form_id: i32,
    ) -> MigrationResult<()> {
        let backend = conn.get_database_backend();
        let sql = match Self::dialect(backend)? {
            SqlDialect::Sqlite => format!(
                "INSERT INTO {} (\"form_id\") VALUES (?)",
                table.quoted()
            ),
            SqlDialect::Postgres => format!(
                "INSERT INTO {} (\"form_id\") VALUES ($1)",
                table.quoted()
            ),
        };
        conn.execute(Statement::from_sql_and_values(
            backend,
            sql,
            [Value::from(form_id)],
        ))
        .await?;
        Ok(())
    }
}
