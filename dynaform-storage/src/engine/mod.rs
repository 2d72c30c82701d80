//! Field migration engine
//!
//! The [`MigrationEngine`] is the single entry point for every structural
//! change to a form's dynamic table. Each operation follows the same
//! protocol: acquire the per-table lock, validate against metadata and the
//! live schema, then run all metadata, backup, and audit writes together
//! with the DDL on one transaction, DDL ordered last. A failed DDL step
//! rolls the transaction back and leaves a standalone `failed` audit
//! record, so metadata and schema can never diverge silently.

pub mod backup;
pub mod compat;
pub mod error;
pub mod executor;
pub mod lock;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use dynaform_config::MigrationConfig;
use dynaform_core::{
    draft::MAX_TITLE_LEN, ColumnName, ColumnNameResolver, FieldDraft, FieldType, TableName,
    ValidationError,
};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde_json::Value as Json;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::seaorm::connection::DatabaseConnection;
use crate::seaorm::entities::{
    field_data_backups, field_migrations, form_fields, forms, FieldSnapshot, MigrationKind,
    MigrationStatus,
};
use crate::seaorm::repositories::{
    BackupRepository, FieldRepository, FormRepository, MigrationRepository,
};

use backup::BackupManager;
use compat::TypeCompatibilityValidator;
use error::{MigrationError, MigrationResult};
use executor::SchemaExecutor;
use lock::TableLockRegistry;

/// Result of a confirmed field deletion
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    /// The audit record for the deletion
    pub migration: field_migrations::Model,
    /// The column backup taken before the drop
    pub backup: field_data_backups::Model,
}

/// Result of rolling back a migration
#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    /// The rolled-back migration
    pub migration_uuid: Uuid,
    /// Kind of the original migration
    pub kind: MigrationKind,
    /// Rows written back from a backup, when one was consumed
    pub rows_restored: u64,
}

/// Orchestrates field migrations against forms' dynamic tables
#[derive(Clone)]
pub struct MigrationEngine {
    db: DatabaseConnection,
    resolver: Arc<dyn ColumnNameResolver>,
    config: MigrationConfig,
    locks: TableLockRegistry,
    forms: FormRepository,
    fields: FieldRepository,
    migrations: MigrationRepository,
    backups: BackupRepository,
    executor: SchemaExecutor,
    backup_manager: BackupManager,
    validator: TypeCompatibilityValidator,
}

impl MigrationEngine {
    /// Create an engine over an established connection
    pub fn new(
        db: DatabaseConnection,
        resolver: Arc<dyn ColumnNameResolver>,
        config: MigrationConfig,
    ) -> Self {
        let backup_manager = BackupManager::new(config.backup_retention_days);
        let validator = TypeCompatibilityValidator::new(config.incompatible_sample_limit);
        Self {
            forms: FormRepository::new(db.clone()),
            fields: FieldRepository::new(db.clone()),
            migrations: MigrationRepository::new(db.clone()),
            backups: BackupRepository::new(db.clone()),
            executor: SchemaExecutor::new(),
            backup_manager,
            validator,
            locks: TableLockRegistry::new(),
            db,
            resolver,
            config,
        }
    }

    /// The underlying database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Form repository handle
    pub fn forms(&self) -> &FormRepository {
        &self.forms
    }

    /// Field repository handle
    pub fn fields(&self) -> &FieldRepository {
        &self.fields
    }

    /// Audit-log repository handle
    pub fn migrations(&self) -> &MigrationRepository {
        &self.migrations
    }

    /// Backup repository handle
    pub fn backups(&self) -> &BackupRepository {
        &self.backups
    }

    /// Add a field to a form
    ///
    /// Creates the form's dynamic table on first use, derives the column
    /// name through the resolver, and appends the column after the field
    /// row and audit record are staged on the same transaction.
    pub async fn add_field(
        &self,
        form_uuid: Uuid,
        draft: FieldDraft,
        actor: &str,
    ) -> MigrationResult<form_fields::Model> {
        draft.validate()?;
        let form = self.form_by_uuid(form_uuid).await?;
        let (table, table_is_new) = self.table_for(&form)?;
        let _guard = self.locks.try_acquire(table.as_str())?;

        let field_uuid = Uuid::new_v4();
        let column = self.resolver.resolve(draft.title.trim(), field_uuid)?;

        if self
            .fields
            .find_by_column(form.id, column.as_str())
            .await?
            .is_some()
        {
            return Err(MigrationError::DuplicateColumnName {
                column: column.as_str().to_string(),
            });
        }
        // The metadata check above covers tracked fields; the live schema
        // can still disagree after an out-of-band change.
        if !table_is_new
            && self
                .executor
                .column_exists(self.db.get_connection(), &table, &column)
                .await?
        {
            return Err(MigrationError::DuplicateColumnName {
                column: column.as_str().to_string(),
            });
        }

        let dialect = SchemaExecutor::dialect(self.db.get_connection().get_database_backend())?;
        let sql_type = draft.field_type.sql_type(dialect);
        let display_order = self.fields.next_display_order(form.id).await?;

        let now = Utc::now();
        let field = form_fields::Model {
            id: 0,
            uuid: field_uuid,
            form_id: form.id,
            title: draft.title.trim().to_string(),
            field_type: draft.field_type.as_str().to_string(),
            column_name: column.as_str().to_string(),
            required: draft.required,
            display_order,
            options: draft
                .options
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            created_at: now,
            updated_at: now,
        };

        let txn = self.db.get_connection().begin().await?;
        let result: MigrationResult<form_fields::Model> = async {
            if table_is_new {
                self.executor.create_dynamic_table(&txn, &table).await?;
                self.forms
                    .set_table_name_in(&txn, form.id, table.as_str())
                    .await?;
            }
            let inserted = self.fields.insert_in(&txn, field).await?;
            let record = self.audit_record(
                form.id,
                field_uuid,
                &table,
                column.as_str(),
                MigrationKind::Add,
                None,
                Some(serde_json::to_value(FieldSnapshot::from(&inserted))?),
                true,
                None,
                actor,
            );
            self.migrations.insert_in(&txn, record).await?;
            self.executor.add_column(&txn, &table, &column, sql_type).await?;
            Ok(inserted)
        }
        .await;

        match result {
            Ok(inserted) => {
                txn.commit().await?;
                info!(
                    form = %form.uuid,
                    field = %inserted.uuid,
                    column = %column,
                    "field added"
                );
                Ok(inserted)
            }
            Err(err) => {
                drop(txn);
                self.record_failure(
                    form.id,
                    field_uuid,
                    &table,
                    column.as_str(),
                    MigrationKind::Add,
                    &err,
                    actor,
                )
                .await;
                Err(err)
            }
        }
    }

    /// Delete a field and its column, backing the column data up first
    ///
    /// Unconfirmed calls mutate nothing: they fail with the column name and
    /// the number of stored values at risk, so the caller can surface a
    /// meaningful confirmation prompt.
    pub async fn delete_field(
        &self,
        field_uuid: Uuid,
        confirmed: bool,
        actor: &str,
    ) -> MigrationResult<DeleteOutcome> {
        let field = self.field_by_uuid(field_uuid).await?;
        let form = self.form_by_id(field.form_id).await?;
        let table = self.existing_table(&form)?;
        let column = Self::stored_column(&field.column_name)?;
        let field_type = field.parsed_field_type()?;
        let _guard = self.locks.try_acquire(table.as_str())?;

        if !confirmed {
            let rows_at_risk = self
                .with_scan_timeout(self.executor.count_nonnull(
                    self.db.get_connection(),
                    &table,
                    &column,
                ))
                .await?;
            return Err(MigrationError::ConfirmationRequired {
                column: column.as_str().to_string(),
                rows_at_risk,
            });
        }

        let old_snapshot = serde_json::to_value(FieldSnapshot::from(&field))?;
        let txn = self.db.get_connection().begin().await?;
        let result: MigrationResult<DeleteOutcome> = async {
            let taken = self
                .with_scan_timeout(self.backup_manager.backup_column(
                    &txn,
                    &self.backups,
                    form.id,
                    &table,
                    &column,
                    field_type,
                ))
                .await?;
            self.fields.delete_in(&txn, field.id).await?;
            let record = self.audit_record(
                form.id,
                field.uuid,
                &table,
                column.as_str(),
                MigrationKind::Delete,
                Some(old_snapshot),
                None,
                true,
                Some(taken.id),
                actor,
            );
            let record = self.migrations.insert_in(&txn, record).await?;
            self.executor.drop_column(&txn, &table, &column).await?;
            Ok(DeleteOutcome {
                migration: record,
                backup: taken,
            })
        }
        .await;

        match result {
            Ok(outcome) => {
                txn.commit().await?;
                info!(
                    form = %form.uuid,
                    field = %field.uuid,
                    column = %column,
                    backup = %outcome.backup.uuid,
                    "field deleted"
                );
                Ok(outcome)
            }
            Err(err) => {
                drop(txn);
                self.record_failure(
                    form.id,
                    field.uuid,
                    &table,
                    column.as_str(),
                    MigrationKind::Delete,
                    &err,
                    actor,
                )
                .await;
                Err(err)
            }
        }
    }

    /// Rename a field: new title, new derived column name
    ///
    /// When the resolver maps the new title onto the current column name
    /// the rename is metadata-only and no DDL is issued.
    pub async fn rename_field(
        &self,
        field_uuid: Uuid,
        new_title: &str,
        actor: &str,
    ) -> MigrationResult<form_fields::Model> {
        Self::validate_title(new_title)?;
        let field = self.field_by_uuid(field_uuid).await?;
        let form = self.form_by_id(field.form_id).await?;
        let table = self.existing_table(&form)?;
        let old_column = Self::stored_column(&field.column_name)?;
        let _guard = self.locks.try_acquire(table.as_str())?;

        let new_column = self.resolver.resolve(new_title.trim(), field.uuid)?;
        let column_changes = new_column.as_str() != field.column_name;

        if column_changes {
            if self
                .fields
                .find_by_column(form.id, new_column.as_str())
                .await?
                .is_some()
            {
                return Err(MigrationError::DuplicateColumnName {
                    column: new_column.as_str().to_string(),
                });
            }
            if self
                .executor
                .column_exists(self.db.get_connection(), &table, &new_column)
                .await?
            {
                return Err(MigrationError::DuplicateColumnName {
                    column: new_column.as_str().to_string(),
                });
            }
        }

        let old_snapshot = serde_json::to_value(FieldSnapshot::from(&field))?;
        let txn = self.db.get_connection().begin().await?;
        let result: MigrationResult<form_fields::Model> = async {
            let updated = self
                .fields
                .rename_in(&txn, field.id, new_title.trim(), new_column.as_str())
                .await?;
            let record = self.audit_record(
                form.id,
                field.uuid,
                &table,
                new_column.as_str(),
                MigrationKind::Rename,
                Some(old_snapshot),
                Some(serde_json::to_value(FieldSnapshot::from(&updated))?),
                true,
                None,
                actor,
            );
            self.migrations.insert_in(&txn, record).await?;
            if column_changes {
                self.executor
                    .rename_column(&txn, &table, &old_column, &new_column)
                    .await?;
            }
            Ok(updated)
        }
        .await;

        match result {
            Ok(updated) => {
                txn.commit().await?;
                info!(
                    form = %form.uuid,
                    field = %field.uuid,
                    from = %old_column,
                    to = %new_column,
                    "field renamed"
                );
                Ok(updated)
            }
            Err(err) => {
                drop(txn);
                self.record_failure(
                    form.id,
                    field.uuid,
                    &table,
                    new_column.as_str(),
                    MigrationKind::Rename,
                    &err,
                    actor,
                )
                .await;
                Err(err)
            }
        }
    }

    /// Change a field's declared type, converting stored data in place
    ///
    /// Every stored value is trial-converted first; a single incompatible
    /// value rejects the operation before any backup or DDL. A compatible
    /// change always takes a backup, even of an empty column.
    pub async fn change_field_type(
        &self,
        field_uuid: Uuid,
        new_type: FieldType,
        actor: &str,
    ) -> MigrationResult<form_fields::Model> {
        let field = self.field_by_uuid(field_uuid).await?;
        let old_type = field.parsed_field_type()?;
        if old_type == new_type {
            debug!(field = %field.uuid, "type unchanged, nothing to do");
            return Ok(field);
        }

        let form = self.form_by_id(field.form_id).await?;
        let table = self.existing_table(&form)?;
        let column = Self::stored_column(&field.column_name)?;
        let _guard = self.locks.try_acquire(table.as_str())?;

        let report = self
            .with_scan_timeout(self.validator.check(
                self.db.get_connection(),
                &table,
                &column,
                old_type,
                new_type,
            ))
            .await?;
        if !report.compatible {
            return Err(MigrationError::TypeConversion {
                total: report.total,
                incompatible_count: report.incompatible_count,
                sample: report.sample,
            });
        }

        let dialect = SchemaExecutor::dialect(self.db.get_connection().get_database_backend())?;
        let old_snapshot = serde_json::to_value(FieldSnapshot::from(&field))?;
        let txn = self.db.get_connection().begin().await?;
        let result: MigrationResult<form_fields::Model> = async {
            let taken = self
                .with_scan_timeout(self.backup_manager.backup_column(
                    &txn,
                    &self.backups,
                    form.id,
                    &table,
                    &column,
                    old_type,
                ))
                .await?;
            let updated = self
                .fields
                .set_field_type_in(&txn, field.id, new_type.as_str())
                .await?;
            let record = self.audit_record(
                form.id,
                field.uuid,
                &table,
                column.as_str(),
                MigrationKind::ChangeType,
                Some(old_snapshot),
                Some(serde_json::to_value(FieldSnapshot::from(&updated))?),
                true,
                Some(taken.id),
                actor,
            );
            self.migrations.insert_in(&txn, record).await?;
            // Same physical representation needs no DDL
            if old_type.storage_class() != new_type.storage_class() {
                self.executor
                    .change_column_type(
                        &txn,
                        &table,
                        &column,
                        new_type.sql_type(dialect),
                        &report.using_expr,
                    )
                    .await?;
            }
            Ok(updated)
        }
        .await;

        match result {
            Ok(updated) => {
                txn.commit().await?;
                info!(
                    form = %form.uuid,
                    field = %field.uuid,
                    column = %column,
                    from = old_type.as_str(),
                    to = new_type.as_str(),
                    "field type changed"
                );
                Ok(updated)
            }
            Err(err) => {
                drop(txn);
                self.record_failure(
                    form.id,
                    field.uuid,
                    &table,
                    column.as_str(),
                    MigrationKind::ChangeType,
                    &err,
                    actor,
                )
                .await;
                Err(err)
            }
        }
    }

    /// Reorder a form's fields
    ///
    /// The input must be a permutation of the form's active field ids.
    /// Metadata-only: display order never touches the dynamic table.
    pub async fn reorder_fields(
        &self,
        form_uuid: Uuid,
        ordering: &[Uuid],
        actor: &str,
    ) -> MigrationResult<Vec<form_fields::Model>> {
        let form = self.form_by_uuid(form_uuid).await?;
        let fields = self.fields.find_for_form(form.id).await?;
        Self::validate_ordering(&fields, ordering)?;
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let table = self.existing_table(&form)?;
        let _guard = self.locks.try_acquire(table.as_str())?;

        let before: Vec<Uuid> = fields.iter().map(|f| f.uuid).collect();
        let by_uuid: HashMap<Uuid, i32> = fields.iter().map(|f| (f.uuid, f.id)).collect();

        let txn = self.db.get_connection().begin().await?;
        let result: MigrationResult<()> = async {
            for (position, uuid) in ordering.iter().enumerate() {
                let field_id = by_uuid.get(uuid).copied().ok_or_else(|| {
                    MigrationError::Execution(format!("field {uuid} not present on form"))
                })?;
                self.fields
                    .set_display_order_in(&txn, field_id, position as i32)
                    .await?;
            }
            // A REORDER concerns the whole form; the form uuid stands in
            // for the field reference and no column is involved.
            let record = self.audit_record(
                form.id,
                form.uuid,
                &table,
                "",
                MigrationKind::Reorder,
                Some(serde_json::to_value(&before)?),
                Some(serde_json::to_value(ordering)?),
                true,
                None,
                actor,
            );
            self.migrations.insert_in(&txn, record).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                txn.commit().await?;
                info!(form = %form.uuid, fields = ordering.len(), "fields reordered");
                self.fields.find_for_form(form.id).await.map_err(Into::into)
            }
            Err(err) => {
                drop(txn);
                self.record_failure(
                    form.id,
                    form.uuid,
                    &table,
                    "",
                    MigrationKind::Reorder,
                    &err,
                    actor,
                )
                .await;
                Err(err)
            }
        }
    }

    /// Roll back a previously applied migration
    ///
    /// Applies the kind-specific inverse and flips the original record to
    /// rolled back; history is never rewritten or deleted.
    pub async fn rollback_migration(
        &self,
        migration_uuid: Uuid,
        actor: &str,
    ) -> MigrationResult<RollbackOutcome> {
        let record = self
            .migrations
            .find_by_uuid(migration_uuid)
            .await?
            .ok_or_else(|| MigrationError::not_found("migration", migration_uuid))?;

        let status = record
            .status
            .parse::<MigrationStatus>()
            .map_err(MigrationError::Execution)?;
        if status == MigrationStatus::RolledBack {
            return Err(MigrationError::AlreadyRolledBack {
                migration: record.uuid,
            });
        }
        if !record.can_rollback || status == MigrationStatus::Failed {
            return Err(MigrationError::NotRollbackable {
                kind: record.kind.clone(),
            });
        }
        let kind = record
            .kind
            .parse::<MigrationKind>()
            .map_err(MigrationError::Execution)?;

        let form = self.form_by_id(record.form_id).await?;
        let table = TableName::new(record.table_name.clone())
            .map_err(|e| MigrationError::Execution(format!("stored table name: {e}")))?;
        let _guard = self.locks.try_acquire(table.as_str())?;

        let txn = self.db.get_connection().begin().await?;
        let result: MigrationResult<u64> = async {
            let rows_restored = match kind {
                MigrationKind::Add => self.undo_add(&txn, &record, &table).await?,
                MigrationKind::Delete => self.undo_delete(&txn, &record, &form, &table).await?,
                MigrationKind::Rename => self.undo_rename(&txn, &record, &table).await?,
                MigrationKind::ChangeType => {
                    self.undo_change_type(&txn, &record, &table).await?
                }
                MigrationKind::Reorder => self.undo_reorder(&txn, &record, &form).await?,
            };
            self.migrations.mark_rolled_back_in(&txn, record.id).await?;
            Ok(rows_restored)
        }
        .await;

        match result {
            Ok(rows_restored) => {
                txn.commit().await?;
                info!(
                    migration = %record.uuid,
                    kind = %kind,
                    rows_restored,
                    actor,
                    "migration rolled back"
                );
                Ok(RollbackOutcome {
                    migration_uuid: record.uuid,
                    kind,
                    rows_restored,
                })
            }
            Err(err) => {
                drop(txn);
                Err(err)
            }
        }
    }

    /// Migration history for a form, newest first
    pub async fn list_history(
        &self,
        form_uuid: Uuid,
    ) -> MigrationResult<Vec<field_migrations::Model>> {
        let form = self.form_by_uuid(form_uuid).await?;
        self.migrations.list_for_form(form.id).await.map_err(Into::into)
    }

    /// Restore a backup into its (still existing) column
    ///
    /// A restore never re-creates a dropped column; rolling back the DELETE
    /// migration is the path that does.
    pub async fn restore_backup(&self, backup_uuid: Uuid) -> MigrationResult<u64> {
        let backup = self
            .backups
            .find_by_uuid(backup_uuid)
            .await?
            .ok_or_else(|| MigrationError::not_found("backup", backup_uuid))?;
        let form = self.form_by_id(backup.form_id).await?;
        let table = self.existing_table(&form)?;
        let column = Self::stored_column(&backup.column_name)?;

        if !self
            .executor
            .column_exists(self.db.get_connection(), &table, &column)
            .await?
        {
            return Err(MigrationError::not_found("column", column.as_str()));
        }

        let _guard = self.locks.try_acquire(table.as_str())?;
        let txn = self.db.get_connection().begin().await?;
        let rows = self
            .backup_manager
            .restore(&txn, &self.backups, &backup, &table, &column)
            .await?;
        txn.commit().await?;
        Ok(rows)
    }

    // ---- rollback inverses -------------------------------------------------

    async fn undo_add<C: sea_orm::ConnectionTrait>(
        &self,
        txn: &C,
        record: &field_migrations::Model,
        table: &TableName,
    ) -> MigrationResult<u64> {
        let column = Self::stored_column(&record.column_name)?;
        if let Some(field) = self.fields.find_by_uuid_in(txn, record.field_uuid).await? {
            self.fields.delete_in(txn, field.id).await?;
        }
        self.executor.drop_column(txn, table, &column).await?;
        Ok(0)
    }

    async fn undo_delete<C: sea_orm::ConnectionTrait>(
        &self,
        txn: &C,
        record: &field_migrations::Model,
        form: &forms::Model,
        table: &TableName,
    ) -> MigrationResult<u64> {
        let snapshot = Self::snapshot(&record.old_value)?;
        let column = Self::stored_column(&snapshot.column_name)?;
        let field_type: FieldType = snapshot.field_type.parse()?;

        if self
            .fields
            .find_by_column_in(txn, form.id, column.as_str())
            .await?
            .is_some()
        {
            return Err(MigrationError::DuplicateColumnName {
                column: column.as_str().to_string(),
            });
        }

        let dialect = SchemaExecutor::dialect(self.db.get_connection().get_database_backend())?;
        self.fields
            .insert_in(txn, snapshot.into_field_model(form.id))
            .await?;
        self.executor
            .add_column(txn, table, &column, field_type.sql_type(dialect))
            .await?;

        let mut rows = 0;
        if let Some(backup_id) = record.backup_id {
            let backup = self
                .backups
                .find_by_id_in(txn, backup_id)
                .await?
                .ok_or_else(|| MigrationError::not_found("backup", backup_id))?;
            rows = self
                .backup_manager
                .restore(txn, &self.backups, &backup, table, &column)
                .await?;
        }
        Ok(rows)
    }

    async fn undo_rename<C: sea_orm::ConnectionTrait>(
        &self,
        txn: &C,
        record: &field_migrations::Model,
        table: &TableName,
    ) -> MigrationResult<u64> {
        let old = Self::snapshot(&record.old_value)?;
        let new = Self::snapshot(&record.new_value)?;
        let field = self
            .fields
            .find_by_uuid_in(txn, record.field_uuid)
            .await?
            .ok_or_else(|| MigrationError::not_found("field", record.field_uuid))?;

        self.fields
            .rename_in(txn, field.id, &old.title, &old.column_name)
            .await?;
        if old.column_name != new.column_name {
            let from = Self::stored_column(&new.column_name)?;
            let to = Self::stored_column(&old.column_name)?;
            self.executor.rename_column(txn, table, &from, &to).await?;
        }
        Ok(0)
    }

    async fn undo_change_type<C: sea_orm::ConnectionTrait>(
        &self,
        txn: &C,
        record: &field_migrations::Model,
        table: &TableName,
    ) -> MigrationResult<u64> {
        let old = Self::snapshot(&record.old_value)?;
        let new = Self::snapshot(&record.new_value)?;
        let old_type: FieldType = old.field_type.parse()?;
        let new_type: FieldType = new.field_type.parse()?;
        let column = Self::stored_column(&record.column_name)?;
        let field = self
            .fields
            .find_by_uuid_in(txn, record.field_uuid)
            .await?
            .ok_or_else(|| MigrationError::not_found("field", record.field_uuid))?;

        self.fields
            .set_field_type_in(txn, field.id, &old.field_type)
            .await?;
        if old_type.storage_class() != new_type.storage_class() {
            let dialect =
                SchemaExecutor::dialect(self.db.get_connection().get_database_backend())?;
            let using_expr = TypeCompatibilityValidator::using_expr(dialect, &column, old_type);
            self.executor
                .change_column_type(txn, table, &column, old_type.sql_type(dialect), &using_expr)
                .await?;
        }

        let mut rows = 0;
        if let Some(backup_id) = record.backup_id {
            let backup = self
                .backups
                .find_by_id_in(txn, backup_id)
                .await?
                .ok_or_else(|| MigrationError::not_found("backup", backup_id))?;
            rows = self
                .backup_manager
                .restore(txn, &self.backups, &backup, table, &column)
                .await?;
        }
        Ok(rows)
    }

    async fn undo_reorder<C: sea_orm::ConnectionTrait>(
        &self,
        txn: &C,
        record: &field_migrations::Model,
        form: &forms::Model,
    ) -> MigrationResult<u64> {
        let before: Vec<Uuid> = serde_json::from_value(
            record
                .old_value
                .clone()
                .ok_or_else(|| MigrationError::Execution("reorder record lacks old ordering".to_string()))?,
        )?;
        let fields = self.fields.find_for_form_in(txn, form.id).await?;
        let by_uuid: HashMap<Uuid, i32> = fields.iter().map(|f| (f.uuid, f.id)).collect();

        for (position, uuid) in before.iter().enumerate() {
            // Fields deleted since the reorder simply fall out of the order
            if let Some(field_id) = by_uuid.get(uuid) {
                self.fields
                    .set_display_order_in(txn, *field_id, position as i32)
                    .await?;
            }
        }
        Ok(0)
    }

    // ---- shared helpers ----------------------------------------------------

    async fn form_by_uuid(&self, uuid: Uuid) -> MigrationResult<forms::Model> {
        self.forms
            .find_by_uuid(uuid)
            .await?
            .ok_or_else(|| MigrationError::not_found("form", uuid))
    }

    async fn form_by_id(&self, id: i32) -> MigrationResult<forms::Model> {
        self.forms
            .find_by_id(id)
            .await?
            .ok_or_else(|| MigrationError::not_found("form", id))
    }

    async fn field_by_uuid(&self, uuid: Uuid) -> MigrationResult<form_fields::Model> {
        self.fields
            .find_by_uuid(uuid)
            .await?
            .ok_or_else(|| MigrationError::not_found("field", uuid))
    }

    /// Resolve the form's dynamic table, deriving a fresh name when the
    /// table does not exist yet
    fn table_for(&self, form: &forms::Model) -> MigrationResult<(TableName, bool)> {
        match &form.table_name {
            Some(name) => Ok((Self::stored_table(name)?, false)),
            None => {
                let name = format!("{}{}", self.config.table_prefix, form.uuid.simple());
                let table = TableName::new(name)
                    .map_err(|e| MigrationError::Execution(format!("derived table name: {e}")))?;
                Ok((table, true))
            }
        }
    }

    /// Resolve the form's dynamic table, requiring that it already exists
    fn existing_table(&self, form: &forms::Model) -> MigrationResult<TableName> {
        let name = form.table_name.as_deref().ok_or_else(|| {
            MigrationError::Execution(format!("form {} has no dynamic table yet", form.uuid))
        })?;
        Self::stored_table(name)
    }

    fn stored_table(name: &str) -> MigrationResult<TableName> {
        TableName::new(name)
            .map_err(|e| MigrationError::Execution(format!("stored table name: {e}")))
    }

    fn stored_column(name: &str) -> MigrationResult<ColumnName> {
        ColumnName::new(name)
            .map_err(|e| MigrationError::Execution(format!("stored column name: {e}")))
    }

    fn snapshot(value: &Option<Json>) -> MigrationResult<FieldSnapshot> {
        let value = value
            .clone()
            .ok_or_else(|| MigrationError::Execution("audit record lacks a snapshot".to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    fn validate_title(title: &str) -> Result<(), ValidationError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong {
                max: MAX_TITLE_LEN,
                actual: trimmed.chars().count(),
            });
        }
        Ok(())
    }

    fn validate_ordering(
        fields: &[form_fields::Model],
        ordering: &[Uuid],
    ) -> Result<(), ValidationError> {
        if ordering.len() != fields.len() {
            return Err(ValidationError::InvalidOrdering(format!(
                "expected {} field id(s), got {}",
                fields.len(),
                ordering.len()
            )));
        }
        let seen: HashSet<Uuid> = ordering.iter().copied().collect();
        if seen.len() != ordering.len() {
            return Err(ValidationError::InvalidOrdering(
                "ordering contains duplicate field ids".to_string(),
            ));
        }
        for field in fields {
            if !seen.contains(&field.uuid) {
                return Err(ValidationError::InvalidOrdering(format!(
                    "field {} missing from ordering",
                    field.uuid
                )));
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn audit_record(
        &self,
        form_id: i32,
        field_uuid: Uuid,
        table: &TableName,
        column: &str,
        kind: MigrationKind,
        old_value: Option<Json>,
        new_value: Option<Json>,
        can_rollback: bool,
        backup_id: Option<i32>,
        actor: &str,
    ) -> field_migrations::Model {
        field_migrations::Model {
            id: 0,
            uuid: Uuid::new_v4(),
            form_id,
            field_uuid,
            table_name: table.as_str().to_string(),
            column_name: column.to_string(),
            kind: kind.as_str().to_string(),
            old_value,
            new_value,
            status: MigrationStatus::Applied.as_str().to_string(),
            can_rollback,
            backup_id,
            error: None,
            executed_by: actor.to_string(),
            executed_at: Utc::now(),
            rolled_back_at: None,
        }
    }

    /// Best-effort failed-migration bookkeeping after a rolled-back txn
    async fn record_failure(
        &self,
        form_id: i32,
        field_uuid: Uuid,
        table: &TableName,
        column: &str,
        kind: MigrationKind,
        err: &MigrationError,
        actor: &str,
    ) {
        let mut record = self.audit_record(
            form_id, field_uuid, table, column, kind, None, None, false, None, actor,
        );
        record.status = MigrationStatus::Failed.as_str().to_string();
        record.error = Some(err.to_string());

        if let Err(audit_err) = self.migrations.record_failure(record).await {
            error!(%audit_err, table = %table, "could not write failure audit record");
        }
    }

    async fn with_scan_timeout<T, F>(&self, fut: F) -> MigrationResult<T>
    where
        F: Future<Output = MigrationResult<T>>,
    {
        let seconds = self.config.scan_timeout.as_secs();
        match tokio::time::timeout(self.config.scan_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MigrationError::Timeout { seconds }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(uuid: Uuid, order: i32) -> form_fields::Model {
        let now = Utc::now();
        form_fields::Model {
            id: order,
            uuid,
            form_id: 1,
            title: format!("Field {order}"),
            field_type: "short_text".to_string(),
            column_name: format!("field_{order}"),
            required: false,
            display_order: order,
            options: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ordering_must_be_complete() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let fields = vec![field(a, 0), field(b, 1)];

        assert!(MigrationEngine::validate_ordering(&fields, &[b, a]).is_ok());
        assert!(matches!(
            MigrationEngine::validate_ordering(&fields, &[a]),
            Err(ValidationError::InvalidOrdering(_))
        ));
    }

    #[test]
    fn test_ordering_rejects_duplicates_and_strangers() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let fields = vec![field(a, 0), field(b, 1)];

        assert!(matches!(
            MigrationEngine::validate_ordering(&fields, &[a, a]),
            Err(ValidationError::InvalidOrdering(_))
        ));
        assert!(matches!(
            MigrationEngine::validate_ordering(&fields, &[a, Uuid::new_v4()]),
            Err(ValidationError::InvalidOrdering(_))
        ));
    }

    #[test]
    fn test_title_validation() {
        assert!(MigrationEngine::validate_title("Phone").is_ok());
        assert!(matches!(
            MigrationEngine::validate_title("  "),
            Err(ValidationError::EmptyTitle)
        ));
        assert!(matches!(
            MigrationEngine::validate_title(&"x".repeat(300)),
            Err(ValidationError::TitleTooLong { .. })
        ));
    }
}
