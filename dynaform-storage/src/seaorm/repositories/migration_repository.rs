use crate::seaorm::{
    connection::DatabaseConnection,
    entities::{
        field_migrations, FieldMigration, FieldMigrationActiveModel, FieldMigrations,
        MigrationStatus,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

/// Repository for the append-only migration audit log
#[derive(Clone)]
pub struct MigrationRepository {
    db: DatabaseConnection,
}

impl MigrationRepository {
    /// Create a new migration repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find migration by UUID
    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<FieldMigration>, DbErr> {
        FieldMigrations::find()
            .filter(field_migrations::Column::Uuid.eq(uuid))
            .one(self.db.get_connection())
            .await
    }

    /// Migration history for a form, newest first
    pub async fn list_for_form(&self, form_id: i32) -> Result<Vec<FieldMigration>, DbErr> {
        FieldMigrations::find()
            .filter(field_migrations::Column::FormId.eq(form_id))
            .order_by_desc(field_migrations::Column::ExecutedAt)
            .order_by_desc(field_migrations::Column::Id)
            .all(self.db.get_connection())
            .await
    }

    /// Append an audit record inside the caller's transaction
    pub async fn insert_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        migration: FieldMigration,
    ) -> Result<FieldMigration, DbErr> {
        let active_model = FieldMigrationActiveModel {
            uuid: Set(migration.uuid),
            form_id: Set(migration.form_id),
            field_uuid: Set(migration.field_uuid),
            table_name: Set(migration.table_name),
            column_name: Set(migration.column_name),
            kind: Set(migration.kind),
            old_value: Set(migration.old_value),
            new_value: Set(migration.new_value),
            status: Set(migration.status),
            can_rollback: Set(migration.can_rollback),
            backup_id: Set(migration.backup_id),
            error: Set(migration.error),
            executed_by: Set(migration.executed_by),
            executed_at: Set(migration.executed_at),
            rolled_back_at: Set(migration.rolled_back_at),
            ..Default::default()
        };

        active_model.insert(conn).await
    }

    /// Flip a record's status to rolled back
    ///
    /// The one mutation audit records permit; history is never rewritten.
    pub async fn mark_rolled_back_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        migration_id: i32,
    ) -> Result<(), DbErr> {
        let active_model = FieldMigrationActiveModel {
            id: Set(migration_id),
            status: Set(MigrationStatus::RolledBack.as_str().to_string()),
            rolled_back_at: Set(Some(chrono::Utc::now())),
            ..Default::default()
        };

        active_model.update(conn).await?;
        Ok(())
    }

    /// Append a failed-migration record outside any transaction
    ///
    /// Used after a DDL failure rolled back the operation's transaction, so
    /// the metadata/schema discrepancy window always leaves a trace.
    pub async fn record_failure(&self, migration: FieldMigration) -> Result<FieldMigration, DbErr> {
        self.insert_in(self.db.get_connection(), migration).await
    }
}
