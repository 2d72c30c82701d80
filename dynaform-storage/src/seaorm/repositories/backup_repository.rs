use crate::seaorm::{
    connection::DatabaseConnection,
    entities::{field_data_backups, FieldDataBackup, FieldDataBackupActiveModel, FieldDataBackups},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

/// Repository for column data backups
#[derive(Clone)]
pub struct BackupRepository {
    db: DatabaseConnection,
}

impl BackupRepository {
    /// Create a new backup repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find backup by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<FieldDataBackup>, DbErr> {
        self.find_by_id_in(self.db.get_connection(), id).await
    }

    /// Find backup by ID on the caller's connection
    pub async fn find_by_id_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i32,
    ) -> Result<Option<FieldDataBackup>, DbErr> {
        FieldDataBackups::find_by_id(id).one(conn).await
    }

    /// Find backup by UUID
    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<FieldDataBackup>, DbErr> {
        FieldDataBackups::find()
            .filter(field_data_backups::Column::Uuid.eq(uuid))
            .one(self.db.get_connection())
            .await
    }

    /// Backups whose retention window has passed, oldest first
    ///
    /// Consumed by the external expiry sweep.
    pub async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<FieldDataBackup>, DbErr> {
        FieldDataBackups::find()
            .filter(field_data_backups::Column::ExpiresAt.lt(now))
            .order_by_asc(field_data_backups::Column::ExpiresAt)
            .all(self.db.get_connection())
            .await
    }

    /// Persist a backup inside the caller's transaction
    pub async fn insert_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        backup: FieldDataBackup,
    ) -> Result<FieldDataBackup, DbErr> {
        let active_model = FieldDataBackupActiveModel {
            uuid: Set(backup.uuid),
            form_id: Set(backup.form_id),
            table_name: Set(backup.table_name),
            column_name: Set(backup.column_name),
            field_type: Set(backup.field_type),
            data: Set(backup.data),
            row_count: Set(backup.row_count),
            is_restored: Set(backup.is_restored),
            created_at: Set(backup.created_at),
            expires_at: Set(backup.expires_at),
            ..Default::default()
        };

        active_model.insert(conn).await
    }

    /// Flip the consumed flag after a successful restore
    pub async fn mark_restored_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        backup_id: i32,
    ) -> Result<(), DbErr> {
        let active_model = FieldDataBackupActiveModel {
            id: Set(backup_id),
            is_restored: Set(true),
            ..Default::default()
        };

        active_model.update(conn).await?;
        Ok(())
    }
}
