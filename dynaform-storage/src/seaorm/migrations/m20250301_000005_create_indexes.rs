use sea_orm_migration::prelude::*;

use super::m20250301_000002_create_form_fields_table::FormFields;
use super::m20250301_000003_create_field_migrations_table::FieldMigrations;
use super::m20250301_000004_create_field_data_backups_table::FieldDataBackups;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Index on form_fields.form_id for listing a form's fields
        manager
            .create_index(
                Index::create()
                    .name("idx_form_fields_form_id")
                    .table(FormFields::Table)
                    .col(FormFields::FormId)
                    .to_owned(),
            )
            .await?;

        // One active field per (form, column) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_form_fields_form_id_column_name")
                    .table(FormFields::Table)
                    .col(FormFields::FormId)
                    .col(FormFields::ColumnName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on field_migrations.form_id for history listings
        manager
            .create_index(
                Index::create()
                    .name("idx_field_migrations_form_id")
                    .table(FieldMigrations::Table)
                    .col(FieldMigrations::FormId)
                    .to_owned(),
            )
            .await?;

        // Index on field_migrations.field_uuid for per-field history
        manager
            .create_index(
                Index::create()
                    .name("idx_field_migrations_field_uuid")
                    .table(FieldMigrations::Table)
                    .col(FieldMigrations::FieldUuid)
                    .to_owned(),
            )
            .await?;

        // Index on field_data_backups.form_id
        manager
            .create_index(
                Index::create()
                    .name("idx_field_data_backups_form_id")
                    .table(FieldDataBackups::Table)
                    .col(FieldDataBackups::FormId)
                    .to_owned(),
            )
            .await?;

        // Index on field_data_backups.expires_at for the external expiry sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_field_data_backups_expires_at")
                    .table(FieldDataBackups::Table)
                    .col(FieldDataBackups::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_form_fields_form_id",
            "idx_form_fields_form_id_column_name",
            "idx_field_migrations_form_id",
            "idx_field_migrations_field_uuid",
            "idx_field_data_backups_form_id",
            "idx_field_data_backups_expires_at",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }
        Ok(())
    }
}
