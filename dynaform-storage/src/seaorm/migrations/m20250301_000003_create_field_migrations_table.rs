use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_forms_table::Forms;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No FK to form_fields: audit records must survive field deletion
        manager
            .create_table(
                Table::create()
                    .table(FieldMigrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FieldMigrations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FieldMigrations::Uuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(FieldMigrations::FormId).integer().not_null())
                    .col(ColumnDef::new(FieldMigrations::FieldUuid).uuid().not_null())
                    .col(ColumnDef::new(FieldMigrations::TableName).string().not_null())
                    .col(ColumnDef::new(FieldMigrations::ColumnName).string().not_null())
                    .col(ColumnDef::new(FieldMigrations::Kind).string().not_null())
                    .col(ColumnDef::new(FieldMigrations::OldValue).json())
                    .col(ColumnDef::new(FieldMigrations::NewValue).json())
                    .col(
                        ColumnDef::new(FieldMigrations::Status)
                            .string()
                            .not_null()
                            .default("applied"),
                    )
                    .col(
                        ColumnDef::new(FieldMigrations::CanRollback)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FieldMigrations::BackupId).integer())
                    .col(ColumnDef::new(FieldMigrations::Error).text())
                    .col(ColumnDef::new(FieldMigrations::ExecutedBy).string().not_null())
                    .col(
                        ColumnDef::new(FieldMigrations::ExecutedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(FieldMigrations::RolledBackAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_field_migrations_form_id")
                            .from(FieldMigrations::Table, FieldMigrations::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FieldMigrations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum FieldMigrations {
    Table,
    Id,
    Uuid,
    FormId,
    FieldUuid,
    TableName,
    ColumnName,
    Kind,
    OldValue,
    NewValue,
    Status,
    CanRollback,
    BackupId,
    Error,
    ExecutedBy,
    ExecutedAt,
    RolledBackAt,
}
