use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_forms_table::Forms;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FieldDataBackups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FieldDataBackups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FieldDataBackups::Uuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(FieldDataBackups::FormId).integer().not_null())
                    .col(ColumnDef::new(FieldDataBackups::TableName).string().not_null())
                    .col(ColumnDef::new(FieldDataBackups::ColumnName).string().not_null())
                    .col(ColumnDef::new(FieldDataBackups::FieldType).string().not_null())
                    .col(ColumnDef::new(FieldDataBackups::Data).json().not_null())
                    .col(ColumnDef::new(FieldDataBackups::RowCount).integer().not_null())
                    .col(
                        ColumnDef::new(FieldDataBackups::IsRestored)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FieldDataBackups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FieldDataBackups::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_field_data_backups_form_id")
                            .from(FieldDataBackups::Table, FieldDataBackups::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FieldDataBackups::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum FieldDataBackups {
    Table,
    Id,
    Uuid,
    FormId,
    TableName,
    ColumnName,
    FieldType,
    Data,
    RowCount,
    IsRestored,
    CreatedAt,
    ExpiresAt,
}
