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
                    .table(FormFields::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormFields::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormFields::Uuid).uuid().not_null().unique_key())
                    .col(ColumnDef::new(FormFields::FormId).integer().not_null())
                    .col(ColumnDef::new(FormFields::Title).string().not_null())
                    .col(ColumnDef::new(FormFields::FieldType).string().not_null())
                    .col(ColumnDef::new(FormFields::ColumnName).string().not_null())
                    .col(
                        ColumnDef::new(FormFields::Required)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FormFields::DisplayOrder).integer().not_null())
                    .col(ColumnDef::new(FormFields::Options).json())
                    .col(
                        ColumnDef::new(FormFields::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FormFields::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_fields_form_id")
                            .from(FormFields::Table, FormFields::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FormFields::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum FormFields {
    Table,
    Id,
    Uuid,
    FormId,
    Title,
    FieldType,
    ColumnName,
    Required,
    DisplayOrder,
    Options,
    CreatedAt,
    UpdatedAt,
}
