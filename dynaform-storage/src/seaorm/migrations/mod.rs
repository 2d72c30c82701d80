use sea_orm_migration::prelude::*;

mod m20250301_000001_create_forms_table;
mod m20250301_000002_create_form_fields_table;
mod m20250301_000003_create_field_migrations_table;
mod m20250301_000004_create_field_data_backups_table;
mod m20250301_000005_create_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_forms_table::Migration),
            Box::new(m20250301_000002_create_form_fields_table::Migration),
            Box::new(m20250301_000003_create_field_migrations_table::Migration),
            Box::new(m20250301_000004_create_field_data_backups_table::Migration),
            Box::new(m20250301_000005_create_indexes::Migration),
        ]
    }
}
