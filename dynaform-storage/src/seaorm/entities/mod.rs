pub mod field_data_backups;
pub mod field_migrations;
pub mod form_fields;
pub mod forms;

pub use field_data_backups::{
    ActiveModel as FieldDataBackupActiveModel, BackupEntry, Column as FieldDataBackupColumn,
    Entity as FieldDataBackups, Model as FieldDataBackup,
};
pub use field_migrations::{
    ActiveModel as FieldMigrationActiveModel, Column as FieldMigrationColumn,
    Entity as FieldMigrations, FieldSnapshot, MigrationKind, MigrationStatus,
    Model as FieldMigration,
};
pub use form_fields::{
    ActiveModel as FormFieldActiveModel, Column as FormFieldColumn, Entity as FormFields,
    Model as FormField,
};
pub use forms::{ActiveModel as FormActiveModel, Column as FormColumn, Entity as Forms, Model as Form};
