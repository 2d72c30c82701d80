use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Form entity: a named schema container owning an ordered set of fields
/// and exactly one dynamic table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "forms")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique identifier for the form
    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Form name
    pub name: String,

    /// Form description
    pub description: Option<String>,

    /// Name of the dynamic table backing this form
    ///
    /// Set once when the table is created lazily on the first field save;
    /// immutable afterwards.
    #[sea_orm(unique)]
    pub table_name: Option<String>,

    /// Who created the form
    pub created_by: String,

    /// When the form was created
    pub created_at: ChronoDateTimeUtc,

    /// When the form was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::form_fields::Entity")]
    FormFields,

    #[sea_orm(has_many = "super::field_migrations::Entity")]
    FieldMigrations,

    #[sea_orm(has_many = "super::field_data_backups::Entity")]
    FieldDataBackups,
}

impl Related<super::form_fields::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FormFields.def()
    }
}

impl Related<super::field_migrations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FieldMigrations.def()
    }
}

impl Related<super::field_data_backups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FieldDataBackups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Create a new form model ready for insertion
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: 0, // Will be set by database
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: None,
            table_name: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
