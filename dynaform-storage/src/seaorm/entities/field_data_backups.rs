use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Field data backup: a point-in-time snapshot of one column
///
/// Created immediately before a DELETE or CHANGE_TYPE migration. Owned by
/// the form (cascade) but survives the field it describes. Restoring flips
/// `is_restored`; restoring twice is an error, not a re-apply. Expired
/// backups are collected by an external sweep via `expires_at`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "field_data_backups")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique identifier for the backup
    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Owning form
    pub form_id: i32,

    /// Dynamic table the column lived in
    pub table_name: String,

    /// Backed-up column
    pub column_name: String,

    /// Declared semantic type at backup time
    pub field_type: String,

    /// The full set of (row_id, value) pairs present at backup time
    pub data: Json,

    /// Number of captured rows
    pub row_count: i32,

    /// Whether this backup has been consumed by a restore
    pub is_restored: bool,

    /// When the backup was taken
    pub created_at: ChronoDateTimeUtc,

    /// When the retention window ends
    pub expires_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forms::Entity",
        from = "Column::FormId",
        to = "super::forms::Column::Id"
    )]
    Form,
}

impl Related<super::forms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Form.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One captured (row id, value) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Row id in the dynamic table
    pub row_id: i64,
    /// The stored value, captured with its storage representation
    pub value: Json,
}

impl Model {
    /// Decode the captured entries
    pub fn entries(&self) -> Result<Vec<BackupEntry>, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Whether the retention window has passed
    pub fn is_expired(&self, now: ChronoDateTimeUtc) -> bool {
        now > self.expires_at
    }
}
