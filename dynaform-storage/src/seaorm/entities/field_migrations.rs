use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field migration audit record
///
/// Append-only: created once per executed or attempted operation, owned by
/// the form (cascade) but deliberately not tied to the field row, so it
/// survives field deletion. The only permitted mutation flips the status
/// to rolled back.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "field_migrations")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique identifier for the migration
    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Owning form
    pub form_id: i32,

    /// The field this migration concerned (plain value, no FK)
    pub field_uuid: Uuid,

    /// Dynamic table the migration ran against
    pub table_name: String,

    /// Column affected (post-operation name)
    pub column_name: String,

    /// Migration kind: ADD | DELETE | RENAME | CHANGE_TYPE | REORDER
    pub kind: String,

    /// Field definition snapshot before the change
    pub old_value: Option<Json>,

    /// Field definition snapshot after the change
    pub new_value: Option<Json>,

    /// Status: applied | failed | rolled_back
    pub status: String,

    /// Whether a kind-specific inverse procedure exists
    pub can_rollback: bool,

    /// Backup consumed by rollback, when one was taken
    pub backup_id: Option<i32>,

    /// Error text for failed migrations
    pub error: Option<String>,

    /// Who executed the migration
    pub executed_by: String,

    /// When the migration executed
    pub executed_at: ChronoDateTimeUtc,

    /// When the migration was rolled back, if ever
    pub rolled_back_at: Option<ChronoDateTimeUtc>,
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

/// Kinds of field migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationKind {
    Add,
    Delete,
    Rename,
    ChangeType,
    Reorder,
}

impl MigrationKind {
    /// Get the string representation of the migration kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationKind::Add => "ADD",
            MigrationKind::Delete => "DELETE",
            MigrationKind::Rename => "RENAME",
            MigrationKind::ChangeType => "CHANGE_TYPE",
            MigrationKind::Reorder => "REORDER",
        }
    }
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MigrationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(MigrationKind::Add),
            "DELETE" => Ok(MigrationKind::Delete),
            "RENAME" => Ok(MigrationKind::Rename),
            "CHANGE_TYPE" => Ok(MigrationKind::ChangeType),
            "REORDER" => Ok(MigrationKind::Reorder),
            _ => Err(format!("unknown migration kind: {s}")),
        }
    }
}

/// Migration record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Applied,
    Failed,
    RolledBack,
}

impl MigrationStatus {
    /// Get the string representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Applied => "applied",
            MigrationStatus::Failed => "failed",
            MigrationStatus::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(MigrationStatus::Applied),
            "failed" => Ok(MigrationStatus::Failed),
            "rolled_back" => Ok(MigrationStatus::RolledBack),
            _ => Err(format!("unknown migration status: {s}")),
        }
    }
}

/// Structured field snapshot stored in `old_value` / `new_value`
///
/// Captures everything needed to reconstruct the field row during
/// rollback; independent of row ids and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub uuid: Uuid,
    pub title: String,
    pub field_type: String,
    pub column_name: String,
    pub required: bool,
    pub display_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Json>,
}

impl From<&super::form_fields::Model> for FieldSnapshot {
    fn from(field: &super::form_fields::Model) -> Self {
        Self {
            uuid: field.uuid,
            title: field.title.clone(),
            field_type: field.field_type.clone(),
            column_name: field.column_name.clone(),
            required: field.required,
            display_order: field.display_order,
            options: field.options.clone(),
        }
    }
}

impl FieldSnapshot {
    /// Rebuild a field row from this snapshot (rollback of a DELETE)
    pub fn into_field_model(self, form_id: i32) -> super::form_fields::Model {
        let now = chrono::Utc::now();
        super::form_fields::Model {
            id: 0, // Will be set by database
            uuid: self.uuid,
            form_id,
            title: self.title,
            field_type: self.field_type,
            column_name: self.column_name,
            required: self.required,
            display_order: self.display_order,
            options: self.options,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            MigrationKind::Add,
            MigrationKind::Delete,
            MigrationKind::Rename,
            MigrationKind::ChangeType,
            MigrationKind::Reorder,
        ] {
            assert_eq!(kind.as_str().parse::<MigrationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            MigrationStatus::Applied,
            MigrationStatus::Failed,
            MigrationStatus::RolledBack,
        ] {
            assert_eq!(status.as_str().parse::<MigrationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_snapshot_rebuilds_field() {
        let snapshot = FieldSnapshot {
            uuid: Uuid::new_v4(),
            title: "Phone".to_string(),
            field_type: "phone".to_string(),
            column_name: "phone".to_string(),
            required: true,
            display_order: 2,
            options: None,
        };
        let field = snapshot.clone().into_field_model(7);
        assert_eq!(field.form_id, 7);
        assert_eq!(field.uuid, snapshot.uuid);
        assert_eq!(field.column_name, "phone");
        assert!(field.required);
    }
}
