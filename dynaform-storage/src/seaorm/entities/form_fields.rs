use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Form field entity: the logical definition of one data point a
/// submission can carry
///
/// Invariant: at most one active field per (form, column_name) pair; the
/// column name is generated once from the title and stays stable unless
/// the field is explicitly renamed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "form_fields")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique identifier for the field
    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// Owning form
    pub form_id: i32,

    /// Human-readable title
    pub title: String,

    /// Semantic type (serialized `dynaform_core::FieldType`)
    pub field_type: String,

    /// Derived physical column name in the dynamic table
    pub column_name: String,

    /// Whether submissions must provide a value
    pub required: bool,

    /// Display position within the form
    pub display_order: i32,

    /// Option list for choice types
    pub options: Option<Json>,

    /// When the field was created
    pub created_at: ChronoDateTimeUtc,

    /// When the field was last updated
    pub updated_at: ChronoDateTimeUtc,
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

impl Model {
    /// Parse the stored semantic type
    pub fn parsed_field_type(
        &self,
    ) -> Result<dynaform_core::FieldType, dynaform_core::ValidationError> {
        self.field_type.parse()
    }
}
