use crate::seaorm::{
    connection::DatabaseConnection,
    entities::{form_fields, FormField, FormFieldActiveModel, FormFields},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

/// Repository for form field metadata operations
#[derive(Clone)]
pub struct FieldRepository {
    db: DatabaseConnection,
}

impl FieldRepository {
    /// Create a new field repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find field by UUID
    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<FormField>, DbErr> {
        self.find_by_uuid_in(self.db.get_connection(), uuid).await
    }

    /// Find field by UUID on the caller's connection
    pub async fn find_by_uuid_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        uuid: Uuid,
    ) -> Result<Option<FormField>, DbErr> {
        FormFields::find()
            .filter(form_fields::Column::Uuid.eq(uuid))
            .one(conn)
            .await
    }

    /// All active fields of a form, in display order
    pub async fn find_for_form(&self, form_id: i32) -> Result<Vec<FormField>, DbErr> {
        self.find_for_form_in(self.db.get_connection(), form_id).await
    }

    /// All active fields of a form on the caller's connection
    pub async fn find_for_form_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        form_id: i32,
    ) -> Result<Vec<FormField>, DbErr> {
        FormFields::find()
            .filter(form_fields::Column::FormId.eq(form_id))
            .order_by_asc(form_fields::Column::DisplayOrder)
            .all(conn)
            .await
    }

    /// Find the active field holding a given column name, if any
    pub async fn find_by_column(
        &self,
        form_id: i32,
        column_name: &str,
    ) -> Result<Option<FormField>, DbErr> {
        self.find_by_column_in(self.db.get_connection(), form_id, column_name)
            .await
    }

    /// Column lookup on the caller's connection
    pub async fn find_by_column_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        form_id: i32,
        column_name: &str,
    ) -> Result<Option<FormField>, DbErr> {
        FormFields::find()
            .filter(form_fields::Column::FormId.eq(form_id))
            .filter(form_fields::Column::ColumnName.eq(column_name))
            .one(conn)
            .await
    }

    /// Next display-order slot for a form
    pub async fn next_display_order(&self, form_id: i32) -> Result<i32, DbErr> {
        let fields = self.find_for_form(form_id).await?;
        Ok(fields.iter().map(|f| f.display_order).max().unwrap_or(-1) + 1)
    }

    /// Insert a field row inside the caller's transaction
    pub async fn insert_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        field: FormField,
    ) -> Result<FormField, DbErr> {
        let active_model = FormFieldActiveModel {
            uuid: Set(field.uuid),
            form_id: Set(field.form_id),
            title: Set(field.title),
            field_type: Set(field.field_type),
            column_name: Set(field.column_name),
            required: Set(field.required),
            display_order: Set(field.display_order),
            options: Set(field.options),
            created_at: Set(field.created_at),
            updated_at: Set(field.updated_at),
            ..Default::default()
        };

        active_model.insert(conn).await
    }

    /// Update a field's title and column name inside the caller's transaction
    pub async fn rename_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        field_id: i32,
        title: &str,
        column_name: &str,
    ) -> Result<FormField, DbErr> {
        let active_model = FormFieldActiveModel {
            id: Set(field_id),
            title: Set(title.to_string()),
            column_name: Set(column_name.to_string()),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        active_model.update(conn).await
    }

    /// Update a field's declared type inside the caller's transaction
    pub async fn set_field_type_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        field_id: i32,
        field_type: &str,
    ) -> Result<FormField, DbErr> {
        let active_model = FormFieldActiveModel {
            id: Set(field_id),
            field_type: Set(field_type.to_string()),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        active_model.update(conn).await
    }

    /// Update a field's display order inside the caller's transaction
    pub async fn set_display_order_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        field_id: i32,
        display_order: i32,
    ) -> Result<(), DbErr> {
        let active_model = FormFieldActiveModel {
            id: Set(field_id),
            display_order: Set(display_order),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        active_model.update(conn).await?;
        Ok(())
    }

    /// Delete a field row inside the caller's transaction
    pub async fn delete_in<C: ConnectionTrait>(&self, conn: &C, field_id: i32) -> Result<(), DbErr> {
        FormFields::delete_by_id(field_id).exec(conn).await?;
        Ok(())
    }
}
