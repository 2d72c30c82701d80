use crate::seaorm::{
    connection::DatabaseConnection,
    entities::{forms, Form, FormActiveModel, Forms},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

/// Repository for form-related database operations
#[derive(Clone)]
pub struct FormRepository {
    db: DatabaseConnection,
}

impl FormRepository {
    /// Create a new form repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new form
    pub async fn create(&self, form: Form) -> Result<Form, DbErr> {
        let active_model = FormActiveModel {
            uuid: Set(form.uuid),
            name: Set(form.name),
            description: Set(form.description),
            table_name: Set(form.table_name),
            created_by: Set(form.created_by),
            created_at: Set(form.created_at),
            updated_at: Set(form.updated_at),
            ..Default::default()
        };

        active_model.insert(self.db.get_connection()).await
    }

    /// Find form by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Form>, DbErr> {
        Forms::find_by_id(id).one(self.db.get_connection()).await
    }

    /// Find form by UUID
    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<Form>, DbErr> {
        Forms::find()
            .filter(forms::Column::Uuid.eq(uuid))
            .one(self.db.get_connection())
            .await
    }

    /// Record the dynamic table name after lazy creation
    ///
    /// The name is immutable once set; callers must only invoke this for
    /// forms whose `table_name` is still `None`.
    pub async fn set_table_name_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        form_id: i32,
        table_name: &str,
    ) -> Result<(), DbErr> {
        let active_model = FormActiveModel {
            id: Set(form_id),
            table_name: Set(Some(table_name.to_string())),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        active_model.update(conn).await?;
        Ok(())
    }

    /// Delete a form (cascades to fields, migrations, and backups)
    pub async fn delete(&self, id: i32) -> Result<(), DbErr> {
        Forms::delete_by_id(id)
            .exec(self.db.get_connection())
            .await?;
        Ok(())
    }
}
