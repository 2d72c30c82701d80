//! Builder pattern utilities for creating test entities

use chrono::Utc;
use uuid::Uuid;

use crate::seaorm::entities::{form_fields, forms};

/// Builder for test forms
pub struct FormBuilder {
    form: forms::Model,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self {
            form: forms::Model::new("test-form", "test-user"),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.form.name = name.into();
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.form.uuid = uuid;
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.form.table_name = Some(table_name.into());
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.form.created_by = created_by.into();
        self
    }

    pub fn build(self) -> forms::Model {
        self.form
    }
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for test field rows
pub struct FieldBuilder {
    field: form_fields::Model,
}

impl FieldBuilder {
    pub fn new(form_id: i32) -> Self {
        let now = Utc::now();
        Self {
            field: form_fields::Model {
                id: 0,
                uuid: Uuid::new_v4(),
                form_id,
                title: "Test field".to_string(),
                field_type: "short_text".to_string(),
                column_name: "test_field".to_string(),
                required: false,
                display_order: 0,
                options: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.field.title = title.into();
        self
    }

    pub fn with_field_type(mut self, field_type: impl Into<String>) -> Self {
        self.field.field_type = field_type.into();
        self
    }

    pub fn with_column_name(mut self, column_name: impl Into<String>) -> Self {
        self.field.column_name = column_name.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.field.required = required;
        self
    }

    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.field.display_order = display_order;
        self
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.field.options = Some(options);
        self
    }

    pub fn build(self) -> form_fields::Model {
        self.field
    }
}
