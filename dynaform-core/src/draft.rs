//! Field drafts: validated input for add-field operations

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::field_type::FieldType;

/// Maximum field title length
pub const MAX_TITLE_LEN: usize = 255;

/// A requested field definition, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDraft {
    /// Human-readable title, source of the derived column name
    pub title: String,

    /// Semantic type
    pub field_type: FieldType,

    /// Whether submissions must provide a value
    #[serde(default)]
    pub required: bool,

    /// Option list for choice types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FieldDraft {
    /// Create a draft with just a title and type
    pub fn new(title: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            title: title.into(),
            field_type,
            required: false,
            options: None,
        }
    }

    /// Builder-style required flag
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Builder-style option list
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    /// Validate the draft before any mutation happens
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong {
                max: MAX_TITLE_LEN,
                actual: title.chars().count(),
            });
        }
        if self.field_type.has_options()
            && self.options.as_ref().map_or(true, |o| o.is_empty())
        {
            return Err(ValidationError::MissingOptions(
                self.field_type.as_str().to_string(),
            ));
        }
        Ok(())
    }
}
