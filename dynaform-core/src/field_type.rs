//! Semantic field types and their SQL column mapping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// SQL dialects the engine can emit DDL for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    Sqlite,
    Postgres,
}

/// Semantic type of a form field
///
/// This is the logical type a form author picks; the physical column type
/// is derived from it per dialect via [`FieldType::sql_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    ShortText,
    LongText,
    Email,
    Phone,
    Number,
    Url,
    Date,
    Time,
    DateTime,
    SingleChoice,
    MultiChoice,
    Rating,
    Slider,
    GeoPoint,
    Province,
    FileUpload,
}

/// Storage representation class of a field type
///
/// Two field types in the same class share a physical representation, so a
/// type change between them never needs a value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Text,
    Integer,
    Float,
    Date,
    Time,
    Timestamp,
    Json,
}

impl FieldType {
    /// Get the string representation of the field type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::ShortText => "short_text",
            FieldType::LongText => "long_text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Number => "number",
            FieldType::Url => "url",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DateTime => "date_time",
            FieldType::SingleChoice => "single_choice",
            FieldType::MultiChoice => "multi_choice",
            FieldType::Rating => "rating",
            FieldType::Slider => "slider",
            FieldType::GeoPoint => "geo_point",
            FieldType::Province => "province",
            FieldType::FileUpload => "file_upload",
        }
    }

    /// Get all supported field types
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::ShortText,
            FieldType::LongText,
            FieldType::Email,
            FieldType::Phone,
            FieldType::Number,
            FieldType::Url,
            FieldType::Date,
            FieldType::Time,
            FieldType::DateTime,
            FieldType::SingleChoice,
            FieldType::MultiChoice,
            FieldType::Rating,
            FieldType::Slider,
            FieldType::GeoPoint,
            FieldType::Province,
            FieldType::FileUpload,
        ]
    }

    /// Physical SQL column type for this field type in the given dialect
    pub fn sql_type(&self, dialect: SqlDialect) -> &'static str {
        match self.storage_class() {
            StorageClass::Text => "TEXT",
            StorageClass::Integer => match dialect {
                SqlDialect::Sqlite => "INTEGER",
                SqlDialect::Postgres => "BIGINT",
            },
            StorageClass::Float => match dialect {
                SqlDialect::Sqlite => "REAL",
                SqlDialect::Postgres => "DOUBLE PRECISION",
            },
            StorageClass::Date => match dialect {
                SqlDialect::Sqlite => "TEXT",
                SqlDialect::Postgres => "DATE",
            },
            StorageClass::Time => match dialect {
                SqlDialect::Sqlite => "TEXT",
                SqlDialect::Postgres => "TIME",
            },
            StorageClass::Timestamp => match dialect {
                SqlDialect::Sqlite => "TEXT",
                SqlDialect::Postgres => "TIMESTAMPTZ",
            },
            StorageClass::Json => match dialect {
                SqlDialect::Sqlite => "TEXT",
                SqlDialect::Postgres => "JSONB",
            },
        }
    }

    /// Storage representation class for this field type
    pub fn storage_class(&self) -> StorageClass {
        match self {
            FieldType::ShortText
            | FieldType::LongText
            | FieldType::Email
            | FieldType::Phone
            | FieldType::Url
            | FieldType::SingleChoice
            | FieldType::Province
            | FieldType::FileUpload => StorageClass::Text,
            FieldType::Rating => StorageClass::Integer,
            FieldType::Number | FieldType::Slider => StorageClass::Float,
            FieldType::Date => StorageClass::Date,
            FieldType::Time => StorageClass::Time,
            FieldType::DateTime => StorageClass::Timestamp,
            FieldType::MultiChoice | FieldType::GeoPoint => StorageClass::Json,
        }
    }

    /// Whether this field type carries a fixed option list
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::SingleChoice | FieldType::MultiChoice)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_text" => Ok(FieldType::ShortText),
            "long_text" => Ok(FieldType::LongText),
            "email" => Ok(FieldType::Email),
            "phone" => Ok(FieldType::Phone),
            "number" => Ok(FieldType::Number),
            "url" => Ok(FieldType::Url),
            "date" => Ok(FieldType::Date),
            "time" => Ok(FieldType::Time),
            "date_time" => Ok(FieldType::DateTime),
            "single_choice" => Ok(FieldType::SingleChoice),
            "multi_choice" => Ok(FieldType::MultiChoice),
            "rating" => Ok(FieldType::Rating),
            "slider" => Ok(FieldType::Slider),
            "geo_point" => Ok(FieldType::GeoPoint),
            "province" => Ok(FieldType::Province),
            "file_upload" => Ok(FieldType::FileUpload),
            _ => Err(ValidationError::UnknownFieldType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_types() {
        for ft in FieldType::all() {
            let parsed: FieldType = ft.as_str().parse().unwrap();
            assert_eq!(parsed, *ft);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!("signature".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_sql_type_per_dialect() {
        assert_eq!(FieldType::Email.sql_type(SqlDialect::Sqlite), "TEXT");
        assert_eq!(FieldType::Rating.sql_type(SqlDialect::Postgres), "BIGINT");
        assert_eq!(FieldType::Rating.sql_type(SqlDialect::Sqlite), "INTEGER");
        assert_eq!(
            FieldType::Number.sql_type(SqlDialect::Postgres),
            "DOUBLE PRECISION"
        );
        assert_eq!(FieldType::Date.sql_type(SqlDialect::Postgres), "DATE");
        assert_eq!(FieldType::MultiChoice.sql_type(SqlDialect::Postgres), "JSONB");
    }

    #[test]
    fn test_same_storage_class_shares_representation() {
        assert_eq!(
            FieldType::Email.storage_class(),
            FieldType::ShortText.storage_class()
        );
        assert_ne!(
            FieldType::Number.storage_class(),
            FieldType::Rating.storage_class()
        );
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&FieldType::GeoPoint).unwrap();
        assert_eq!(json, "\"geo_point\"");
        let back: FieldType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FieldType::GeoPoint);
    }
}
