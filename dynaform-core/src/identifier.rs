//! Validated SQL identifiers
//!
//! Table and column names are interpolated into DDL strings and cannot go
//! through query-parameter binding, so they are modeled as newtypes whose
//! only construction path enforces an allow-list. The DDL layer accepts
//! these newtypes exclusively; an unchecked string cannot reach it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum identifier length (Postgres limit; SQLite is more permissive)
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Columns every dynamic table carries; never usable as field columns
pub const SYSTEM_COLUMNS: &[&str] = &["id", "form_id", "submitted_by", "created_at"];

/// SQL keywords that would need quoting everywhere; rejected outright
const RESERVED_WORDS: &[&str] = &[
    "select", "insert", "update", "delete", "from", "where", "table", "index",
    "column", "primary", "key", "default", "null", "not", "and", "or", "order",
    "group", "by", "limit", "offset", "join", "union", "create", "drop", "alter",
    "cast", "user", "when", "then", "case", "end", "true", "false",
];

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier regex is valid"));

/// Identifier validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier '{0}' is longer than {MAX_IDENTIFIER_LEN} characters")]
    TooLong(String),

    #[error("identifier '{0}' contains characters outside [a-z0-9_] or starts with a digit")]
    InvalidCharacters(String),

    #[error("identifier '{0}' is a reserved word")]
    Reserved(String),

    #[error("identifier '{0}' is a system column")]
    SystemColumn(String),
}

fn validate(raw: &str, reject_system: bool) -> Result<(), IdentifierError> {
    if raw.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if raw.len() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong(raw.to_string()));
    }
    if !IDENTIFIER_RE.is_match(raw) {
        return Err(IdentifierError::InvalidCharacters(raw.to_string()));
    }
    if RESERVED_WORDS.contains(&raw) {
        return Err(IdentifierError::Reserved(raw.to_string()));
    }
    if reject_system && SYSTEM_COLUMNS.contains(&raw) {
        return Err(IdentifierError::SystemColumn(raw.to_string()));
    }
    Ok(())
}

/// A validated column name, safe to interpolate into DDL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnName(String);

impl ColumnName {
    /// Validate and wrap a raw column name
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        validate(&raw, true)?;
        Ok(Self(raw))
    }

    /// Wrap a system column name (bypasses only the system-column check)
    pub fn system(raw: &'static str) -> Self {
        debug_assert!(SYSTEM_COLUMNS.contains(&raw));
        Self(raw.to_string())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier double-quoted for DDL
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ColumnName {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ColumnName {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColumnName> for String {
    fn from(value: ColumnName) -> Self {
        value.0
    }
}

/// A validated table name, safe to interpolate into DDL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Validate and wrap a raw table name
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        validate(&raw, false)?;
        Ok(Self(raw))
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier double-quoted for DDL
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableName {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_column_names() {
        for name in ["email", "phone_number", "_hidden", "col1", "a"] {
            assert!(ColumnName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_injection_shapes() {
        for name in [
            "email; DROP TABLE forms",
            "email\"",
            "e-mail",
            "Email",
            "1col",
            "",
            "col name",
            "naïve",
        ] {
            assert!(ColumnName::new(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_reserved_and_system() {
        assert_eq!(
            ColumnName::new("select").unwrap_err(),
            IdentifierError::Reserved("select".to_string())
        );
        assert_eq!(
            ColumnName::new("form_id").unwrap_err(),
            IdentifierError::SystemColumn("form_id".to_string())
        );
        // table names may collide with system column names
        assert!(TableName::new("created_at").is_ok());
    }

    #[test]
    fn test_rejects_too_long() {
        let long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(matches!(
            ColumnName::new(long),
            Err(IdentifierError::TooLong(_))
        ));
        assert!(ColumnName::new("a".repeat(MAX_IDENTIFIER_LEN)).is_ok());
    }

    #[test]
    fn test_quoting() {
        let col = ColumnName::new("email").unwrap();
        assert_eq!(col.quoted(), "\"email\"");
        let table = TableName::new("form_data_feedback").unwrap();
        assert_eq!(table.quoted(), "\"form_data_feedback\"");
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let ok: ColumnName = serde_json::from_str("\"email\"").unwrap();
        assert_eq!(ok.as_str(), "email");
        let bad: Result<ColumnName, _> = serde_json::from_str("\"bad name\"");
        assert!(bad.is_err());
    }
}
