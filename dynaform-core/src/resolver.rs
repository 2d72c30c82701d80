//! Column-name resolver contract
//!
//! The production resolver fronts an external transliteration service that
//! turns human field titles (often non-ASCII) into column-name candidates.
//! The engine consumes it through this trait; [`SlugResolver`] is the
//! deterministic ASCII fallback used in tests and offline deployments.

use tracing::debug;
use uuid::Uuid;

use crate::error::ResolverError;
use crate::identifier::{ColumnName, MAX_IDENTIFIER_LEN};

/// Derives a stable, SQL-safe column name from a human field title
pub trait ColumnNameResolver: Send + Sync {
    /// Resolve a column name candidate for the given title
    ///
    /// The result is re-validated by the engine before use; implementations
    /// must surface failures rather than silently substituting names.
    fn resolve(&self, title: &str, field_id: Uuid) -> Result<ColumnName, ResolverError>;
}

/// Slug length before the disambiguating suffix is considered
const MAX_SLUG_LEN: usize = 48;

/// Deterministic ASCII slugifier
///
/// Lowercases, maps every non-alphanumeric run to a single underscore,
/// prefixes `f_` when the slug would start with a digit or come out empty,
/// and falls back to a field-id suffix when the slug alone is not a usable
/// identifier (reserved word, system column).
#[derive(Debug, Clone, Default)]
pub struct SlugResolver;

impl SlugResolver {
    pub fn new() -> Self {
        Self
    }

    fn slugify(title: &str) -> String {
        let mut slug = String::with_capacity(title.len());
        let mut last_was_sep = true; // trims leading separators
        for ch in title.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
                last_was_sep = false;
            } else if !last_was_sep {
                slug.push('_');
                last_was_sep = true;
            }
        }
        while slug.ends_with('_') {
            slug.pop();
        }
        slug.truncate(MAX_SLUG_LEN);
        slug
    }
}

impl ColumnNameResolver for SlugResolver {
    fn resolve(&self, title: &str, field_id: Uuid) -> Result<ColumnName, ResolverError> {
        let mut slug = Self::slugify(title);
        if slug.is_empty() || slug.starts_with(|c: char| c.is_ascii_digit()) {
            slug = format!("f_{slug}");
            while slug.ends_with('_') {
                slug.pop();
            }
        }

        match ColumnName::new(slug.clone()) {
            Ok(name) => Ok(name),
            Err(_) => {
                // Reserved word or system-column collision: disambiguate
                // with a stable prefix of the field id.
                let suffix = field_id.simple().to_string();
                let mut candidate = format!("{slug}_{}", &suffix[..8]);
                candidate.truncate(MAX_IDENTIFIER_LEN);
                debug!(title, candidate, "slug needed field-id disambiguation");
                ColumnName::new(candidate).map_err(|source| ResolverError::InvalidIdentifier {
                    title: title.to_string(),
                    source,
                })
            }
        }
    }
}
