//! Mock implementations for testing

use dynaform_core::{ColumnName, ColumnNameResolver, ResolverError};
use mockall::mock;
use uuid::Uuid;

mock! {
    /// Mock of the column-name resolver contract
    ///
    /// Used to script resolver outcomes: fixed column names, collisions,
    /// or `ResolverError::Unavailable` outages.
    pub Resolver {}

    impl ColumnNameResolver for Resolver {
        fn resolve(&self, title: &str, field_id: Uuid) -> Result<ColumnName, ResolverError>;
    }
}
