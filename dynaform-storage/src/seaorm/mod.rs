//! SeaORM implementation of the Dynaform metadata store
//!
//! This module provides the normalized metadata side of the system:
//! entities, migrations, repositories, and connection management. The
//! physical dynamic tables are managed by [`crate::engine`], never through
//! these entities.

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repositories;

pub use connection::{DatabaseConnection, DatabaseError};
pub use entities::*;

// Re-export common SeaORM types for convenience
pub use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection as SeaOrmConnection, DatabaseTransaction, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
