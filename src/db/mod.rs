//! Database module for SQLite operations.
//!
//! This module provides:
//! - The connection provider (one shared pool per named connection string)
//! - Schema migrations rendered from the declarative model
//! - Repository layer for database operations

pub mod migrations;
pub mod provider;
pub mod repo;

pub use migrations::{init_db, run_migrations, MigrationError};
pub use provider::{ConnectionProvider, PoolSettings};
pub use repo::Repository;
