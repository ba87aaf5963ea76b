pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod schema;

pub use config::Config;
pub use db::{init_db, ConnectionProvider, PoolSettings, Repository};
pub use domain::{Decimal, TimeMs, UserId, VisitStatus};
pub use error::AppError;
pub use schema::{library_schema, DeleteRule, Schema, SchemaError};
