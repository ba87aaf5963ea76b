//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct through which the application
//! persists and queries library entities. Methods are organized across
//! submodules by area:
//! - `users.rs` - Users, roles and permission claims
//! - `members.rs` - Members and wishlists
//! - `catalog.rs` - Catalog titles, books and stock adjustments
//! - `loans.rs` - Loans with their details, returns and reminders
//! - `purchases.rs` - Purchases and purchase line items
//! - `visits.rs` - Visit logs and the books handed out under them
//!
//! Inserts leave database-defaulted columns out and read the stored row back
//! with `RETURNING`, so defaults always come from the schema. Each insert runs
//! in its own transaction and is committed before the row is returned.
//! Constraint violations are returned as the driver's `sqlx::Error` unchanged.

mod catalog;
mod loans;
mod members;
mod purchases;
mod users;
mod visits;

use crate::domain::{Decimal, TimeMs, UserId};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query.
    ///
    /// # Errors
    /// Returns an error if no connection can be acquired.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn time_column(row: &SqliteRow, column: &str) -> Result<TimeMs, sqlx::Error> {
    row.try_get::<i64, _>(column).map(TimeMs::new)
}

fn optional_time_column(row: &SqliteRow, column: &str) -> Result<Option<TimeMs>, sqlx::Error> {
    Ok(row.try_get::<Option<i64>, _>(column)?.map(TimeMs::new))
}

fn optional_user_column(row: &SqliteRow, column: &str) -> Result<Option<UserId>, sqlx::Error> {
    Ok(row.try_get::<Option<String>, _>(column)?.map(UserId::new))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    pub async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    /// Extended constraint kind of a failed statement.
    pub fn violation_kind(err: &sqlx::Error) -> sqlx::error::ErrorKind {
        match err {
            sqlx::Error::Database(db_err) => db_err.kind(),
            other => panic!("Expected database error, got {:?}", other),
        }
    }
}
