//! Database migrations and initialization.
//!
//! The schema version lives in `PRAGMA user_version`. Pending migrations are
//! applied in one transaction; a database newer than this binary is refused.

use crate::db::provider::{ConnectionProvider, PoolSettings};
use crate::schema::{library_schema, SchemaError};
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: i64,
        latest_supported: i64,
    },
}

struct Migration {
    version: i64,
    description: &'static str,
    statements: fn() -> Result<Vec<String>, SchemaError>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "library schema",
    statements: library_statements,
}];

fn library_statements() -> Result<Vec<String>, SchemaError> {
    let schema = library_schema();
    schema.validate()?;
    Ok(schema.to_sql())
}

/// Latest schema version known by this binary.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Open (creating if needed) the SQLite file at `db_path` and migrate it.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, MigrationError> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let provider = ConnectionProvider::new(
        db_path,
        format!("sqlite:{}?mode=rwc", db_path),
        PoolSettings::default(),
    );
    let pool = provider.pool().await?.clone();

    run_migrations(&pool).await?;

    info!("Database initialized successfully at {}", db_path);
    Ok(pool)
}

/// Apply every migration newer than the database's current version.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrationError> {
    let current = current_version(pool).await?;
    let latest = latest_version();

    if current > latest {
        return Err(MigrationError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        info!(version = current, "Schema is up to date");
        return Ok(());
    }

    info!(from = current, to = latest, "Running database migrations...");
    let mut tx = pool.begin().await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        for statement in (migration.statements)()? {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        sqlx::query(&format!("PRAGMA user_version = {}", migration.version))
            .execute(&mut *tx)
            .await?;
        info!(
            version = migration.version,
            description = migration.description,
            "Applied migration"
        );
    }
    tx.commit().await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Schema version recorded in the database file.
pub async fn current_version(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db_path(temp_dir: &TempDir) -> String {
        temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string()
    }

    #[tokio::test]
    async fn test_init_db_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_db_path(&temp_dir);

        let pool = init_db(&db_path).await.expect("init_db failed");
        assert!(Path::new(&db_path).exists());
        assert_eq!(current_version(&pool).await.unwrap(), latest_version());
    }

    #[tokio::test]
    async fn test_init_db_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("nested/dir/library.db")
            .to_string_lossy()
            .to_string();

        init_db(&db_path).await.expect("init_db failed");
        assert!(Path::new(&db_path).exists());
    }

    #[tokio::test]
    async fn test_migrations_create_every_table() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_db_path(&temp_dir)).await.unwrap();

        for table in library_schema().tables {
            let result: (String,) =
                sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
                    .bind(&table.name)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or_else(|e| panic!("table {} missing: {}", table.name, e));
            assert_eq!(result.0, table.name);
        }
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_db_path(&temp_dir)).await.unwrap();

        run_migrations(&pool)
            .await
            .expect("second migration run failed");

        // Replaying the rendered DDL is also harmless.
        for statement in library_statements().unwrap() {
            sqlx::query(&statement).execute(&pool).await.unwrap();
        }
        assert_eq!(current_version(&pool).await.unwrap(), latest_version());
    }

    #[tokio::test]
    async fn test_newer_database_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_db_path(&temp_dir)).await.unwrap();

        sqlx::query("PRAGMA user_version = 99")
            .execute(&pool)
            .await
            .unwrap();

        match run_migrations(&pool).await {
            Err(MigrationError::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            }) => {
                assert_eq!(db_version, 99);
                assert_eq!(latest_supported, latest_version());
            }
            other => panic!("Expected UnsupportedSchemaVersion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_triggers_and_indexes_created() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_db_path(&temp_dir)).await.unwrap();

        let (triggers,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='trigger'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(triggers, 5);

        let (barcode_index,): (String,) = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='books' AND name='ux_books_barcode'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(barcode_index, "ux_books_barcode");
    }
}
