//! Connection provider: one lazily created, shared pool per named connection.

use crate::config::{Config, ConfigError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Pool sizing and per-connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            busy_timeout_ms: 5000,
        }
    }
}

impl From<&Config> for PoolSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_connections: config.max_connections,
            busy_timeout_ms: config.busy_timeout_ms,
        }
    }
}

/// Hands out a single cached `SqlitePool` for a named connection string.
///
/// The pool is created on the first call to [`ConnectionProvider::pool`];
/// every later call returns the same handle. Concurrent first callers wait on
/// one initialisation. A failed initialisation is not cached.
#[derive(Debug)]
pub struct ConnectionProvider {
    name: String,
    connection_string: String,
    settings: PoolSettings,
    pool: OnceCell<SqlitePool>,
}

impl ConnectionProvider {
    pub fn new(
        name: impl Into<String>,
        connection_string: impl Into<String>,
        settings: PoolSettings,
    ) -> Self {
        Self {
            name: name.into(),
            connection_string: connection_string.into(),
            settings,
            pool: OnceCell::new(),
        }
    }

    /// Provider for the connection named by `config.database_connection`.
    ///
    /// # Errors
    /// Returns an error if no connection string with that name is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let connection_string = config.connection_string(&config.database_connection)?;
        Ok(Self::new(
            config.database_connection.clone(),
            connection_string,
            PoolSettings::from(config),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the pool has been created.
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    /// Return the shared pool, connecting on first use.
    ///
    /// # Errors
    /// Returns the driver error if the connection string is malformed or the
    /// database cannot be opened.
    pub async fn pool(&self) -> Result<&SqlitePool, sqlx::Error> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    /// Close the pool if it was ever opened. Later `pool()` calls hand out the
    /// closed pool, so this belongs at shutdown only.
    pub async fn close(&self) {
        match self.pool.get() {
            Some(pool) => {
                pool.close().await;
                info!(connection = %self.name, "Connection pool closed");
            }
            None => warn!(connection = %self.name, "Close requested before pool was opened"),
        }
    }

    async fn connect(&self) -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&self.connection_string)?;
        let busy_timeout_ms = self.settings.busy_timeout_ms;

        let pool = SqlitePoolOptions::new()
            .max_connections(self.settings.max_connections)
            .after_connect(move |conn, _meta| {
                Box::pin(async move { configure_pragmas_conn(conn, busy_timeout_ms).await })
            })
            .connect_with(options)
            .await?;

        info!(
            connection = %self.name,
            max_connections = self.settings.max_connections,
            "Connection pool opened"
        );
        Ok(pool)
    }
}

/// Per-connection pragmas. Foreign keys must be on for delete rules to apply.
async fn configure_pragmas_conn(
    conn: &mut SqliteConnection,
    busy_timeout_ms: u64,
) -> Result<(), sqlx::Error> {
    use sqlx::Row;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    // journal_mode returns the actual mode set; must use fetch to get result
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.get(0);
    tracing::debug!(journal_mode = %journal_mode, "SQLite journal_mode set");

    sqlx::query(&format!("PRAGMA busy_timeout = {}", busy_timeout_ms))
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&mut *conn)
        .await?;

    Ok(())
}
