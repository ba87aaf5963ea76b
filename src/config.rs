use std::collections::HashMap;
use thiserror::Error;

/// Prefix of environment variables holding named connection strings.
pub const CONNECTION_STRING_PREFIX: &str = "CONNECTION_STRING_";

pub const DEFAULT_CONNECTION_NAME: &str = "DefaultConnection";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Name of the connection string the host uses.
    pub database_connection: String,
    /// Named connection strings, keyed by upper-cased name.
    pub connection_strings: HashMap<String, String>,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("No connection string named {0}")]
    MissingConnectionString(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_connection = env_map
            .get("DATABASE_CONNECTION")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CONNECTION_NAME.to_string());

        let connection_strings: HashMap<String, String> = env_map
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(CONNECTION_STRING_PREFIX)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_uppercase(), value.trim().to_string()))
            })
            .collect();

        let max_connections = env_map
            .get("DATABASE_MAX_CONNECTIONS")
            .map(|s| s.as_str())
            .unwrap_or("5")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DATABASE_MAX_CONNECTIONS".to_string(),
                    "must be a positive u32".to_string(),
                )
            })?;

        let busy_timeout_ms = env_map
            .get("DATABASE_BUSY_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("5000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "DATABASE_BUSY_TIMEOUT_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_connection,
            connection_strings,
            max_connections,
            busy_timeout_ms,
        })
    }

    /// Look up a connection string by name, ignoring case.
    pub fn connection_string(&self, name: &str) -> Result<&str, ConfigError> {
        self.connection_strings
            .get(&name.to_uppercase())
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingConnectionString(name.to_string()))
    }
}
