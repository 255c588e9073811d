//! PostgreSQL connection settings

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the connection URL
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable overriding the pool size
pub const MAX_CONNECTIONS_VAR: &str = "PROXIMA_DB_MAX_CONNECTIONS";

/// Environment variable overriding the acquire timeout, in seconds
pub const ACQUIRE_TIMEOUT_VAR: &str = "PROXIMA_DB_ACQUIRE_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Where and how to connect
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub pool: PoolConfig,
}

impl PostgresConfig {
    pub fn new(database_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            database_url: database_url.into(),
            pool: PoolConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read `DATABASE_URL` and the optional pool overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var(DATABASE_URL_VAR)
            .map_err(|_| ConfigError::Missing(DATABASE_URL_VAR.to_string()))?;

        let mut pool = PoolConfig::default();
        if let Some(max) = env_number(MAX_CONNECTIONS_VAR)? {
            pool.max_connections = max as u32;
            pool.min_connections = pool.min_connections.min(pool.max_connections);
        }
        if let Some(secs) = env_number(ACQUIRE_TIMEOUT_VAR)? {
            pool.acquire_timeout = Duration::from_secs(secs);
        }

        let config = Self { database_url, pool };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        self.pool.validate()
    }
}

fn env_number(var: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| ConfigError::Invalid {
            key: var.to_string(),
            reason: format!("'{}' is not a non-negative integer", raw),
        }),
        Err(_) => Ok(None),
    }
}

/// Connection pool sizing and timeouts
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "pool.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "pool.min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) exceeds max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }
        Ok(())
    }
}
