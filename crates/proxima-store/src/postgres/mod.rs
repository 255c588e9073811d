//! PostgreSQL executor for rendered proximity queries

pub mod config;

pub use config::{ConfigError, PoolConfig, PostgresConfig};

use proxima_core::{ProximaError, Result};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::sql::{SqlDialect, SqlParam, SqlQuery};

/// One element matched by a proximity query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDistance {
    pub element_id: i64,
    pub site_id: i64,

    /// `None` when the search had no target or the address has no coordinates
    pub distance: Option<f64>,
}

/// PostgreSQL storage adapter
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Connect and verify the connection
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| ProximaError::ConfigInvalid {
            key: "database_url".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| ProximaError::Storage(format!("Failed to connect to database: {}", e)))?;

        let store = Self { pool, config };
        store.health_check().await?;
        Ok(store)
    }

    /// A query builder for this backend
    pub fn query(&self) -> SqlQuery {
        SqlQuery::new(SqlDialect::Postgres)
    }

    /// Run a proximity query, nearest first
    pub async fn search(&self, query: &SqlQuery) -> Result<Vec<ElementDistance>> {
        if query.dialect() != SqlDialect::Postgres {
            return Err(ProximaError::ConfigInvalid {
                key: "dialect".to_string(),
                reason: format!("PostgresStore cannot run {} queries", query.dialect()),
            });
        }

        let rendered = query.render();
        tracing::debug!("Running proximity query: {}", rendered.sql);

        let mut statement = sqlx::query(&rendered.sql);
        for param in &rendered.params {
            statement = match param {
                SqlParam::Int(v) => statement.bind(*v),
                SqlParam::Float(v) => statement.bind(*v),
                SqlParam::Text(v) => statement.bind(v.clone()),
            };
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ProximaError::Storage(format!("Proximity query failed: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(ElementDistance {
                    element_id: row.try_get("element_id").map_err(storage_error)?,
                    site_id: row.try_get("site_id").map_err(storage_error)?,
                    distance: row.try_get("distance").map_err(storage_error)?,
                })
            })
            .collect()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ProximaError::Storage(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> ProximaError {
    ProximaError::Storage(format!("Unexpected result row: {}", e))
}
