//! MySQL pool for the verification-record table

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySqlPool, Row};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use aa_shared::DatabaseConfig;

use crate::InfrastructureError;

const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Pool plus the settings it was opened with
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl DatabasePool {
    pub async fn new(config: DatabaseConfig) -> Result<Self, InfrastructureError> {
        let options = MySqlConnectOptions::from_str(&config.url)
            .map_err(|e| InfrastructureError::Config(format!("Invalid database URL: {}", e)))?;

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(IDLE_TIMEOUT)
            .max_lifetime(MAX_LIFETIME)
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, event = "db_pool_failed", "Could not open MySQL pool");
                InfrastructureError::Database(e)
            })?;

        tracing::info!(
            max_connections = config.max_connections,
            table = %config.profile_table,
            event = "db_pool_opened",
            "MySQL pool ready"
        );
        Ok(Self { pool, config })
    }

    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Round-trips `SELECT 1`
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let row = sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>(0).map(|v| v == 1).unwrap_or(false))
    }

    pub fn get_statistics(&self) -> PoolStatistics {
        PoolStatistics {
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(event = "db_pool_closed", "MySQL pool closed");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatistics {
    pub connections: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

impl fmt::Display for PoolStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} connections open, {} idle",
            self.connections, self.max_connections, self.idle_connections
        )
    }
}
