//! Shared Redis connection service.

use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use tracing::info;

use crate::{RedisConfig, RedisError, Result};

/// Pool of multiplexed Redis connections.
pub type RedisPool = Pool<RedisConnectionManager>;

/// Connection checked out of a [`RedisPool`].
pub type PooledRedis<'a> = PooledConnection<'a, RedisConnectionManager>;

/// Redis service owning the connection pool.
///
/// One service is meant to be shared (behind an `Arc`) by every store and
/// lock in the process.
pub struct RedisService {
    config: RedisConfig,
    pool: RedisPool,
}

impl RedisService {
    /// Validate `config`, build the pool and check that the server answers.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        config.validate()?;

        let manager = RedisConnectionManager::new(config.connection_url()?)
            .map_err(|e| RedisError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|e| RedisError::Pool(e.to_string()))?;

        let service = Self { config, pool };
        service.health_check().await?;

        info!(
            pool_size = service.config.pool_size,
            url = %service.config.url,
            "Redis lock store connected"
        );

        Ok(service)
    }

    /// Create from an existing pool.
    pub fn from_pool(config: RedisConfig, pool: RedisPool) -> Self {
        Self { config, pool }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Check a connection out of the pool.
    ///
    /// Waits at most the configured connection timeout; an exhausted pool
    /// surfaces as [`RedisError::Timeout`].
    pub async fn get(&self) -> Result<PooledRedis<'_>> {
        Ok(self.pool.get().await?)
    }

    /// Check if the server answers.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Get pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }
}

/// Connection pool statistics.
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total connections.
    pub connections: u32,
    /// Idle connections.
    pub idle_connections: u32,
}
