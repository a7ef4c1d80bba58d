//! Connection pool for PostgreSQL.

use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};

/// A connection pool for PostgreSQL.
#[derive(Clone)]
pub struct PgPool {
    inner: Pool,
    config: Arc<PgConfig>,
}

impl PgPool {
    /// Create a new connection pool from configuration.
    pub fn new(config: PgConfig) -> PgResult<Self> {
        Self::with_pool_config(config, PoolConfig::default())
    }

    /// Create a new connection pool with custom pool configuration.
    ///
    /// No connection is opened until the first [`PgPool::get`].
    pub fn with_pool_config(config: PgConfig, pool_config: PoolConfig) -> PgResult<Self> {
        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(config.to_pg_config(), NoTls, mgr_config);

        let pool = Pool::builder(mgr)
            .runtime(Runtime::Tokio1)
            .max_size(pool_config.max_connections)
            .wait_timeout(pool_config.connection_timeout)
            .create_timeout(pool_config.connection_timeout)
            .recycle_timeout(pool_config.idle_timeout)
            .build()
            .map_err(|e| PgError::config(format!("failed to create pool: {}", e)))?;

        info!(
            host = %config.host,
            port = %config.port,
            database = %config.database,
            max_connections = %pool_config.max_connections,
            "PostgreSQL connection pool created"
        );

        Ok(Self {
            inner: pool,
            config: Arc::new(config),
        })
    }

    /// Parse a URL and create a pool with default settings.
    pub fn from_url(url: &str) -> PgResult<Self> {
        Self::new(PgConfig::from_url(url)?)
    }

    /// Get a connection from the pool.
    pub async fn get(&self) -> PgResult<Object> {
        debug!("Acquiring connection from pool");
        Ok(self.inner.get().await?)
    }

    /// Get the current pool status.
    pub fn status(&self) -> PoolStatus {
        let status = self.inner.status();
        PoolStatus {
            available: status.available,
            size: status.size,
            max_size: status.max_size,
            waiting: status.waiting,
        }
    }

    /// Get the connection configuration.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }
}

/// Pool status information.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    /// Number of available (idle) connections.
    pub available: usize,
    /// Current total size of the pool.
    pub size: usize,
    /// Maximum size of the pool.
    pub max_size: usize,
    /// Number of tasks waiting for a connection.
    pub waiting: usize,
}

/// Configuration for the connection pool.
///
/// Migrations run one at a time, so the defaults are small.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: usize,
    /// Maximum time to wait for or open a connection.
    pub connection_timeout: Option<Duration>,
    /// Maximum time to spend recycling an idle connection.
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 2,
            connection_timeout: Some(Duration::from_secs(30)),
            idle_timeout: Some(Duration::from_secs(5)),
        }
    }
}
