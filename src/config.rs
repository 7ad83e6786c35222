//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::db::{PoolConfig, SqliteConnector};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Path of the SQLite database file backing the key-value table
    pub db_path: String,
    /// Number of backend connections opened at startup
    pub pool_size: usize,
    /// Maximum number of entries the LRU cache can hold
    pub cache_capacity: usize,
    /// Upper bound on how long a request waits for a pooled connection, None = forever
    pub acquire_timeout: Option<Duration>,
    /// SQLite busy timeout applied to every connection
    pub busy_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `DB_PATH` - SQLite database file (default: kv_store.db)
    /// - `POOL_SIZE` - Backend connections (default: 8)
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `ACQUIRE_TIMEOUT_MS` - Pool acquire timeout in ms (default: unset, wait forever)
    /// - `DB_BUSY_TIMEOUT_MS` - SQLite busy timeout in ms (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            db_path: env::var("DB_PATH").unwrap_or(defaults.db_path),
            pool_size: parse_var("POOL_SIZE").unwrap_or(defaults.pool_size),
            cache_capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            acquire_timeout: parse_var("ACQUIRE_TIMEOUT_MS").map(Duration::from_millis),
            busy_timeout: parse_var("DB_BUSY_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
        }
    }

    /// Pool settings derived from this configuration.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            size: self.pool_size,
            acquire_timeout: self.acquire_timeout,
        }
    }

    /// Connector opening SQLite connections against `db_path`.
    pub fn connector(&self) -> SqliteConnector {
        SqliteConnector::new(&self.db_path).with_busy_timeout(self.busy_timeout)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            db_path: "kv_store.db".to_string(),
            pool_size: 8,
            cache_capacity: 1000,
            acquire_timeout: None,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}
