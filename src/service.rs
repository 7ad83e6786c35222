//! Key-Value Service
//!
//! Cache-aside composition of the storage backend and the LRU cache.
//!
//! - Writes and deletes go to the backend first; the cache is only touched
//!   after the backend reports success, so it never holds a value that was
//!   not written.
//! - Reads try the cache, fall back to the backend on a miss and fill the
//!   cache with what was found. Absent keys are not cached. The fill is
//!   dropped if any write reached the cache while the read was in flight, so
//!   a delete or overwrite racing a slow read is never undone by it.
//!
//! Cache updates trail the backend: a reader can see the previous value for
//! the short window between another writer's backend commit and its cache
//! update, and racing writers to one key may leave the cache holding the
//! value of whichever updated the cache last. Reads are eventually
//! consistent, not linearizable.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, LruCache};
use crate::config::Config;
use crate::db::{Connection, ConnectionPool, PoolStatus, SqliteConnection, StorageBackend};
use crate::error::Result;

/// Combined cache and pool counters.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub cache: CacheStats,
    pub pool: PoolStatus,
}

// == KV Service ==
pub struct KvService<C: Connection> {
    backend: StorageBackend<C>,
    cache: LruCache<Bytes, Bytes>,
}

impl KvService<SqliteConnection> {
    /// Opens the pool described by `config`, bootstraps the schema and
    /// creates the cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pool = ConnectionPool::init(&config.connector(), config.pool_config())?;
        Self::start(Arc::new(pool), config.cache_capacity)
    }
}

impl<C: Connection> KvService<C> {
    pub fn new(backend: StorageBackend<C>, cache: LruCache<Bytes, Bytes>) -> Self {
        Self { backend, cache }
    }

    /// Builds a service over an existing pool and ensures the table exists.
    ///
    /// A schema failure is logged and otherwise ignored; if the table really
    /// is missing, every later operation reports its own query failure.
    pub fn start(pool: Arc<ConnectionPool<C>>, cache_capacity: usize) -> Result<Self> {
        let cache = LruCache::new(cache_capacity)?;
        let backend = StorageBackend::new(pool);

        match backend.ensure_schema() {
            Ok(()) => info!("Key-value table ready"),
            Err(err) => warn!("Schema bootstrap failed, continuing: {}", err),
        }

        Ok(Self::new(backend, cache))
    }

    // == Put ==
    /// Upserts into the backend, then caches the value.
    pub fn put(&self, key: Bytes, value: Bytes) -> Result<()> {
        self.backend.put(&key, &value)?;
        self.cache.put(key, value);
        Ok(())
    }

    // == Get ==
    /// Returns the value for `key`, or `None` if no row exists.
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        if let Some(value) = self.cache.get(key) {
            debug!(key_len = key.len(), "cache hit");
            return Ok(Some(value));
        }

        debug!(key_len = key.len(), "cache miss");
        let seen = self.cache.generation();
        let found = self.backend.get(key)?;
        if let Some(value) = &found {
            if !self
                .cache
                .put_if_unchanged(Bytes::copy_from_slice(key), value.clone(), seen)
            {
                debug!(key_len = key.len(), "cache fill skipped after concurrent write");
            }
        }
        Ok(found)
    }

    // == Delete ==
    /// Deletes from the backend, then evicts the key from the cache.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.backend.delete(key)?;
        self.cache.remove(key);
        Ok(())
    }

    pub fn cache(&self) -> &LruCache<Bytes, Bytes> {
        &self.cache
    }

    pub fn pool(&self) -> &Arc<ConnectionPool<C>> {
        self.backend.pool()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            cache: self.cache.stats(),
            pool: self.pool().status(),
        }
    }

    /// Closes the connection pool. Blocked and later requests fail with
    /// `PoolClosed`.
    pub fn shutdown(&self) {
        self.pool().close();
    }
}

