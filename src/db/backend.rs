//! Storage Backend
//!
//! Point operations on the `kv_store` table. Each call leases one connection
//! for its duration and quotes every key and value through that connection
//! before building the command.

use std::sync::Arc;

use bytes::Bytes;
use tracing::error;

use crate::db::connection::Connection;
use crate::db::pool::ConnectionPool;
use crate::error::Result;

/// Name of the two-column table holding every key-value pair.
pub const TABLE_NAME: &str = "kv_store";

// == Storage Backend ==
/// Stateless key-value operations over a shared connection pool.
pub struct StorageBackend<C: Connection> {
    pool: Arc<ConnectionPool<C>>,
}

impl<C: Connection> Clone for StorageBackend<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<C: Connection> StorageBackend<C> {
    pub fn new(pool: Arc<ConnectionPool<C>>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool<C>> {
        &self.pool
    }

    // == Ensure Schema ==
    /// Creates the table if it does not exist yet. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.pool.acquire()?;
        let command = format!(
            "CREATE TABLE IF NOT EXISTS {} (k BLOB PRIMARY KEY, v BLOB NOT NULL)",
            TABLE_NAME
        );
        run(conn.execute(&command), "create table").map(|_| ())
    }

    // == Put ==
    /// Inserts the pair or overwrites the existing value in one statement.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut conn = self.pool.acquire()?;
        let command = format!(
            "INSERT INTO {} (k, v) VALUES ({}, {}) ON CONFLICT(k) DO UPDATE SET v = excluded.v",
            TABLE_NAME,
            conn.quote(key),
            conn.quote(value)
        );
        run(conn.execute(&command), "upsert").map(|_| ())
    }

    // == Get ==
    /// Looks up a key. A missing key is `Ok(None)`, never an error.
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let mut conn = self.pool.acquire()?;
        let command = format!(
            "SELECT v FROM {} WHERE k = {} LIMIT 1",
            TABLE_NAME,
            conn.quote(key)
        );
        run(conn.query_optional(&command), "select").map(|found| found.map(Bytes::from))
    }

    // == Delete ==
    /// Removes a key. Deleting an absent key succeeds.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut conn = self.pool.acquire()?;
        let command = format!("DELETE FROM {} WHERE k = {}", TABLE_NAME, conn.quote(key));
        run(conn.execute(&command), "delete").map(|_| ())
    }
}

fn run<T>(result: Result<T>, what: &str) -> Result<T> {
    if let Err(err) = &result {
        error!("Backend {} failed: {}", what, err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{PoolConfig, SqliteConnector};
    use crate::error::KvError;

    fn backend(dir: &tempfile::TempDir) -> StorageBackend<crate::db::SqliteConnection> {
        let connector = SqliteConnector::new(dir.path().join("kv.db"));
        let pool = ConnectionPool::init(
            &connector,
            PoolConfig {
                size: 2,
                acquire_timeout: None,
            },
        )
        .unwrap();
        let backend = StorageBackend::new(Arc::new(pool));
        backend.ensure_schema().unwrap();
        backend
    }

    #[test]
    fn test_ensure_schema_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        assert!(backend.ensure_schema().is_ok());
        assert!(backend.ensure_schema().is_ok());
    }

    #[test]
    fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        backend.put(b"alpha", b"1").unwrap();
        assert_eq!(backend.get(b"alpha").unwrap(), Some(Bytes::from_static(b"1")));
    }

    #[test]
    fn test_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        backend.put(b"alpha", b"1").unwrap();
        backend.put(b"alpha", b"2").unwrap();
        assert_eq!(backend.get(b"alpha").unwrap(), Some(Bytes::from_static(b"2")));
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        assert_eq!(backend.get(b"missing").unwrap(), None);
    }

    #[test]
    fn test_delete_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        backend.put(b"alpha", b"1").unwrap();
        backend.delete(b"alpha").unwrap();
        backend.delete(b"alpha").unwrap();
        backend.delete(b"never-written").unwrap();
        assert_eq!(backend.get(b"alpha").unwrap(), None);
    }

    #[test]
    fn test_hostile_input_is_stored_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let key = b"x'); DROP TABLE kv_store; --";
        let value = b"it's \"quoted\"\0\xff";

        backend.put(key, value).unwrap();
        assert_eq!(backend.get(key).unwrap(), Some(Bytes::copy_from_slice(value)));
        // Table survived
        backend.put(b"after", b"ok").unwrap();
        assert!(backend.get(b"after").unwrap().is_some());
    }

    #[test]
    fn test_missing_table_is_query_failure() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SqliteConnector::new(dir.path().join("kv.db"));
        let pool = ConnectionPool::init(&connector, PoolConfig::default()).unwrap();
        let backend = StorageBackend::new(Arc::new(pool));

        assert!(matches!(backend.get(b"alpha"), Err(KvError::Query(_))));
        assert!(matches!(backend.put(b"alpha", b"1"), Err(KvError::Query(_))));
    }

    #[test]
    fn test_closed_pool_surfaces_pool_closed() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        backend.pool().close();

        assert!(matches!(backend.get(b"alpha"), Err(KvError::PoolClosed)));
        assert_eq!(backend.pool().status().leased, 0);
    }
}
