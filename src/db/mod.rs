//! Database Module
//!
//! Bounded connection pool and key-value table operations over SQLite.

mod backend;
mod connection;
mod pool;
mod sqlite;

pub use backend::{StorageBackend, TABLE_NAME};
pub use connection::{Connection, Connector};
pub use pool::{ConnectionLease, ConnectionPool, PoolConfig, PoolStatus};
pub use sqlite::{SqliteConnection, SqliteConnector};
