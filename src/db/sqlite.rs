//! SQLite Connection
//!
//! rusqlite-backed implementation of the connection traits. Keys and values
//! are stored as BLOBs and quoted as SQLite blob literals, so any byte string
//! can be embedded in a command without escaping ambiguities.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::OptionalExtension;
use tracing::debug;

use crate::db::connection::{Connection, Connector};
use crate::error::{KvError, Result};

/// Opens SQLite connections against one database file.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(5000),
        }
    }

    /// Sets how long a connection waits on a locked database before failing.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for SqliteConnector {
    type Conn = SqliteConnection;

    fn connect(&self) -> Result<SqliteConnection> {
        let conn = rusqlite::Connection::open(&self.path).map_err(|e| {
            KvError::Connection(format!("open {}: {}", self.path.display(), e))
        })?;

        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| KvError::Connection(format!("set busy timeout: {}", e)))?;
        // WAL lets pooled readers proceed while one writer holds the lock
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| KvError::Connection(format!("set journal mode: {}", e)))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| KvError::Connection(format!("set synchronous mode: {}", e)))?;

        debug!("Opened SQLite connection to {}", self.path.display());
        Ok(SqliteConnection { conn })
    }
}

/// One open SQLite session.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    fn quote(&self, raw: &[u8]) -> String {
        let mut literal = String::with_capacity(raw.len() * 2 + 3);
        literal.push_str("X'");
        for byte in raw {
            // Writing to a String cannot fail
            let _ = write!(literal, "{:02X}", byte);
        }
        literal.push('\'');
        literal
    }

    fn execute(&mut self, command: &str) -> Result<usize> {
        Ok(self.conn.execute(command, [])?)
    }

    fn query_optional(&mut self, command: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(command, [], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(value)
    }

    fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| KvError::Connection(format!("close: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, SqliteConnection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = SqliteConnector::new(dir.path().join("kv.db"))
            .connect()
            .unwrap();
        (dir, conn)
    }

    #[test]
    fn test_quote_is_hex_blob_literal() {
        let (_dir, conn) = open_temp();
        assert_eq!(conn.quote(b"ab"), "X'6162'");
        assert_eq!(conn.quote(b""), "X''");
        assert_eq!(conn.quote(b"'; DROP TABLE kv_store; --"), format!(
            "X'{}'",
            b"'; DROP TABLE kv_store; --"
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<String>()
        ));
    }

    #[test]
    fn test_quoted_bytes_round_trip() {
        let (_dir, mut conn) = open_temp();
        let raw = [0u8, 39, 255, 10, 92];
        let query = format!("SELECT {}", conn.quote(&raw));

        let value = conn.query_optional(&query).unwrap();
        assert_eq!(value, Some(raw.to_vec()));
    }

    #[test]
    fn test_query_optional_no_rows() {
        let (_dir, mut conn) = open_temp();
        conn.execute("CREATE TABLE t (v BLOB)").unwrap();

        let value = conn.query_optional("SELECT v FROM t").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_execute_invalid_command_is_query_failure() {
        let (_dir, mut conn) = open_temp();
        let result = conn.execute("NOT A COMMAND");
        assert!(matches!(result, Err(KvError::Query(_))));
    }

    #[test]
    fn test_connect_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteConnector::new(dir.path().join("missing").join("kv.db")).connect();
        assert!(matches!(result, Err(KvError::Connection(_))));
    }

    #[test]
    fn test_close() {
        let (_dir, conn) = open_temp();
        assert!(conn.close().is_ok());
    }
}
