//! Backend Connection Traits
//!
//! A `Connection` is one live session to the backend. It executes command
//! strings and knows how to quote raw bytes for embedding into them. A
//! `Connector` opens new connections; the pool calls it once per slot at startup.

use crate::error::Result;

/// A live backend session leased out by the pool.
pub trait Connection: Send {
    /// Quotes `raw` as a literal in this connection's command dialect.
    ///
    /// The returned string is safe to splice into a command verbatim.
    fn quote(&self, raw: &[u8]) -> String;

    /// Executes a command that returns no rows; yields the affected row count.
    fn execute(&mut self, command: &str) -> Result<usize>;

    /// Executes a query and returns the first column of the first row, if any.
    fn query_optional(&mut self, command: &str) -> Result<Option<Vec<u8>>>;

    /// Closes the session.
    fn close(self) -> Result<()>;
}

/// Factory for backend connections.
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// Opens one new connection.
    fn connect(&self) -> Result<Self::Conn>;
}
