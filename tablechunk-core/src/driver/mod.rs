//! Driver traits: the seam between the helpers and the database client.
//!
//! The helpers only ever issue textual statements and read positional rows,
//! so the seam is deliberately small. Everything is object-safe so that the
//! connection manager can hold `Box<dyn Connection>` and `Box<dyn Cursor>`.
//!
//! # Module Structure
//! - `mysql`: `sqlx`-backed MySQL implementation (feature `mysql`)

use crate::{Credentials, Result};
use async_trait::async_trait;

#[cfg(feature = "mysql")]
pub mod mysql;

/// One result row: column values in select-list order.
pub type Row = Vec<serde_json::Value>;

/// Opens connections from a credential record.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Opens a new connection.
    ///
    /// # Errors
    /// Returns the client library's connection error.
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>>;
}

/// A single open session to the database.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Whether the session is usable.
    fn is_open(&self) -> bool;

    /// Creates a statement handle bound to this session.
    async fn cursor(&self) -> Result<Box<dyn Cursor>>;

    /// Closes the session. Cursors created from it stop working.
    async fn close(&self) -> Result<()>;
}

/// A statement-execution handle bound to a connection.
///
/// One statement is in flight at a time; each call runs to completion and
/// returns its whole result.
#[async_trait]
pub trait Cursor: Send + Sync {
    /// Runs a statement and returns every row it produced.
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>>;

    /// Runs a statement and returns the number of rows it affected.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Releases the handle.
    async fn close(&self) -> Result<()>;
}

/// Closes a cursor, logging instead of returning any failure.
pub async fn close_cursor_quietly(cursor: &dyn Cursor) {
    if let Err(e) = cursor.close().await {
        tracing::debug!("Ignoring error while closing cursor: {}", e);
    }
}

/// Closes a connection, logging instead of returning any failure.
pub async fn close_connection_quietly(connection: &dyn Connection) {
    if let Err(e) = connection.close().await {
        tracing::debug!("Ignoring error while closing connection: {}", e);
    }
}
