//! MySQL session and cursor lifecycle.
//!
//! The session owns one `MySqlConnection`. Cursors share it through a mutex,
//! which also serializes statements: at most one is in flight.

use super::values::row_to_values;
use crate::driver::{Connection, Cursor, Row};
use crate::error::TableChunkError;
use crate::Result;
use async_trait::async_trait;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{Connection as _, Executor, MySqlConnection};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};

type SharedConnection = Arc<Mutex<Option<MySqlConnection>>>;

/// An open MySQL session.
pub struct MySqlSession {
    connection: SharedConnection,
    open: Arc<AtomicBool>,
}

impl std::fmt::Debug for MySqlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSession")
            .field("open", &self.open.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl MySqlSession {
    /// Opens a session.
    ///
    /// # Errors
    /// Returns the `sqlx` connection error wrapped as a connection error.
    pub async fn connect(options: &MySqlConnectOptions) -> Result<Self> {
        let connection = MySqlConnection::connect_with(options)
            .await
            .map_err(TableChunkError::connection_failed)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(Some(connection))),
            open: Arc::new(AtomicBool::new(true)),
        })
    }
}

#[async_trait]
impl Connection for MySqlSession {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn cursor(&self) -> Result<Box<dyn Cursor>> {
        if !self.is_open() {
            return Err(TableChunkError::usage("Connection is closed"));
        }
        Ok(Box::new(MySqlCursor {
            connection: Arc::clone(&self.connection),
            session_open: Arc::clone(&self.open),
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::Release);
        let connection = self.connection.lock().await.take();
        if let Some(connection) = connection {
            connection
                .close()
                .await
                .map_err(TableChunkError::connection_failed)?;
        }
        Ok(())
    }
}

/// A statement handle over a shared MySQL session.
pub struct MySqlCursor {
    connection: SharedConnection,
    session_open: Arc<AtomicBool>,
    closed: AtomicBool,
}

impl std::fmt::Debug for MySqlCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlCursor")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl MySqlCursor {
    async fn lock(&self) -> Result<MutexGuard<'_, Option<MySqlConnection>>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TableChunkError::usage("Cursor is closed"));
        }
        if !self.session_open.load(Ordering::Acquire) {
            return Err(TableChunkError::usage("Connection is closed"));
        }
        Ok(self.connection.lock().await)
    }
}

#[async_trait]
impl Cursor for MySqlCursor {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>> {
        let mut guard = self.lock().await?;
        let connection = guard
            .as_mut()
            .ok_or_else(|| TableChunkError::usage("Connection is closed"))?;

        tracing::trace!("fetch_all: {}", sql);
        let rows = connection
            .fetch_all(sql)
            .await
            .map_err(|e| TableChunkError::query_failed(sql, e))?;

        Ok(rows.iter().map(row_to_values).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut guard = self.lock().await?;
        let connection = guard
            .as_mut()
            .ok_or_else(|| TableChunkError::usage("Connection is closed"))?;

        tracing::trace!("execute: {}", sql);
        let result = connection
            .execute(sql)
            .await
            .map_err(|e| TableChunkError::query_failed(sql, e))?;

        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
