//! Error types with credential sanitization.
//!
//! Passwords never appear in any message produced here. Statement text may
//! appear in query errors; it only ever carries table and column names.

use thiserror::Error;

/// Main error type for tablechunk operations.
#[derive(Debug, Error)]
pub enum TableChunkError {
    /// Opening a connection failed; `source` is the driver's own error
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A statement failed inside the driver
    #[error("Query execution failed: {statement}")]
    Query {
        statement: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller asked for something that cannot be done in the current state
    #[error("Usage error: {message}")]
    Usage { message: String },

    /// Configuration or credential resolution error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A result set did not have the expected shape
    #[error("Unexpected result: {context}")]
    Decode { context: String },

    /// Reading from or writing to the terminal failed
    #[error("Prompt failed: {context}")]
    Prompt {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with TableChunkError
pub type Result<T> = std::result::Result<T, TableChunkError>;

impl TableChunkError {
    /// Wraps a driver error raised while opening a connection.
    pub fn connection_failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: "Database connection failed".to_string(),
            source: Box::new(error),
        }
    }

    /// Wraps a driver error raised while running `statement`.
    ///
    /// Whitespace in the statement is collapsed so multi-line SQL stays on
    /// one log line.
    pub fn query_failed<E>(statement: &str, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            statement: statement.split_whitespace().collect::<Vec<_>>().join(" "),
            source: Box::new(error),
        }
    }

    /// Creates a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a decode error
    pub fn decode(context: impl Into<String>) -> Self {
        Self::Decode {
            context: context.into(),
        }
    }

    /// Creates a prompt error
    pub fn prompt(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Prompt {
            context: context.into(),
            source,
        }
    }

    /// Returns true when the error reports a missing cursor or another
    /// caller-side misuse rather than a database failure.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }
}
