//! Convenience layer over a MySQL database.
//!
//! The crate resolves connection credentials (from arguments, a saved JSON
//! file, or interactive prompts), keeps one live connection and cursor,
//! caches per-table metadata, and streams whole tables in a fixed number of
//! contiguous chunks.
//!
//! # Layout
//! - [`credentials`]: credential records, overrides and interactive resolution
//! - [`driver`]: the database seam, with a MySQL implementation behind the
//!   `mysql` feature
//! - [`tables`]: cursor-bound catalog maintenance and chunked reads
//! - [`connection`]: connection lifecycle on top of [`tables`]
//!
//! # Example
//! ```rust,no_run
//! # #[cfg(feature = "mysql")]
//! # async fn demo() -> tablechunk_core::Result<()> {
//! use futures::StreamExt;
//! use tablechunk_core::driver::mysql::MySqlDriver;
//! use tablechunk_core::{ChunkOptions, ConnectionHelper, Credentials, HelperConfig};
//!
//! let creds = Credentials::new("reader", "secret", "localhost", "shop");
//! let mut helper =
//!     ConnectionHelper::new(Box::new(MySqlDriver::new()), creds, HelperConfig::default()).await?;
//!
//! let options = ChunkOptions::new(4);
//! if let Some(mut chunks) = helper.tables_mut().iterate_chunks("orders", &options, None).await? {
//!     while let Some(chunk) = chunks.next().await {
//!         println!("{} rows", chunk?.len());
//!     }
//! }
//! helper.close().await;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod chunks;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod logging;
pub mod queries;
pub mod tables;

pub use catalog::{TableCatalog, TableEntry};
pub use chunks::{
    Chunk, ChunkData, ChunkOptions, ChunkStream, ChunkWindow, DEFAULT_START_OFFSET, Frame,
    FrameError, WindowPlan, plan_windows,
};
pub use config::HelperConfig;
pub use connection::ConnectionHelper;
pub use credentials::{
    CredentialOverrides, Credentials, Prompter, ResolverOptions, TerminalPrompter,
    resolve_credentials,
};
pub use driver::{Connection, Cursor, Driver, Row};
pub use error::{Result, TableChunkError};
pub use tables::TableHelper;
