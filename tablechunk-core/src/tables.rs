//! Cursor-bound table helpers: catalog maintenance, metadata lookups,
//! randomized copies and chunked reads.
//!
//! Every operation that talks to the database takes an optional cursor
//! override. Without one, the installed cursor is used; with neither, the
//! operation fails with a usage error before any statement is issued.

use crate::catalog::TableCatalog;
use crate::chunks::{
    ChunkOptions, ChunkPlan, ChunkStream, chunk_count, plan_windows, stream_chunks,
};
use crate::driver::{Cursor, Row, close_cursor_quietly};
use crate::error::TableChunkError;
use crate::{Result, queries};

/// Owns the active cursor and the table catalog built from it.
pub struct TableHelper {
    cursor: Option<Box<dyn Cursor>>,
    catalog: TableCatalog,
    eager_metadata: bool,
}

impl std::fmt::Debug for TableHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHelper")
            .field("has_cursor", &self.cursor.is_some())
            .field("tables", &self.catalog.len())
            .field("eager_metadata", &self.eager_metadata)
            .finish()
    }
}

impl TableHelper {
    /// Creates a helper with no cursor and an empty catalog.
    pub fn new(eager_metadata: bool) -> Self {
        Self {
            cursor: None,
            catalog: TableCatalog::new(),
            eager_metadata,
        }
    }

    /// Creates a helper and, if a cursor is given, installs it.
    ///
    /// # Errors
    /// Returns any error from the catalog reset.
    pub async fn with_cursor(cursor: Option<Box<dyn Cursor>>, eager_metadata: bool) -> Result<Self> {
        let mut helper = Self::new(eager_metadata);
        helper.set_cursor(cursor).await?;
        Ok(helper)
    }

    /// The installed cursor, if any.
    pub fn cursor(&self) -> Option<&dyn Cursor> {
        self.cursor.as_deref()
    }

    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    pub fn eager_metadata(&self) -> bool {
        self.eager_metadata
    }

    /// Replaces the active cursor and rebuilds the catalog from it.
    ///
    /// The previous cursor is closed first; a failure to close it is logged
    /// and ignored. Returns the table names found by the reset.
    ///
    /// # Errors
    /// Returns any error from the catalog reset. The new cursor stays
    /// installed either way.
    pub async fn install_cursor(&mut self, cursor: Box<dyn Cursor>) -> Result<Vec<String>> {
        if let Some(previous) = self.cursor.take() {
            close_cursor_quietly(previous.as_ref()).await;
        }
        self.cursor = Some(cursor);
        self.reset_tables(None).await
    }

    /// Installs `cursor` when it is `Some`; `None` leaves the current cursor
    /// and catalog untouched. Returns whether a cursor was installed.
    pub async fn set_cursor(&mut self, cursor: Option<Box<dyn Cursor>>) -> Result<bool> {
        match cursor {
            Some(cursor) => {
                self.install_cursor(cursor).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Closes and removes the active cursor. The catalog is kept.
    pub async fn clear_cursor(&mut self) {
        if let Some(previous) = self.cursor.take() {
            close_cursor_quietly(previous.as_ref()).await;
        }
    }

    /// Clears the catalog and re-lists every table.
    ///
    /// In eager mode each table's row count and column names are computed
    /// immediately; otherwise entries start empty and fill on first use.
    /// Without any cursor the catalog is simply left empty.
    pub async fn reset_tables(&mut self, cursor: Option<&dyn Cursor>) -> Result<Vec<String>> {
        self.catalog.clear();
        let Some(cursor) = cursor.or(self.cursor.as_deref()) else {
            return Ok(Vec::new());
        };

        let names = queries::list_tables(cursor).await?;
        for name in &names {
            self.catalog.entry(name);
            if self.eager_metadata {
                cached_row_count(&mut self.catalog, cursor, name, false).await?;
                cached_column_names(&mut self.catalog, cursor, name, false).await?;
            }
        }
        tracing::debug!("Catalog reset with {} table(s)", names.len());
        Ok(names)
    }

    /// Row count of `table`, from the cache unless absent or `recalc`.
    ///
    /// # Errors
    /// Returns a usage error without a cursor, or the query error.
    pub async fn row_count(
        &mut self,
        table: &str,
        cursor: Option<&dyn Cursor>,
        recalc: bool,
    ) -> Result<u64> {
        let cursor = pick_cursor(cursor, self.cursor.as_deref(), "count rows")?;
        cached_row_count(&mut self.catalog, cursor, table, recalc).await
    }

    /// Column names of `table`, from the cache unless absent or `recalc`.
    ///
    /// # Errors
    /// Returns a usage error without a cursor, or the query error.
    pub async fn column_names(
        &mut self,
        table: &str,
        cursor: Option<&dyn Cursor>,
        recalc: bool,
    ) -> Result<Vec<String>> {
        let cursor = pick_cursor(cursor, self.cursor.as_deref(), "list columns")?;
        cached_column_names(&mut self.catalog, cursor, table, recalc).await
    }

    /// Creates `dest` (if absent) as a row-shuffled copy of `columns` from
    /// `source`, then registers it in the catalog.
    ///
    /// In eager mode the new table's metadata is recomputed; otherwise the
    /// affected-row count reported by the statement, when non-zero, is cached
    /// as its row count.
    pub async fn create_randomized_table(
        &mut self,
        source: &str,
        dest: &str,
        columns: &[String],
        verbose: bool,
        cursor: Option<&dyn Cursor>,
    ) -> Result<()> {
        let cursor = pick_cursor(cursor, self.cursor.as_deref(), "create randomized table")?;

        let affected = cursor
            .execute(&queries::create_randomized_sql(source, dest, columns))
            .await?;
        let entry = self.catalog.entry(dest);
        if affected > 0 {
            entry.row_count = Some(affected);
        }

        if self.eager_metadata {
            let rows = cached_row_count(&mut self.catalog, cursor, dest, true).await?;
            cached_column_names(&mut self.catalog, cursor, dest, true).await?;
            if verbose {
                tracing::info!("{} exists with {} rows.", dest, rows);
            }
        } else if verbose {
            tracing::info!("{} exists.", dest);
        }
        Ok(())
    }

    /// Reads one row range: skip `start` rows, return at most `size`.
    ///
    /// # Errors
    /// Returns a usage error without a cursor, or the query error.
    pub async fn chunk_at(
        &self,
        table: &str,
        start: u64,
        size: u64,
        columns: &[String],
        cursor: Option<&dyn Cursor>,
    ) -> Result<Vec<Row>> {
        let cursor = pick_cursor(cursor, self.cursor.as_deref(), "create table chunk")?;
        queries::fetch_range(cursor, table, columns, start, size).await
    }

    /// Streams `table` end to end in `options.n_chunks` contiguous chunks.
    ///
    /// Returns `Ok(None)` without issuing any statement when `table` is not
    /// in the catalog. Otherwise the row count and (when all columns are
    /// selected) the column names are resolved up front, through the cache,
    /// and each chunk's range query runs only when the stream is polled.
    ///
    /// When `options.as_frame` is set, a chunk whose rows cannot be labeled
    /// (wrong width, or fewer rows than its index spans) is yielded as raw
    /// rows instead and the stream carries on.
    ///
    /// # Errors
    /// Returns a usage error without a cursor or for zero chunks, before any
    /// statement is issued.
    pub async fn iterate_chunks<'a>(
        &'a mut self,
        table: &str,
        options: &ChunkOptions,
        cursor: Option<&'a dyn Cursor>,
    ) -> Result<Option<ChunkStream<'a>>> {
        let cursor = pick_cursor(cursor, self.cursor.as_deref(), "create table chunks")?;
        if !self.catalog.contains(table) {
            tracing::warn!("Table '{}' not found", table);
            return Ok(None);
        }
        chunk_count(options.n_chunks)?;

        let total_rows = cached_row_count(&mut self.catalog, cursor, table, false).await?;
        let labels = if queries::selects_all(&options.columns) {
            cached_column_names(&mut self.catalog, cursor, table, false).await?
        } else {
            options.columns.clone()
        };
        let windows = plan_windows(total_rows, options.n_chunks, options.start_offset)?;

        let plan = ChunkPlan {
            table: table.to_string(),
            select: options.columns.clone(),
            labels,
            as_frame: options.as_frame,
            respect_index: options.respect_index,
        };
        Ok(Some(stream_chunks(cursor, plan, windows)))
    }
}

fn pick_cursor<'a>(
    explicit: Option<&'a dyn Cursor>,
    installed: Option<&'a dyn Cursor>,
    action: &str,
) -> Result<&'a dyn Cursor> {
    explicit
        .or(installed)
        .ok_or_else(|| TableChunkError::usage(format!("No cursor found to {}.", action)))
}

async fn cached_row_count(
    catalog: &mut TableCatalog,
    cursor: &dyn Cursor,
    table: &str,
    recalc: bool,
) -> Result<u64> {
    if !recalc && let Some(rows) = catalog.row_count(table) {
        return Ok(rows);
    }
    let rows = queries::count_rows(cursor, table).await?;
    catalog.entry(table).row_count = Some(rows);
    Ok(rows)
}

async fn cached_column_names(
    catalog: &mut TableCatalog,
    cursor: &dyn Cursor,
    table: &str,
    recalc: bool,
) -> Result<Vec<String>> {
    if !recalc && let Some(columns) = catalog.column_names(table) {
        return Ok(columns.to_vec());
    }
    let columns = queries::list_columns(cursor, table).await?;
    catalog.entry(table).column_names = Some(columns.clone());
    Ok(columns)
}
