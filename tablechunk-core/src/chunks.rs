//! Row-range chunking: window planning, labeled frames and the chunk stream.
//!
//! A table of `R` rows split into `n` chunks yields `n - 1` chunks of
//! `R / n` rows followed by one chunk holding the rest, so the sizes always
//! sum to `R`.

use crate::driver::{Cursor, Row};
use crate::error::TableChunkError;
use crate::{Result, queries};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::ops::Range;
use thiserror::Error;

/// Rows skipped before the first chunk unless configured otherwise.
///
/// Existing stored chunk boundaries were produced with a first range of
/// `LIMIT 1,size`, so the default keeps that offset.
pub const DEFAULT_START_OFFSET: u64 = 1;

/// Options for `TableHelper::iterate_chunks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Number of chunks; must be at least 1
    pub n_chunks: usize,
    /// Columns to select; empty or containing `*` selects all columns
    pub columns: Vec<String>,
    /// Label each chunk as a `Frame`
    pub as_frame: bool,
    /// Attach a positional row index to frames
    pub respect_index: bool,
    /// Rows skipped before the first chunk
    pub start_offset: u64,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            n_chunks: 10,
            columns: Vec::new(),
            as_frame: true,
            respect_index: true,
            start_offset: DEFAULT_START_OFFSET,
        }
    }
}

impl ChunkOptions {
    /// Default options with `n_chunks` chunks.
    pub fn new(n_chunks: usize) -> Self {
        Self {
            n_chunks,
            ..Self::default()
        }
    }

    /// Builder method to select columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set frame labeling.
    pub fn with_as_frame(mut self, as_frame: bool) -> Self {
        self.as_frame = as_frame;
        self
    }

    /// Builder method to set the positional index.
    pub fn with_respect_index(mut self, respect_index: bool) -> Self {
        self.respect_index = respect_index;
        self
    }

    /// Builder method to set the rows skipped before the first chunk.
    pub fn with_start_offset(mut self, start_offset: u64) -> Self {
        self.start_offset = start_offset;
        self
    }
}

/// One planned row range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkWindow {
    /// Rows skipped by the range query
    pub start: u64,
    /// Rows requested by the range query
    pub size: u64,
    /// Logical position of the chunk's first row, counted from 0
    pub position: u64,
}

impl ChunkWindow {
    /// Positions covered by this window, used as the frame index.
    pub fn index(&self) -> Range<u64> {
        self.position..self.position.saturating_add(self.size)
    }
}

/// Splits `total_rows` into `n_chunks` contiguous windows.
///
/// The last window absorbs the remainder of the integer division and may be
/// larger than the others, or the only non-empty one when
/// `total_rows < n_chunks`. Windows are computed one at a time as the plan
/// is iterated, so the chunk count costs nothing up front.
///
/// # Errors
/// Returns a usage error when `n_chunks` is zero.
///
/// # Example
/// ```rust
/// use tablechunk_core::chunks::plan_windows;
///
/// let windows: Vec<_> = plan_windows(25, 10, 1)?.collect();
/// let sizes: Vec<u64> = windows.iter().map(|w| w.size).collect();
/// assert_eq!(sizes, vec![2, 2, 2, 2, 2, 2, 2, 2, 2, 7]);
/// assert_eq!(windows[9].start, 19);
/// # Ok::<(), tablechunk_core::TableChunkError>(())
/// ```
pub fn plan_windows(total_rows: u64, n_chunks: usize, start_offset: u64) -> Result<WindowPlan> {
    let chunks = chunk_count(n_chunks)?;
    let base = total_rows / chunks;
    // base * (chunks - 1) <= total_rows, so neither step can overflow
    let last = total_rows - base * (chunks - 1);

    Ok(WindowPlan {
        base,
        last,
        chunks,
        next: 0,
        start_offset,
    })
}

/// Validates a requested chunk count.
pub(crate) fn chunk_count(n_chunks: usize) -> Result<u64> {
    u64::try_from(n_chunks)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| TableChunkError::usage("n_chunks must be at least 1"))
}

/// Lazy sequence of the windows of one table, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPlan {
    base: u64,
    last: u64,
    chunks: u64,
    next: u64,
    start_offset: u64,
}

impl WindowPlan {
    /// Window number `i`, counted from 0.
    fn window(&self, i: u64) -> ChunkWindow {
        let position = self.base.saturating_mul(i);
        let size = if i.saturating_add(1) == self.chunks {
            self.last
        } else {
            self.base
        };
        ChunkWindow {
            start: self.start_offset.saturating_add(position),
            size,
            position,
        }
    }

    fn remaining(&self) -> u64 {
        self.chunks.saturating_sub(self.next)
    }
}

impl Iterator for WindowPlan {
    type Item = ChunkWindow;

    fn next(&mut self) -> Option<ChunkWindow> {
        if self.next >= self.chunks {
            return None;
        }
        let window = self.window(self.next);
        self.next = self.next.saturating_add(1);
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }

    fn nth(&mut self, n: usize) -> Option<ChunkWindow> {
        let skip = u64::try_from(n).unwrap_or(u64::MAX);
        self.next = self.next.saturating_add(skip).min(self.chunks);
        self.next()
    }
}

/// Why rows could not be labeled as a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("row {row} has {found} values but {expected} column labels were given")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("index spans {expected} rows but {found} rows were returned")]
    IndexMismatch { expected: u64, found: usize },
}

/// Rows labeled with column names and an optional positional index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    columns: Vec<String>,
    index: Option<Range<u64>>,
    rows: Vec<Row>,
}

impl Frame {
    /// Labels `rows`, checking that the shape is rectangular and that the
    /// index (when given) has one position per row.
    pub fn new(
        columns: Vec<String>,
        index: Option<Range<u64>>,
        rows: Vec<Row>,
    ) -> std::result::Result<Self, FrameError> {
        Self::validate(&columns, index.as_ref(), &rows)?;
        Ok(Self {
            columns,
            index,
            rows,
        })
    }

    /// Checks whether `rows` can be labeled without building the frame.
    pub fn validate(
        columns: &[String],
        index: Option<&Range<u64>>,
        rows: &[Row],
    ) -> std::result::Result<(), FrameError> {
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(FrameError::ColumnMismatch {
                row,
                expected: columns.len(),
                found: values.len(),
            });
        }

        if let Some(index) = index {
            let expected = index.end.saturating_sub(index.start);
            if u64::try_from(rows.len()).ok() != Some(expected) {
                return Err(FrameError::IndexMismatch {
                    expected,
                    found: rows.len(),
                });
            }
        }

        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> Option<&Range<u64>> {
        self.index.as_ref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&JsonValue>> {
        let position = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[position]).collect())
    }

    /// One JSON object per row, keyed by column name.
    pub fn records(&self) -> Vec<serde_json::Map<String, JsonValue>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// The rows of one chunk, labeled or raw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkData {
    Frame(Frame),
    Rows(Vec<Row>),
}

/// One element of the chunk stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub window: ChunkWindow,
    pub data: ChunkData,
}

impl Chunk {
    pub fn rows(&self) -> &[Row] {
        match &self.data {
            ChunkData::Frame(frame) => frame.rows(),
            ChunkData::Rows(rows) => rows,
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        match &self.data {
            ChunkData::Frame(frame) => Some(frame),
            ChunkData::Rows(_) => None,
        }
    }

    pub fn is_frame(&self) -> bool {
        self.frame().is_some()
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

/// Lazy, finite, non-restartable sequence of chunks.
pub type ChunkStream<'a> = BoxStream<'a, Result<Chunk>>;

/// Everything the stream needs besides the cursor.
#[derive(Debug, Clone)]
pub(crate) struct ChunkPlan {
    pub(crate) table: String,
    pub(crate) select: Vec<String>,
    pub(crate) labels: Vec<String>,
    pub(crate) as_frame: bool,
    pub(crate) respect_index: bool,
}

impl ChunkPlan {
    fn materialize(&self, window: ChunkWindow, rows: Vec<Row>) -> Chunk {
        if !self.as_frame {
            return Chunk {
                window,
                data: ChunkData::Rows(rows),
            };
        }

        let index = self.respect_index.then(|| window.index());
        let data = match Frame::validate(&self.labels, index.as_ref(), &rows) {
            Ok(()) => ChunkData::Frame(Frame {
                columns: self.labels.clone(),
                index,
                rows,
            }),
            Err(e) => {
                tracing::warn!(
                    "Issue coercing chunk at offset {} of '{}' to a frame, yielding raw rows: {}",
                    window.start,
                    self.table,
                    e
                );
                ChunkData::Rows(rows)
            }
        };
        Chunk { window, data }
    }
}

/// Builds the stream. Each poll issues exactly one range query; a query error
/// is yielded once and ends the stream.
pub(crate) fn stream_chunks<'a>(
    cursor: &'a dyn Cursor,
    plan: ChunkPlan,
    windows: WindowPlan,
) -> ChunkStream<'a> {
    stream::unfold(
        (plan, Some(windows)),
        move |(plan, mut windows)| async move {
            let Some(window) = windows.as_mut().and_then(Iterator::next) else {
                return None;
            };
            match queries::fetch_range(cursor, &plan.table, &plan.select, window.start, window.size)
                .await
            {
                Ok(rows) => {
                    let chunk = plan.materialize(window, rows);
                    Some((Ok(chunk), (plan, windows)))
                }
                Err(e) => Some((Err(e), (plan, None))),
            }
        },
    )
    .boxed()
}
