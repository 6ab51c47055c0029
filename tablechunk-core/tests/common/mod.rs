//! In-memory driver used by the helper tests.
//!
//! The fake understands exactly the statements the helpers emit and records
//! every one of them, so tests can assert on both results and traffic.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use tablechunk_core::{
    Connection, Credentials, Cursor, Driver, Prompter, Result, Row, TableChunkError,
};

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl FakeTable {
    /// `id`, `name` table with ids `1..=rows`.
    pub fn numbered(rows: u64) -> Self {
        Self {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: (1..=rows)
                .map(|id| vec![json!(id), json!(format!("row-{}", id))])
                .collect(),
        }
    }

    fn project(&self, columns: &[&str], rows: &[Row]) -> Result<Vec<Row>> {
        if columns == ["*"] {
            return Ok(rows.to_vec());
        }
        let positions = columns
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| unknown(&format!("column {}", name)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(rows
            .iter()
            .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub tables: BTreeMap<String, FakeTable>,
    pub statements: Vec<String>,
    pub connects: Vec<Credentials>,
    pub refuse_connect: bool,
    pub hand_out_closed: bool,
    /// Statements containing this text fail.
    pub fail_on: Option<String>,
    pub cursors_opened: usize,
    pub cursors_closed: usize,
    pub connections_closed: usize,
}

impl FakeState {
    pub fn count_of(&self, prefix: &str) -> usize {
        self.statements.iter().filter(|s| s.starts_with(prefix)).count()
    }

    fn run(&mut self, sql: &str) -> Result<(Vec<Row>, u64)> {
        self.statements.push(sql.to_string());
        if let Some(needle) = &self.fail_on
            && sql.contains(needle.as_str())
        {
            return Err(TableChunkError::query_failed(
                sql,
                io::Error::other("injected failure"),
            ));
        }

        let body = sql.trim_end_matches(';');
        if body == "SHOW TABLES" {
            let rows = self.tables.keys().map(|name| vec![json!(name)]).collect();
            return Ok((rows, 0));
        }
        if let Some(table) = body.strip_prefix("SELECT COUNT(*) FROM ") {
            let table = self.table(table)?;
            return Ok((vec![vec![json!(table.rows.len())]], 0));
        }
        if let Some(table) = body.strip_prefix("SHOW COLUMNS FROM ") {
            let table = self.table(table)?;
            let rows = table
                .columns
                .iter()
                .map(|c| vec![json!(c), json!("int"), json!("YES")])
                .collect();
            return Ok((rows, 0));
        }
        if let Some(rest) = body.strip_prefix("CREATE TABLE IF NOT EXISTS ") {
            return self.create_as_select(rest);
        }
        if let Some(rest) = body.strip_prefix("SELECT ") {
            return self.select_range(rest).map(|rows| (rows, 0));
        }
        Err(unknown(sql))
    }

    fn table(&self, name: &str) -> Result<&FakeTable> {
        self.tables
            .get(name)
            .ok_or_else(|| unknown(&format!("table {}", name)))
    }

    // "{cols} FROM {table} LIMIT {start},{size}"
    fn select_range(&self, rest: &str) -> Result<Vec<Row>> {
        let (columns, rest) = rest.split_once(" FROM ").ok_or_else(|| unknown(rest))?;
        let (table, limit) = rest.split_once(" LIMIT ").ok_or_else(|| unknown(rest))?;
        let (start, size) = limit.split_once(',').ok_or_else(|| unknown(limit))?;
        let start: usize = start.parse().map_err(|_| unknown(limit))?;
        let size: usize = size.parse().map_err(|_| unknown(limit))?;

        let table = self.table(table)?;
        let begin = start.min(table.rows.len());
        let end = start.saturating_add(size).min(table.rows.len());
        let columns: Vec<&str> = columns.split(',').collect();
        table.project(&columns, &table.rows[begin..end])
    }

    // "{dest} AS SELECT {cols} FROM {source} ORDER BY RAND()"
    fn create_as_select(&mut self, rest: &str) -> Result<(Vec<Row>, u64)> {
        let (dest, rest) = rest.split_once(" AS SELECT ").ok_or_else(|| unknown(rest))?;
        let (columns, rest) = rest.split_once(" FROM ").ok_or_else(|| unknown(rest))?;
        let source = rest
            .strip_suffix(" ORDER BY RAND()")
            .ok_or_else(|| unknown(rest))?;
        if self.tables.contains_key(dest) {
            return Ok((Vec::new(), 0));
        }

        let source = self.table(source)?;
        let columns: Vec<&str> = columns.split(',').collect();
        let mut rows = source.project(&columns, &source.rows)?;
        rows.reverse();
        let names = if columns == ["*"] {
            source.columns.clone()
        } else {
            columns.iter().map(|c| c.to_string()).collect()
        };
        let affected = rows.len() as u64;
        self.tables.insert(
            dest.to_string(),
            FakeTable {
                columns: names,
                rows,
            },
        );
        Ok((Vec::new(), affected))
    }
}

fn unknown(what: &str) -> TableChunkError {
    TableChunkError::query_failed(what, io::Error::other("not understood by the fake"))
}

pub type Shared = Arc<Mutex<FakeState>>;

pub fn state_with(tables: &[(&str, FakeTable)]) -> Shared {
    let mut state = FakeState::default();
    for (name, table) in tables {
        state.tables.insert(name.to_string(), table.clone());
    }
    Arc::new(Mutex::new(state))
}

#[derive(Debug, Clone)]
pub struct FakeDriver(pub Shared);

#[async_trait]
impl Driver for FakeDriver {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>> {
        let mut state = self.0.lock().unwrap();
        state.connects.push(credentials.clone());
        if state.refuse_connect {
            return Err(TableChunkError::connection_failed(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        Ok(Box::new(FakeConnection {
            state: self.0.clone(),
            open: !state.hand_out_closed,
        }))
    }
}

pub struct FakeConnection {
    state: Shared,
    open: bool,
}

#[async_trait]
impl Connection for FakeConnection {
    fn is_open(&self) -> bool {
        self.open
    }

    async fn cursor(&self) -> Result<Box<dyn Cursor>> {
        self.state.lock().unwrap().cursors_opened += 1;
        Ok(Box::new(FakeCursor(self.state.clone())))
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().connections_closed += 1;
        Ok(())
    }
}

pub struct FakeCursor(pub Shared);

#[async_trait]
impl Cursor for FakeCursor {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>> {
        self.0.lock().unwrap().run(sql).map(|(rows, _)| rows)
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.0.lock().unwrap().run(sql).map(|(_, affected)| affected)
    }

    async fn close(&self) -> Result<()> {
        self.0.lock().unwrap().cursors_closed += 1;
        Ok(())
    }
}

pub fn cursor_on(state: &Shared) -> Box<dyn Cursor> {
    Box::new(FakeCursor(state.clone()))
}

/// Answers prompts from a fixed script and records what was asked.
#[derive(Debug, Default)]
pub struct Scripted {
    pub answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl Scripted {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers.pop_front().ok_or_else(|| {
            TableChunkError::prompt(
                "script exhausted",
                io::Error::new(io::ErrorKind::UnexpectedEof, prompt.to_string()),
            )
        })
    }
}

impl Prompter for Scripted {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }

    fn ask_hidden(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }

    fn show(&mut self, _message: &str) -> Result<()> {
        Ok(())
    }
}

pub fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}
