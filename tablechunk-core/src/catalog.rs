//! Cached table metadata.
//!
//! The catalog is a plain cache; it never talks to the database. The table
//! helper decides when entries are filled or refreshed.

use serde::Serialize;
use std::collections::BTreeMap;

/// Cached metadata for one table. Fields stay `None` until computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub name: String,
    pub row_count: Option<u64>,
    pub column_names: Option<Vec<String>>,
}

impl TableEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Table name to metadata, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableCatalog {
    entries: BTreeMap<String, TableEntry>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, table: &str) -> bool {
        self.entries.contains_key(table)
    }

    pub fn get(&self, table: &str) -> Option<&TableEntry> {
        self.entries.get(table)
    }

    /// Returns the entry for `table`, registering an empty one if needed.
    pub fn entry(&mut self, table: &str) -> &mut TableEntry {
        self.entries
            .entry(table.to_string())
            .or_insert_with(|| TableEntry::new(table))
    }

    /// Cached row count, if computed.
    pub fn row_count(&self, table: &str) -> Option<u64> {
        self.get(table).and_then(|entry| entry.row_count)
    }

    /// Cached column names, if computed.
    pub fn column_names(&self, table: &str) -> Option<&[String]> {
        self.get(table).and_then(|entry| entry.column_names.as_deref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
