//! Backing record stores
//!
//! Stores are read-only collaborators of the engine. An unknown tool or a
//! missing table is reported as `Ok(None)`, never as an error.

mod serialize;
pub mod sqlite;

use std::collections::{BTreeSet, HashMap};

use crate::core::dataset::RawTable;
use crate::core::error::EngineError;
use crate::core::schema::{SchemaDescriptor, SchemaKind};
use crate::core::value::FieldValue;

pub use sqlite::SqliteStore;

/// Read interface the engine consumes
pub trait RecordStore {
    /// Identifiers of every tool the store knows about
    fn tool_ids(&self) -> Result<BTreeSet<String>, EngineError>;

    /// Fetch the raw rows of a schema's table for a tool
    ///
    /// With a `row_limit`, rows are ordered newest first by the schema's
    /// time key and truncated; without one, storage order is kept.
    fn fetch(
        &self,
        tool_id: &str,
        schema: &SchemaDescriptor,
        row_limit: Option<usize>,
    ) -> Result<Option<RawTable>, EngineError>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn tool_ids(&self) -> Result<BTreeSet<String>, EngineError> {
        (**self).tool_ids()
    }

    fn fetch(
        &self,
        tool_id: &str,
        schema: &SchemaDescriptor,
        row_limit: Option<usize>,
    ) -> Result<Option<RawTable>, EngineError> {
        (**self).fetch(tool_id, schema, row_limit)
    }
}

/// In-memory store, keyed by schema and tool
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<(SchemaKind, String), RawTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table for a tool, replacing any previous one
    pub fn insert(&mut self, schema: SchemaKind, tool_id: &str, table: RawTable) {
        self.tables.insert((schema, tool_id.to_string()), table);
    }
}

impl RecordStore for MemoryStore {
    fn tool_ids(&self) -> Result<BTreeSet<String>, EngineError> {
        Ok(self.tables.keys().map(|(_, id)| id.clone()).collect())
    }

    fn fetch(
        &self,
        tool_id: &str,
        schema: &SchemaDescriptor,
        row_limit: Option<usize>,
    ) -> Result<Option<RawTable>, EngineError> {
        let Some(table) = self.tables.get(&(schema.kind, tool_id.to_string())) else {
            return Ok(None);
        };
        let mut table = table.clone();

        if let Some(limit) = row_limit {
            if let Some(time) = table.columns.iter().position(|c| c == schema.time_key) {
                table
                    .rows
                    .sort_by(|a, b| sort_key(b.get(time)).cmp(&sort_key(a.get(time))));
            }
            table.rows.truncate(limit);
        }

        Ok(Some(table))
    }
}

/// Ordering key mirroring SQLite's cross-type order: null < numbers < text
fn sort_key(value: Option<&FieldValue>) -> (u8, OrderedNumber, &str) {
    match value {
        None | Some(FieldValue::Null) => (0, OrderedNumber(0.0), ""),
        Some(FieldValue::Integer(i)) => (1, OrderedNumber(*i as f64), ""),
        Some(FieldValue::Real(f)) => (1, OrderedNumber(*f), ""),
        Some(FieldValue::Text(s)) => (2, OrderedNumber(0.0), s.as_str()),
    }
}

struct OrderedNumber(f64);

impl PartialEq for OrderedNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for OrderedNumber {}

impl PartialOrd for OrderedNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::fixtures::raw;

    #[test]
    fn test_memory_store_unknown_tool() {
        let store = MemoryStore::new();
        let result = store
            .fetch("1", SchemaKind::Coarse.descriptor(), None)
            .unwrap();
        assert!(result.is_none());
        assert!(store.tool_ids().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_orders_and_limits() {
        let mut store = MemoryStore::new();
        store.insert(
            SchemaKind::Coarse,
            "1",
            raw(
                &["Time", "X"],
                vec![
                    vec!["2024-01-01".into(), 1.0.into()],
                    vec!["2024-03-01".into(), 3.0.into()],
                    vec!["2024-02-01".into(), 2.0.into()],
                ],
            ),
        );

        let table = store
            .fetch("1", SchemaKind::Coarse.descriptor(), Some(2))
            .unwrap()
            .unwrap();
        let times: Vec<_> = table.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(times, vec!["2024-03-01", "2024-02-01"]);

        // Unbounded fetch keeps storage order
        let table = store
            .fetch("1", SchemaKind::Coarse.descriptor(), None)
            .unwrap()
            .unwrap();
        assert_eq!(table.rows[0][0].to_string(), "2024-01-01");
    }

    #[test]
    fn test_schemas_are_separate() {
        let mut store = MemoryStore::new();
        store.insert(SchemaKind::Tad, "5", RawTable::default());
        assert!(store
            .fetch("5", SchemaKind::Coarse.descriptor(), None)
            .unwrap()
            .is_none());
        assert!(store
            .fetch("5", SchemaKind::Tad.descriptor(), None)
            .unwrap()
            .is_some());
    }
}
