//! Per-tool SQLite databases
//!
//! Each tool lives in its own `Tool_<id>.db` file inside the data directory,
//! holding a `Coarse_Data` and/or `Tad_Data` table.

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::serialize::cell_value;
use super::RecordStore;
use crate::core::dataset::RawTable;
use crate::core::error::EngineError;
use crate::core::schema::{FieldKind, SchemaDescriptor};
use crate::core::value::FieldValue;

const FILE_PREFIX: &str = "Tool_";
const FILE_SUFFIX: &str = ".db";

/// Read-only store over a directory of per-tool databases
#[derive(Debug, Clone)]
pub struct SqliteStore {
    data_dir: PathBuf,
}

impl SqliteStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Database path for a tool
    pub fn db_path(&self, tool_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}{}", FILE_PREFIX, tool_id, FILE_SUFFIX))
    }

    fn open(&self, tool_id: &str) -> Result<Option<Connection>, EngineError> {
        if tool_id.is_empty() || tool_id.contains(['/', '\\']) || tool_id.contains("..") {
            tracing::debug!(tool = tool_id, "rejected tool id");
            return Ok(None);
        }
        let path = self.db_path(tool_id);
        if !path.is_file() {
            tracing::debug!(tool = tool_id, path = %path.display(), "no database for tool");
            return Ok(None);
        }
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Some(conn))
    }
}

/// Tool id encoded in a database file name
///
/// `Tool_101.db` yields `101`: the text between the first `_` and the
/// following `.`.
pub fn tool_id_from_file_name(name: &str) -> Option<String> {
    if !name.starts_with(FILE_PREFIX) || !name.ends_with(FILE_SUFFIX) {
        return None;
    }
    let after = name.split('_').nth(1)?;
    let id = after.split('.').next()?;
    Some(id.to_string())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Option<Vec<String>>, EngineError> {
    let exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(None);
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(columns))
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

impl RecordStore for SqliteStore {
    fn tool_ids(&self) -> Result<BTreeSet<String>, EngineError> {
        if !self.data_dir.is_dir() {
            tracing::warn!(path = %self.data_dir.display(), "data directory not found");
            return Ok(BTreeSet::new());
        }

        let mut ids = BTreeSet::new();
        for entry in WalkDir::new(&self.data_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                EngineError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("directory walk failed")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(tool_id_from_file_name) {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    fn fetch(
        &self,
        tool_id: &str,
        schema: &SchemaDescriptor,
        row_limit: Option<usize>,
    ) -> Result<Option<RawTable>, EngineError> {
        let Some(conn) = self.open(tool_id)? else {
            return Ok(None);
        };
        let Some(columns) = table_columns(&conn, schema.table)? else {
            tracing::debug!(tool = tool_id, table = schema.table, "table not found");
            return Ok(None);
        };

        let mut sql = format!("SELECT * FROM {}", quote(schema.table));
        if let Some(limit) = row_limit {
            if columns.iter().any(|c| c == schema.time_key) {
                sql.push_str(&format!(" ORDER BY {} DESC", quote(schema.time_key)));
            }
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        // Declared kind per column; columns outside the schema are dropped later
        let kinds: Vec<Option<FieldKind>> = names
            .iter()
            .map(|name| schema.field_index(name).ok().map(|i| schema.field(i).kind))
            .collect();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(names.len());
            for (i, kind) in kinds.iter().enumerate() {
                let value = match (cell_value(row.get_ref(i)?), kind) {
                    (Ok(value), _) => value,
                    (Err(found), Some(expected)) => {
                        return Err(EngineError::TypeCoercion {
                            tool_id: tool_id.to_string(),
                            column: names[i].clone(),
                            row: rows.len() + 1,
                            found,
                            expected: *expected,
                        });
                    }
                    (Err(_), None) => FieldValue::Null,
                };
                values.push(value);
            }
            rows.push(values);
        }

        tracing::debug!(
            tool = tool_id,
            table = schema.table,
            rows = rows.len(),
            "fetched rows"
        );

        Ok(Some(RawTable {
            columns: names,
            rows,
        }))
    }
}
