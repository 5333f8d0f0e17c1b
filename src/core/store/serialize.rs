//! SQLite serialization for field values
//!
//! Implements ToSql and FromSql for FieldValue so raw cells can be read
//! from, and fixtures written to, the per-tool databases.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::core::value::FieldValue;

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::from(rusqlite::types::Null),
            FieldValue::Integer(i) => ToSqlOutput::from(*i),
            FieldValue::Real(f) => ToSqlOutput::from(*f),
            FieldValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl FromSql for FieldValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
            other => cell_value(other).map_err(|found| FromSqlError::Other(found.into())),
        }
    }
}

/// Field value of a raw cell
///
/// Cells no field kind can hold (blobs, text that is not UTF-8) yield a
/// description of what was found instead.
pub fn cell_value(value: ValueRef<'_>) -> Result<FieldValue, String> {
    match value {
        ValueRef::Null => Ok(FieldValue::Null),
        ValueRef::Integer(i) => Ok(FieldValue::Integer(i)),
        ValueRef::Real(f) => Ok(FieldValue::Real(f)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| FieldValue::Text(s.to_string()))
            .map_err(|_| format!("text with invalid UTF-8 ({} bytes)", bytes.len())),
        ValueRef::Blob(bytes) => Err(format!("blob of {} bytes", bytes.len())),
    }
}
