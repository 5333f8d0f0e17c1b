//! Engine error taxonomy
//!
//! Missing tools, missing tables and empty views are not errors: they resolve
//! to empty results inside the engine. Only the conditions below ever reach
//! the caller.

use thiserror::Error;

use crate::core::schema::{FieldKind, SchemaKind};

/// Errors surfaced by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stored value could not be coerced to its column's declared kind
    #[error(
        "Type coercion failed for tool {tool_id}: column '{column}' row {row} holds {found}, expected {expected}"
    )]
    TypeCoercion {
        tool_id: String,
        column: String,
        row: usize,
        found: String,
        expected: FieldKind,
    },

    /// A facet or field name is not part of the schema
    #[error("'{name}' is not a {context} of the {schema} schema")]
    SchemaMismatch {
        schema: SchemaKind,
        name: String,
        context: &'static str,
    },

    /// A literal typed by the user does not parse as the facet's kind
    #[error("Invalid value '{literal}' for facet '{facet}': expected {expected}")]
    InvalidLiteral {
        facet: String,
        literal: String,
        expected: FieldKind,
    },

    #[error("Backing store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for errors caused by malformed stored data
    pub fn is_type_coercion(&self) -> bool {
        matches!(self, EngineError::TypeCoercion { .. })
    }
}

/// Errors while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
}
