//! Schema and facet filter arguments shared by the data commands

use clap::ValueEnum;
use std::str::FromStr;

use crate::core::error::EngineError;
use crate::core::schema::SchemaKind;
use crate::core::selection::FacetSelection;

/// Dataset schema selector
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SchemaArg {
    /// Coarse pixel measurements
    Coarse,
    /// TAD converge measurements
    Tad,
}

impl From<SchemaArg> for SchemaKind {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Coarse => SchemaKind::Coarse,
            SchemaArg::Tad => SchemaKind::Tad,
        }
    }
}

impl std::fmt::Display for SchemaArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", SchemaKind::from(*self))
    }
}

/// One `FACET=V1,V2` filter as typed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetFilter {
    pub facet: String,
    pub values: Vec<String>,
}

impl FromStr for FacetFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (facet, values) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FACET=VALUE[,VALUE...], got '{}'", s))?;
        let facet = facet.trim();
        if facet.is_empty() {
            return Err(format!("missing facet name in '{}'", s));
        }
        Ok(Self {
            facet: facet.to_string(),
            values: split_values(values),
        })
    }
}

/// Split a comma-separated value list; `\,` is a literal comma and `\\` a
/// literal backslash
fn split_values(s: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.push(chars.next().unwrap_or('\\')),
            ',' => values.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    values.push(current);
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Escape a value so it survives `FACET=V1,V2` parsing unchanged
pub fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace(',', "\\,")
}

/// Schema, tool and facet filters
#[derive(clap::Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Dataset schema
    #[arg(value_enum)]
    pub schema: SchemaArg,

    /// Tool number
    pub tool: String,

    /// Facet filter, repeatable (e.g. -f "Lot Name=Lot A,Lot B"); write `\,` for a comma inside a value
    #[arg(long = "filter", short = 'f', value_name = "FACET=VALUES")]
    pub filters: Vec<FacetFilter>,
}

impl SelectionArgs {
    pub fn schema(&self) -> SchemaKind {
        self.schema.into()
    }

    /// Build the selection; repeated filters on one facet accumulate
    pub fn selection(&self) -> Result<FacetSelection, EngineError> {
        build_selection(self.schema(), &self.filters)
    }
}

/// Turn command-line filters into a selection
///
/// Facet names match ignoring case, spaces, underscores and dashes, so
/// `lot-name` selects `Lot Name`.
pub fn build_selection(
    schema: SchemaKind,
    filters: &[FacetFilter],
) -> Result<FacetSelection, EngineError> {
    let desc = schema.descriptor();
    let mut selection = FacetSelection::new(schema);
    for filter in filters {
        let facet = desc
            .find_facet(&filter.facet)
            .ok_or_else(|| EngineError::SchemaMismatch {
                schema,
                name: filter.facet.clone(),
                context: "facet",
            })?;
        selection.select_literals(facet, &filter.values)?;
    }
    Ok(selection)
}
