//! Facet option resolver
//!
//! Recomputes, for every facet, the distinct values still present once the
//! current selection is applied. Values are listed in first-appearance order.

use serde::Serialize;
use std::collections::HashSet;

use crate::core::dataset::{Dataset, FilteredView};
use crate::core::error::EngineError;
use crate::core::filter::filter;
use crate::core::selection::FacetSelection;
use crate::core::value::FieldValue;

/// Which selection a facet's own options are computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionScope {
    /// Apply the whole selection, including the facet's own constraint.
    /// A facet with a selection therefore only offers the selected values.
    #[default]
    Cascading,
    /// Apply every constraint except the facet's own
    ExcludeOwnFacet,
}

/// Options offered for one facet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetOptions {
    pub facet: &'static str,
    pub values: Vec<FieldValue>,
}

/// Options for every facet of a schema, in facet order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OptionsMap {
    entries: Vec<FacetOptions>,
}

impl OptionsMap {
    pub fn get(&self, facet: &str) -> Option<&[FieldValue]> {
        self.entries
            .iter()
            .find(|e| e.facet == facet)
            .map(|e| e.values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacetOptions> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no facet offers any value
    pub fn all_empty(&self) -> bool {
        self.entries.iter().all(|e| e.values.is_empty())
    }
}

/// Resolve option lists using the cascading scope
pub fn resolve_options(
    dataset: &Dataset,
    selection: &FacetSelection,
) -> Result<OptionsMap, EngineError> {
    resolve_options_scoped(dataset, selection, OptionScope::Cascading)
}

/// Resolve option lists with an explicit scope
pub fn resolve_options_scoped(
    dataset: &Dataset,
    selection: &FacetSelection,
    scope: OptionScope,
) -> Result<OptionsMap, EngineError> {
    let desc = dataset.descriptor();
    let shared = filter(dataset, selection)?;

    let mut entries = Vec::with_capacity(desc.facets.len());
    for facet in desc.facets {
        let index = desc.field_index(facet)?;
        let values = if !dataset.has_column(index) {
            Vec::new()
        } else {
            match scope {
                OptionScope::Cascading => distinct(&shared, index),
                OptionScope::ExcludeOwnFacet if selection.constraint(index).is_some() => {
                    let view = filter(dataset, &selection.without(index))?;
                    distinct(&view, index)
                }
                OptionScope::ExcludeOwnFacet => distinct(&shared, index),
            }
        };
        entries.push(FacetOptions { facet, values });
    }

    tracing::debug!(
        schema = %dataset.schema(),
        tool = dataset.tool_id(),
        rows = shared.len(),
        "resolved facet options"
    );

    Ok(OptionsMap { entries })
}

/// Distinct values of a column in first-appearance order
fn distinct(view: &FilteredView<'_>, index: usize) -> Vec<FieldValue> {
    let mut seen = HashSet::new();
    view.column(index)
        .filter(|v| seen.insert(*v))
        .cloned()
        .collect()
}
