//! Facet filter engine
//!
//! Active facets are combined conjunctively: a record survives only when,
//! for every constrained facet, its value is one of the selected values.

use crate::core::dataset::{Dataset, FilteredView};
use crate::core::error::EngineError;
use crate::core::selection::FacetSelection;

/// Reduce a dataset to the records matching every active facet
pub fn filter<'a>(
    dataset: &'a Dataset,
    selection: &FacetSelection,
) -> Result<FilteredView<'a>, EngineError> {
    refine(&dataset.full_view(), selection)
}

/// Further reduce an existing view
pub fn refine<'a>(
    view: &FilteredView<'a>,
    selection: &FacetSelection,
) -> Result<FilteredView<'a>, EngineError> {
    let dataset = view.dataset();
    if selection.schema() != dataset.schema() {
        return Err(EngineError::SchemaMismatch {
            schema: dataset.schema(),
            name: format!("{} selection", selection.schema()),
            context: "selection",
        });
    }

    if selection.is_empty() {
        return Ok(view.clone());
    }

    let active: Vec<_> = selection.active().collect();
    let records = dataset.records();
    let rows = view
        .row_indices()
        .iter()
        .copied()
        .filter(|&row| {
            let record = &records[row];
            active
                .iter()
                .all(|(index, accepted)| accepted.contains(record.get(*index)))
        })
        .collect();

    Ok(FilteredView::from_rows(dataset, rows))
}
