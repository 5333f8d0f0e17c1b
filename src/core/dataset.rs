//! Datasets and the views filtering produces over them

use std::sync::Arc;

use crate::core::error::EngineError;
use crate::core::schema::{SchemaDescriptor, SchemaKind};
use crate::core::value::FieldValue;

/// An immutable row; values are in schema field order
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Vec<FieldValue>);

impl Record {
    pub fn get(&self, index: usize) -> &FieldValue {
        &self.0[index]
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }
}

/// Raw rows as read from a backing store, before coercion
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in the order values appear in each row
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

/// All records of one schema for one tool
///
/// Never mutated after load; filtering yields a [`FilteredView`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: SchemaKind,
    tool_id: String,
    present: Vec<bool>,
    records: Arc<[Record]>,
}

impl Dataset {
    /// Dataset for a tool with no backing data
    pub fn empty(schema: SchemaKind, tool_id: &str) -> Self {
        Self {
            schema,
            tool_id: tool_id.to_string(),
            present: vec![false; schema.descriptor().fields.len()],
            records: Arc::from(Vec::new()),
        }
    }

    /// Build a dataset from raw rows, coercing every cell to its declared kind
    ///
    /// Columns the schema does not know are ignored; schema fields the table
    /// lacks are marked absent and read as null.
    pub fn from_raw(schema: SchemaKind, tool_id: &str, raw: RawTable) -> Result<Self, EngineError> {
        let desc = schema.descriptor();
        let mut present = vec![false; desc.fields.len()];

        // Position of each schema field within the raw row
        let mut source: Vec<Option<usize>> = vec![None; desc.fields.len()];
        for (col_idx, name) in raw.columns.iter().enumerate() {
            if let Ok(field_idx) = desc.field_index(name) {
                present[field_idx] = true;
                source[field_idx] = Some(col_idx);
            }
        }

        let mut records = Vec::with_capacity(raw.rows.len());
        for (row_idx, mut row) in raw.rows.into_iter().enumerate() {
            let mut values = Vec::with_capacity(desc.fields.len());
            for (field, src) in desc.fields.iter().zip(&source) {
                let raw_value = match src {
                    Some(i) => row.get_mut(*i).map(std::mem::take).unwrap_or_default(),
                    None => FieldValue::Null,
                };
                let found = raw_value.describe();
                let value = raw_value.coerce(field.kind).ok_or_else(|| {
                    EngineError::TypeCoercion {
                        tool_id: tool_id.to_string(),
                        column: field.name.to_string(),
                        row: row_idx + 1,
                        found,
                        expected: field.kind,
                    }
                })?;
                values.push(value);
            }
            records.push(Record(values));
        }

        Ok(Self {
            schema,
            tool_id: tool_id.to_string(),
            present,
            records: Arc::from(records),
        })
    }

    pub fn schema(&self) -> SchemaKind {
        self.schema
    }

    pub fn descriptor(&self) -> &'static SchemaDescriptor {
        self.schema.descriptor()
    }

    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the backing table had this field's column
    pub fn has_column(&self, index: usize) -> bool {
        self.present.get(index).copied().unwrap_or(false)
    }

    /// View over every record
    pub fn full_view(&self) -> FilteredView<'_> {
        FilteredView {
            dataset: self,
            rows: (0..self.records.len()).collect(),
        }
    }
}

/// A dataset reduced by a selection; rows keep dataset order
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub(crate) fn from_rows(dataset: &'a Dataset, rows: Vec<usize>) -> Self {
        Self { dataset, rows }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Dataset indices of the retained rows
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.dataset.records();
        self.rows.iter().map(move |&i| &records[i])
    }

    /// Values of one field across the view
    pub fn column(&self, index: usize) -> impl Iterator<Item = &'a FieldValue> + '_ {
        self.records().map(move |r| r.get(index))
    }

    /// Materialize the retained records
    pub fn to_records(&self) -> Vec<Record> {
        self.records().cloned().collect()
    }
}

impl PartialEq for FilteredView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dataset, other.dataset) && self.rows == other.rows
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-built datasets shared by the engine's unit tests

    use super::*;

    pub fn raw(columns: &[&str], rows: Vec<Vec<FieldValue>>) -> RawTable {
        RawTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn coarse_row(lot: &str, x_die: i64, x: f64, y: f64) -> Vec<FieldValue> {
        vec![
            "2024-01-15 10:30:00".into(),
            if (478.5..=481.5).contains(&x) { "Pass" } else { "Fail" }.into(),
            if (403.5..=406.5).contains(&y) { "Pass" } else { "Fail" }.into(),
            lot.into(),
            x_die.into(),
            0i64.into(),
            1i64.into(),
            "0".into(),
            "SN-1".into(),
            x.into(),
            y.into(),
        ]
    }

    pub fn coarse(rows: Vec<Vec<FieldValue>>) -> Dataset {
        let columns: Vec<&str> = SchemaKind::Coarse.descriptor().field_names().collect();
        Dataset::from_raw(SchemaKind::Coarse, "101", raw(&columns, rows)).unwrap()
    }

    pub fn tad_row(lot: &str, tis_x: f64, dad_x: f64, slope_x: f64, b_x: f64) -> Vec<FieldValue> {
        vec![
            "2024-01-15 10:30:00".into(),
            "RCP-1".into(),
            lot.into(),
            "Converge".into(),
            "SN-1".into(),
            1i64.into(),
            2i64.into(),
            0.1.into(),
            0.2.into(),
            tis_x.into(),
            0.5.into(),
            dad_x.into(),
            10.0.into(),
            slope_x.into(),
            1.0.into(),
            b_x.into(),
            3.0.into(),
            "Converged".into(),
            "OK".into(),
        ]
    }

    pub fn tad(rows: Vec<Vec<FieldValue>>) -> Dataset {
        let columns: Vec<&str> = SchemaKind::Tad.descriptor().field_names().collect();
        Dataset::from_raw(SchemaKind::Tad, "101", raw(&columns, rows)).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::empty(SchemaKind::Tad, "999");
        assert!(ds.is_empty());
        assert_eq!(ds.tool_id(), "999");
        assert!(!ds.has_column(0));
        assert!(ds.full_view().is_empty());
    }

    #[test]
    fn test_from_raw_maps_columns_by_name() {
        // Columns arrive in a different order and with an extra column
        let table = raw(
            &["Y", "Extra", "X", "Lot Name"],
            vec![vec![405.0.into(), "ignored".into(), 480.0.into(), "Lot A".into()]],
        );
        let ds = Dataset::from_raw(SchemaKind::Coarse, "7", table).unwrap();
        let desc = ds.descriptor();

        let rec = &ds.records()[0];
        assert_eq!(rec.get(desc.field_index("X").unwrap()), &FieldValue::Real(480.0));
        assert_eq!(rec.get(desc.field_index("Y").unwrap()), &FieldValue::Real(405.0));
        assert_eq!(rec.get(desc.field_index("Lot Name").unwrap()), &"Lot A".into());
        assert!(rec.get(desc.field_index("Time").unwrap()).is_null());
        assert!(ds.has_column(desc.field_index("X").unwrap()));
        assert!(!ds.has_column(desc.field_index("Time").unwrap()));
    }

    #[test]
    fn test_from_raw_coerces_declared_kinds() {
        let table = raw(&["X_Die", "X", "Orientation"], vec![vec![
            "3".into(),
            FieldValue::Integer(480),
            FieldValue::Integer(90),
        ]]);
        let ds = Dataset::from_raw(SchemaKind::Coarse, "7", table).unwrap();
        let desc = ds.descriptor();
        let rec = &ds.records()[0];
        assert_eq!(rec.get(desc.field_index("X_Die").unwrap()), &FieldValue::Integer(3));
        assert_eq!(rec.get(desc.field_index("X").unwrap()), &FieldValue::Real(480.0));
        assert_eq!(
            rec.get(desc.field_index("Orientation").unwrap()),
            &FieldValue::Text("90".into())
        );
    }

    #[test]
    fn test_from_raw_reports_type_coercion() {
        let table = raw(&["X"], vec![vec![480.0.into()], vec!["bad".into()]]);
        let err = Dataset::from_raw(SchemaKind::Coarse, "7", table).unwrap_err();
        match err {
            EngineError::TypeCoercion {
                tool_id,
                column,
                row,
                ..
            } => {
                assert_eq!(tool_id, "7");
                assert_eq!(column, "X");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_view_preserves_dataset_order() {
        let ds = coarse(vec![
            coarse_row("A", 1, 480.0, 405.0),
            coarse_row("B", 2, 480.0, 405.0),
            coarse_row("C", 3, 480.0, 405.0),
        ]);
        let view = FilteredView::from_rows(&ds, vec![0, 2]);
        let lot = ds.descriptor().field_index("Lot Name").unwrap();
        let lots: Vec<_> = view.column(lot).map(|v| v.to_string()).collect();
        assert_eq!(lots, vec!["A", "C"]);
        assert_eq!(view.to_records().len(), 2);
    }
}
