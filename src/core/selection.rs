//! Facet selections
//!
//! A selection maps facets to sets of accepted values. A facet with no
//! entry, or an empty set, places no constraint on the view.

use std::collections::{BTreeMap, HashSet};

use crate::core::error::EngineError;
use crate::core::schema::SchemaKind;
use crate::core::value::FieldValue;

/// Selected values per facet for one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSelection {
    schema: SchemaKind,
    /// Keyed by field index, so iteration follows schema field order
    constraints: BTreeMap<usize, HashSet<FieldValue>>,
}

impl FacetSelection {
    /// Selection with no constraints
    pub fn new(schema: SchemaKind) -> Self {
        Self {
            schema,
            constraints: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> SchemaKind {
        self.schema
    }

    /// Add values to a facet's accepted set
    pub fn select<I, V>(&mut self, facet: &str, values: I) -> Result<&mut Self, EngineError>
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let index = self.schema.descriptor().facet_index(facet)?;
        self.constraints
            .entry(index)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        Ok(self)
    }

    /// Builder form of [`FacetSelection::select`]
    pub fn with<I, V>(mut self, facet: &str, values: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.select(facet, values)?;
        Ok(self)
    }

    /// Add user-typed literals, parsed according to the facet's declared kind
    pub fn select_literals<S: AsRef<str>>(
        &mut self,
        facet: &str,
        literals: &[S],
    ) -> Result<&mut Self, EngineError> {
        let desc = self.schema.descriptor();
        let kind = desc.field(desc.facet_index(facet)?).kind;
        let values = literals
            .iter()
            .map(|lit| {
                FieldValue::parse_as(lit.as_ref(), kind).ok_or_else(|| {
                    EngineError::InvalidLiteral {
                        facet: facet.to_string(),
                        literal: lit.as_ref().to_string(),
                        expected: kind,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.select(facet, values)
    }

    /// Drop every constraint on a facet
    pub fn clear(&mut self, facet: &str) -> Result<&mut Self, EngineError> {
        let index = self.schema.descriptor().facet_index(facet)?;
        self.constraints.remove(&index);
        Ok(self)
    }

    /// Accepted values for a facet; `None` when unconstrained
    pub fn values(&self, facet: &str) -> Option<&HashSet<FieldValue>> {
        let index = self.schema.descriptor().facet_index(facet).ok()?;
        self.constraint(index)
    }

    /// Active constraint at a field index, skipping empty sets
    pub(crate) fn constraint(&self, index: usize) -> Option<&HashSet<FieldValue>> {
        self.constraints.get(&index).filter(|set| !set.is_empty())
    }

    /// Active (non-empty) constraints in field order
    pub(crate) fn active(&self) -> impl Iterator<Item = (usize, &HashSet<FieldValue>)> {
        self.constraints
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(&i, set)| (i, set))
    }

    /// Copy of this selection without the constraint at a field index
    pub(crate) fn without(&self, index: usize) -> FacetSelection {
        let mut other = self.clone();
        other.constraints.remove(&index);
        other
    }

    /// True when no facet is constrained
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Number of constrained facets
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Combine two selections; facets present in both accept the union of values
    pub fn union(&self, other: &FacetSelection) -> FacetSelection {
        let mut merged = self.clone();
        for (index, set) in &other.constraints {
            merged
                .constraints
                .entry(*index)
                .or_default()
                .extend(set.iter().cloned());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_selection_is_empty() {
        let sel = FacetSelection::new(SchemaKind::Coarse);
        assert!(sel.is_empty());
        assert_eq!(sel.active_count(), 0);
    }

    #[test]
    fn test_empty_value_set_is_no_constraint() {
        let mut sel = FacetSelection::new(SchemaKind::Coarse);
        sel.select("Lot Name", Vec::<FieldValue>::new()).unwrap();
        assert!(sel.is_empty());
        assert!(sel.values("Lot Name").is_none());
    }

    #[test]
    fn test_select_unknown_facet_fails() {
        let mut sel = FacetSelection::new(SchemaKind::Coarse);
        let err = sel.select("Recipe", ["A"]).unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch { .. }));

        // X is a field but not a facet
        assert!(sel.select("X", [480.0]).is_err());
    }

    #[test]
    fn test_select_literals_parses_by_kind() {
        let mut sel = FacetSelection::new(SchemaKind::Coarse);
        sel.select_literals("X_Die", &["3", "4"]).unwrap();
        let values = sel.values("X_Die").unwrap();
        assert!(values.contains(&FieldValue::Integer(3)));
        assert!(values.contains(&FieldValue::Integer(4)));

        let err = sel.select_literals("X_Die", &["left"]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidLiteral { .. }));
    }

    #[test]
    fn test_repeated_select_accumulates() {
        let mut sel = FacetSelection::new(SchemaKind::Tad);
        sel.select("Lot", ["A"]).unwrap();
        sel.select("Lot", ["B"]).unwrap();
        assert_eq!(sel.values("Lot").unwrap().len(), 2);
    }

    #[test]
    fn test_union_and_clear() {
        let a = FacetSelection::new(SchemaKind::Tad).with("Lot", ["A"]).unwrap();
        let b = FacetSelection::new(SchemaKind::Tad)
            .with("Phase", ["P1"])
            .unwrap()
            .with("Lot", ["B"])
            .unwrap();
        let mut merged = a.union(&b);
        assert_eq!(merged.active_count(), 2);
        assert_eq!(merged.values("Lot").unwrap().len(), 2);

        merged.clear("Lot").unwrap();
        assert_eq!(merged.active_count(), 1);
    }
}
