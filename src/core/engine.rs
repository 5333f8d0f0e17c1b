//! Engine facade
//!
//! Ties a record store, configuration and the dataset cache together. One
//! engine serves both schemas; datasets are cached per `(schema, tool)` and
//! never mutated once loaded.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::classify::{classify, Classification};
use crate::core::config::Config;
use crate::core::dataset::{Dataset, FilteredView, Record};
use crate::core::error::EngineError;
use crate::core::filter::filter;
use crate::core::options::{resolve_options_scoped, OptionScope, OptionsMap};
use crate::core::schema::SchemaKind;
use crate::core::selection::FacetSelection;
use crate::core::store::RecordStore;

type CacheKey = (SchemaKind, String);

/// Faceted filter and analytics engine over a record store
pub struct Engine<S> {
    store: S,
    config: Config,
    cache: Mutex<HashMap<CacheKey, Arc<Dataset>>>,
}

/// Everything a view needs after one selection change
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub dataset: Arc<Dataset>,
    /// Dataset indices of the rows matching the selection
    pub rows: Vec<usize>,
    pub options: OptionsMap,
    pub classification: Classification,
}

impl Snapshot {
    /// Borrowed view over the matching rows
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::from_rows(&self.dataset, self.rows.clone())
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        let records = self.dataset.records();
        self.rows.iter().map(move |&i| &records[i])
    }
}

impl<S: RecordStore> Engine<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sorted, de-duplicated tool identifiers
    pub fn tool_catalog(&self) -> Result<BTreeSet<String>, EngineError> {
        let ids = self.store.tool_ids()?;
        tracing::debug!(tools = ids.len(), "tool catalog");
        Ok(ids)
    }

    /// Load a tool's dataset, from cache when possible
    ///
    /// A tool or table the store does not know yields an empty dataset.
    pub fn load(&self, schema: SchemaKind, tool_id: &str) -> Result<Arc<Dataset>, EngineError> {
        let key = (schema, tool_id.to_string());
        if self.config.cache {
            if let Some(hit) = self.lock_cache().get(&key) {
                tracing::debug!(%schema, tool = tool_id, "dataset cache hit");
                return Ok(Arc::clone(hit));
            }
        }

        let desc = schema.descriptor();
        let raw = self
            .store
            .fetch(tool_id, desc, self.config.row_limit(schema))?;

        let Some(raw) = raw else {
            tracing::debug!(%schema, tool = tool_id, "no data for tool, using empty dataset");
            return Ok(Arc::new(Dataset::empty(schema, tool_id)));
        };

        let dataset = Arc::new(Dataset::from_raw(schema, tool_id, raw)?);
        tracing::debug!(%schema, tool = tool_id, rows = dataset.len(), "dataset loaded");

        if self.config.cache {
            self.lock_cache().insert(key, Arc::clone(&dataset));
        }
        Ok(dataset)
    }

    pub fn filter<'a>(
        &self,
        dataset: &'a Dataset,
        selection: &FacetSelection,
    ) -> Result<FilteredView<'a>, EngineError> {
        filter(dataset, selection)
    }

    pub fn resolve_options(
        &self,
        dataset: &Dataset,
        selection: &FacetSelection,
        scope: OptionScope,
    ) -> Result<OptionsMap, EngineError> {
        resolve_options_scoped(dataset, selection, scope)
    }

    /// Classify a view using the configured thresholds
    pub fn classify(&self, view: &FilteredView<'_>) -> Result<Classification, EngineError> {
        classify(view, &self.config.thresholds)
    }

    /// Load, filter, resolve options and classify in one step
    pub fn run(
        &self,
        schema: SchemaKind,
        tool_id: &str,
        selection: &FacetSelection,
        scope: OptionScope,
    ) -> Result<Snapshot, EngineError> {
        let dataset = self.load(schema, tool_id)?;
        let view = self.filter(&dataset, selection)?;
        let options = self.resolve_options(&dataset, selection, scope)?;
        let classification = self.classify(&view)?;
        let rows = view.row_indices().to_vec();

        Ok(Snapshot {
            dataset,
            rows,
            options,
            classification,
        })
    }

    /// Drop every cached dataset
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Number of cached datasets
    pub fn cached(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<Dataset>>> {
        // Entries are immutable, so a poisoned map is still consistent
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::Tag;
    use crate::core::dataset::fixtures::*;
    use crate::core::dataset::RawTable;
    use crate::core::schema::SchemaDescriptor;
    use crate::core::store::MemoryStore;
    use crate::core::value::FieldValue;
    use std::cell::Cell;

    const COARSE_COLUMNS: &[&str] = &[
        "Time",
        "X Pass/Fail",
        "Y Pass/Fail",
        "Lot Name",
        "X_Die",
        "Y_Die",
        "Static Iteration",
        "Orientation",
        "Site Serial Number",
        "X",
        "Y",
    ];

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert(
            SchemaKind::Coarse,
            "101",
            raw(
                COARSE_COLUMNS,
                vec![
                    coarse_row("Lot A", 1, 480.0, 405.0),
                    coarse_row("Lot B", 2, 482.0, 405.0),
                ],
            ),
        );
        store
    }

    /// Counts fetches to observe caching
    struct CountingStore {
        inner: MemoryStore,
        fetches: Cell<usize>,
    }

    impl RecordStore for CountingStore {
        fn tool_ids(&self) -> Result<BTreeSet<String>, EngineError> {
            self.inner.tool_ids()
        }

        fn fetch(
            &self,
            tool_id: &str,
            schema: &SchemaDescriptor,
            row_limit: Option<usize>,
        ) -> Result<Option<RawTable>, EngineError> {
            self.fetches.set(self.fetches.get() + 1);
            self.inner.fetch(tool_id, schema, row_limit)
        }
    }

    #[test]
    fn test_unknown_tool_is_empty_everything() {
        let engine = Engine::new(store(), Config::default());
        let snap = engine
            .run(
                SchemaKind::Tad,
                "999",
                &FacetSelection::new(SchemaKind::Tad),
                OptionScope::Cascading,
            )
            .unwrap();
        assert!(snap.dataset.is_empty());
        assert!(snap.rows.is_empty());
        assert!(snap.options.all_empty());
        assert!(snap.classification.is_empty());
        for plot in &snap.classification.plots {
            assert!(plot.fit.as_ref().unwrap().points.is_empty());
        }
    }

    #[test]
    fn test_run_filters_and_classifies() {
        let engine = Engine::new(store(), Config::default());
        let sel = FacetSelection::new(SchemaKind::Coarse)
            .with("Lot Name", ["Lot B"])
            .unwrap();
        let snap = engine
            .run(SchemaKind::Coarse, "101", &sel, OptionScope::Cascading)
            .unwrap();

        assert_eq!(snap.rows, vec![1]);
        assert_eq!(snap.view().len(), 1);
        let lot = snap.records().next().unwrap().get(3);
        assert_eq!(lot, &FieldValue::from("Lot B"));
        assert_eq!(
            snap.classification.plot("Coarse X vs Time").unwrap().points[0].tag,
            Tag::OutOfRange
        );
        assert_eq!(snap.options.get("Lot Name").unwrap().len(), 1);
    }

    #[test]
    fn test_exclude_own_facet_through_engine() {
        let engine = Engine::new(store(), Config::default());
        let sel = FacetSelection::new(SchemaKind::Coarse)
            .with("Lot Name", ["Lot B"])
            .unwrap();
        let snap = engine
            .run(SchemaKind::Coarse, "101", &sel, OptionScope::ExcludeOwnFacet)
            .unwrap();
        assert_eq!(snap.options.get("Lot Name").unwrap().len(), 2);
    }

    #[test]
    fn test_datasets_are_cached_per_schema_and_tool() {
        let engine = Engine::new(
            CountingStore {
                inner: store(),
                fetches: Cell::new(0),
            },
            Config::default(),
        );
        let a = engine.load(SchemaKind::Coarse, "101").unwrap();
        let b = engine.load(SchemaKind::Coarse, "101").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.store().fetches.get(), 1);
        assert_eq!(engine.cached(), 1);

        // Same tool, other schema: separate entry (not found, so not cached)
        engine.load(SchemaKind::Tad, "101").unwrap();
        assert_eq!(engine.store().fetches.get(), 2);
        assert_eq!(engine.cached(), 1);

        engine.clear_cache();
        assert_eq!(engine.cached(), 0);
        engine.load(SchemaKind::Coarse, "101").unwrap();
        assert_eq!(engine.store().fetches.get(), 3);
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let config = Config {
            cache: false,
            ..Config::default()
        };
        let engine = Engine::new(
            CountingStore {
                inner: store(),
                fetches: Cell::new(0),
            },
            config,
        );
        engine.load(SchemaKind::Coarse, "101").unwrap();
        engine.load(SchemaKind::Coarse, "101").unwrap();
        assert_eq!(engine.store().fetches.get(), 2);
        assert_eq!(engine.cached(), 0);
    }

    #[test]
    fn test_filtering_leaves_cached_dataset_untouched() {
        let engine = Engine::new(store(), Config::default());
        let dataset = engine.load(SchemaKind::Coarse, "101").unwrap();
        let sel = FacetSelection::new(SchemaKind::Coarse)
            .with("Lot Name", ["Lot A"])
            .unwrap();
        let view = engine.filter(&dataset, &sel).unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(engine.load(SchemaKind::Coarse, "101").unwrap().len(), 2);
    }

    #[test]
    fn test_coarse_row_limit_from_config() {
        let config = Config {
            coarse_row_limit: 1,
            ..Config::default()
        };
        let engine = Engine::new(store(), config);
        assert_eq!(engine.load(SchemaKind::Coarse, "101").unwrap().len(), 1);
    }

    #[test]
    fn test_type_coercion_surfaces_from_load() {
        let mut mem = MemoryStore::new();
        mem.insert(
            SchemaKind::Tad,
            "7",
            raw(&["Slope_X"], vec![vec!["steep".into()]]),
        );
        let engine = Engine::new(mem, Config::default());
        let err = engine.load(SchemaKind::Tad, "7").unwrap_err();
        assert!(err.is_type_coercion());
        assert!(err.to_string().contains("Slope_X"));
    }

    #[test]
    fn test_mismatched_selection_is_rejected() {
        let engine = Engine::new(store(), Config::default());
        let err = engine
            .run(
                SchemaKind::Coarse,
                "101",
                &FacetSelection::new(SchemaKind::Tad),
                OptionScope::Cascading,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_catalog() {
        let engine = Engine::new(store(), Config::default());
        let ids: Vec<_> = engine.tool_catalog().unwrap().into_iter().collect();
        assert_eq!(ids, vec!["101"]);
    }
}
