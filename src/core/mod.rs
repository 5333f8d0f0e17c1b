//! Core module - datasets, filtering and classification

pub mod classify;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod options;
pub mod schema;
pub mod selection;
pub mod store;
pub mod value;

pub use classify::{
    classify, column_mean, fit_line, CellFlag, Classification, ColumnRule, FitLine, FitPoint,
    PlotSeries, RowFlags, RuleSet, ScatterPoint, Tag, ThresholdRule, Thresholds,
};
pub use config::Config;
pub use dataset::{Dataset, FilteredView, RawTable, Record};
pub use engine::{Engine, Snapshot};
pub use error::{ConfigError, EngineError};
pub use filter::{filter, refine};
pub use options::{resolve_options, resolve_options_scoped, FacetOptions, OptionScope, OptionsMap};
pub use schema::{FieldKind, SchemaDescriptor, SchemaKind};
pub use selection::FacetSelection;
pub use store::{MemoryStore, RecordStore, SqliteStore};
pub use value::FieldValue;
