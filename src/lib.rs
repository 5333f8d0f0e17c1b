//! Metroscope: faceted filtering and threshold analytics for per-tool
//! measurement datasets
//!
//! Each tool keeps its coarse pixel and TAD converge measurements in a
//! `Tool_<id>.db` SQLite file. The engine loads a tool's records, narrows
//! them by facet selections, keeps every facet's option list consistent
//! with the selection, and tags records against fixed thresholds.

pub mod cli;
pub mod core;
