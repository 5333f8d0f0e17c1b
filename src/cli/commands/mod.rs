//! CLI command implementations

pub mod browse;
pub mod classify;
pub mod completions;
pub mod options;
pub mod plot;
pub mod rows;
pub mod tools;

use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::{Config, Engine, SqliteStore};

/// Build an engine from the config file and global overrides
pub fn open_engine(global: &GlobalOpts) -> Result<Engine<SqliteStore>> {
    let mut config = Config::load(global.config.as_deref()).into_diagnostic()?;
    if let Some(dir) = &global.data_dir {
        config.data_dir = dir.clone();
    }
    tracing::info!(data_dir = %config.data_dir.display(), "opening tool databases");
    let store = SqliteStore::new(&config.data_dir);
    Ok(Engine::new(store, config))
}
