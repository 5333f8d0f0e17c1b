//! Engine configuration
//!
//! Read from YAML. Every field has a default, so an absent or partial file
//! is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::classify::Thresholds;
use crate::core::error::ConfigError;
use crate::core::schema::{SchemaKind, COARSE_ROW_LIMIT};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "metroscope.yaml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the `Tool_<id>.db` files
    pub data_dir: PathBuf,

    /// Most recent coarse rows loaded per tool (default: 60000)
    pub coarse_row_limit: usize,

    /// Keep loaded datasets in memory, keyed by schema and tool
    pub cache: bool,

    /// Highlighting rules
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            coarse_row_limit: COARSE_ROW_LIMIT,
            cache: true,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise `metroscope.yaml` in the
    /// working directory is tried, then `config.yaml` in the platform config
    /// directory, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = [Some(PathBuf::from(CONFIG_FILE_NAME)), Self::user_config_path()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content, &path.display().to_string())
    }

    /// Parse YAML content
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Platform config file (e.g. `~/.config/metroscope/config.yaml`)
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "metroscope")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Row cap applied when loading a schema
    pub fn row_limit(&self, schema: SchemaKind) -> Option<usize> {
        match schema {
            SchemaKind::Coarse => Some(self.coarse_row_limit),
            SchemaKind::Tad => schema.descriptor().row_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::{ThresholdRule, TAD_DAD_BAND};
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.coarse_row_limit, 60_000);
        assert!(config.cache);
        assert_eq!(config.row_limit(SchemaKind::Coarse), Some(60_000));
        assert_eq!(config.row_limit(SchemaKind::Tad), None);
        assert_eq!(config.thresholds.tad.scatter[0].rule, TAD_DAD_BAND);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("coarse_row_limit: 100\n", "test").unwrap();
        assert_eq!(config.coarse_row_limit, 100);
        assert!(config.cache);
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("", "test").unwrap(), Config::default());
    }

    #[test]
    fn test_adjustable_tad_band() {
        let yaml = r#"
data_dir: /srv/tools
thresholds:
  tad:
    scatter:
      - column: DAD_Pos_X
        rule: inside_open
        low: 12
        high: 18
    table:
      - column: Slope_X
        rule: abs_above
        limit: 5
"#;
        let config = Config::from_yaml(yaml, "test").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/tools"));
        assert_eq!(
            config.thresholds.tad.scatter[0].rule,
            ThresholdRule::InsideOpen {
                low: 12.0,
                high: 18.0
            }
        );
        assert_eq!(
            config.thresholds.tad.table[0].rule,
            ThresholdRule::AbsAbove { limit: 5.0 }
        );
        // Coarse rules untouched
        assert_eq!(config.thresholds.coarse, Thresholds::default().coarse);
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = Config::from_yaml("cache: [not, a, bool]", "bad.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let tmp = tempdir().unwrap();
        let err = Config::load(Some(&tmp.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("metroscope.yaml");
        std::fs::write(&path, "cache: false\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.cache);
    }
}
