//! Data-directory layout and the optional `config.toml`.
//!
//! ```text
//! ~/.eigen-graphs/        (or $EG_DATA_DIR)
//! ├── config.toml
//! ├── skew.db
//! └── symmetric.db
//! ```

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use eg_core::constants::{
    CHEBYSHEV_THRESHOLD, DEFAULT_BATCH_SIZE, DEFAULT_MAX_UNIQUE_GRAPHS, DEFAULT_PROGRESS_INTERVAL,
    PATTERN_TOLERANCE, RESIDUE_LIMIT, TOLERANCE,
};
use eg_core::{ClassifierConfig, MatrixKind, SearchOptions};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const DATA_DIR_ENV: &str = "EG_DATA_DIR";
pub const CONFIG_FILE: &str = "config.toml";

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub max_unique_graphs: usize,
    /// Masks processed between yields when the search is driven in batches.
    pub batch_size: usize,
    pub progress_interval: u64,
    pub build_incremental: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_unique_graphs: DEFAULT_MAX_UNIQUE_GRAPHS,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            build_incremental: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    pub tolerance: f64,
    pub pattern_tolerance: f64,
    pub residue_limit: usize,
    pub chebyshev_threshold: f64,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            pattern_tolerance: PATTERN_TOLERANCE,
            residue_limit: RESIDUE_LIMIT,
            chebyshev_threshold: CHEBYSHEV_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchSection,
    pub classifier: ClassifierSection,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| StoreError::InvalidData(format!("invalid config: {e}")))
    }

    /// Search options with the configured limits; filters stay at their defaults.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_unique_graphs: self.search.max_unique_graphs,
            progress_interval: self.search.progress_interval.max(1),
            build_incremental: self.search.build_incremental,
            ..SearchOptions::default()
        }
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            tolerance: self.classifier.tolerance,
            pattern_tolerance: self.classifier.pattern_tolerance,
            residue_limit: self.classifier.residue_limit,
            chebyshev_threshold: self.classifier.chebyshev_threshold,
            ..ClassifierConfig::default()
        }
    }
}

/// Resolved storage root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$EG_DATA_DIR` if set and non-empty, else `~/.eigen-graphs`.
    pub fn resolve() -> Self {
        match env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(dirs_home().join(".eigen-graphs")),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self, kind: MatrixKind) -> PathBuf {
        self.root.join(format!("{}.db", kind.as_str()))
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", self.root.display()))
        })
    }

    /// Open (creating as needed) the store for one matrix kind.
    pub fn open_store(&self, kind: MatrixKind) -> Result<Store> {
        self.ensure()?;
        Store::open(&self.db_path(kind))
    }

    /// Read `config.toml`. A missing file gives defaults silently; an
    /// unreadable or invalid one gives defaults with a warning.
    pub fn load_config(&self) -> Config {
        let path = self.config_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Config::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
                return Config::default();
            }
        };
        match Config::parse(&text) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default config");
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.classifier_config(), ClassifierConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            "[search]\nmax_unique_graphs = 500\nbuild_incremental = false\n\n[classifier]\nresidue_limit = 3\n",
        )
        .unwrap();
        assert_eq!(config.search.max_unique_graphs, 500);
        assert_eq!(config.search.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(config.classifier.residue_limit, 3);
        assert_eq!(config.classifier.tolerance, TOLERANCE);

        let options = config.search_options();
        assert_eq!(options.max_unique_graphs, 500);
        assert!(!options.build_incremental);
        assert!(options.seed_families);
        assert_eq!(config.classifier_config().residue_limit, 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Config::parse("[search]\nmax_unique_graphs = \"lots\"").is_err());
    }

    #[test]
    fn test_data_dir_layout() {
        let dir = DataDir::new("/tmp/eg-test");
        assert_eq!(dir.db_path(MatrixKind::Skew), PathBuf::from("/tmp/eg-test/skew.db"));
        assert_eq!(
            dir.db_path(MatrixKind::Symmetric),
            PathBuf::from("/tmp/eg-test/symmetric.db")
        );
        assert_eq!(dir.config_path(), PathBuf::from("/tmp/eg-test/config.toml"));
    }

    #[test]
    fn test_load_config_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::new(tmp.path());
        assert_eq!(dir.load_config(), Config::default());

        fs::write(dir.config_path(), "not = [valid").unwrap();
        assert_eq!(dir.load_config(), Config::default());

        fs::write(dir.config_path(), "[search]\nbatch_size = 64\n").unwrap();
        assert_eq!(dir.load_config().search.batch_size, 64);
    }

    #[test]
    fn test_open_store_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::new(tmp.path().join("nested"));
        dir.open_store(MatrixKind::Skew).unwrap();
        assert!(dir.db_path(MatrixKind::Skew).exists());
    }
}
