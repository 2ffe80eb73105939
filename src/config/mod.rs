//! Pipeline configuration.
//!
//! Declarative TOML describing where resource files live, plus log
//! settings. The configuration only names directories; how files in them
//! become live resources is the managers' business.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::logging::LogConfig;
use crate::resource::{CollectionSettings, ResourceCollection};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

fn default_source_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

/// Render-pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Source roots scanned for resource subdirectories.
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<PathBuf>,
    /// Per-kind subdirectory overrides, keyed by collection short name
    /// (e.g. `handler = "my-handlers"`).
    #[serde(default)]
    pub resource_dirs: HashMap<String, PathBuf>,
    /// Log level (trace, debug, info, warn, error, off).
    #[serde(default)]
    pub log_level: Option<String>,
    /// Log retention period in hours.
    #[serde(default)]
    pub log_retention_hours: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_roots: default_source_roots(),
            resource_dirs: HashMap::new(),
            log_level: None,
            log_retention_hours: None,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Builds the concrete collection for one kind's settings: each source
    /// root joined with the configured subdirectory override, or the kind's
    /// default subdirectory.
    #[must_use]
    pub fn collection_for(&self, settings: &CollectionSettings) -> ResourceCollection {
        let subdir = self
            .resource_dirs
            .get(settings.short)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(settings.default_subdir));
        let roots = self
            .source_roots
            .iter()
            .map(|root| root.join(&subdir))
            .collect();
        ResourceCollection::new(*settings, roots)
    }

    /// Log configuration derived from this config.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut log = LogConfig::default();
        if let Some(level) = &self.log_level {
            log.level = LogConfig::parse_level(level);
        }
        if let Some(hours) = self.log_retention_hours {
            log.retention_hours = hours;
        }
        log
    }
}
