//! Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Rows copied per fact batch during replication.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Settings for one pipeline run.
///
/// Every field has a default so a TOML file only needs to name what it
/// changes; the CLI applies its flags on top of the loaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV files or directories of CSV files.
    pub sources: Vec<PathBuf>,
    /// Optional allow-list of municipality names, one per line.
    pub city_list: Option<PathBuf>,
    /// Row-oriented store file.
    pub store_path: PathBuf,
    /// Columnar replica file. Defaults to the store path with a
    /// `.duckdb` extension.
    pub columnar_path: Option<PathBuf>,
    /// Replace sensitive text fields with one-way digests before loading.
    pub anonymize: bool,
    /// Build the dimensional model after validation.
    pub apply_transform: bool,
    /// Recreate the row store file instead of reusing it.
    pub overwrite_store: bool,
    /// Copy the dimensional model into the columnar replica.
    pub replicate_columnar: bool,
    /// Re-copy even when the replica already exists.
    pub force_replicate: bool,
    /// Fact rows per replication batch.
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            city_list: None,
            store_path: PathBuf::from("saev.db"),
            columnar_path: None,
            anonymize: false,
            apply_transform: true,
            overwrite_store: true,
            replicate_columnar: false,
            force_replicate: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Replica path, derived from the store path when not set.
    #[must_use]
    pub fn columnar_store_path(&self) -> PathBuf {
        self.columnar_path
            .clone()
            .unwrap_or_else(|| self.store_path.with_extension("duckdb"))
    }

    /// Checks the settings needed by a full run.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert!(config.apply_transform);
        assert!(config.overwrite_store);
        assert!(!config.replicate_columnar);
        assert_eq!(config.batch_size, 100_000);
    }

    #[test]
    fn columnar_path_follows_store_path() {
        let config = PipelineConfig {
            store_path: PathBuf::from("out/saev.db"),
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.columnar_store_path(),
            PathBuf::from("out/saev.duckdb")
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
sources = ["data"]
anonymize = true
batch_size = 500
"#,
        )
        .unwrap();
        assert_eq!(config.sources, vec![PathBuf::from("data")]);
        assert!(config.anonymize);
        assert_eq!(config.batch_size, 500);
        assert!(config.apply_transform);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = PipelineConfig {
            sources: vec![PathBuf::from("data")],
            batch_size: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBatchSize)));
    }
}
