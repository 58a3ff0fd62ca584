// rowstream-core/src/config.rs

//! Configuration management for the batched row reader.
//!
//! This module provides configuration parsing from TOML files, environment
//! variable overrides, and validation of configuration values.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ReaderError, Result};

// Top-level reader configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub storage: StorageConfig,
    pub dataset: DatasetConfig,
    pub loader: LoaderConfig,
}

// Storage configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    // Base path that relative dataset files are resolved against.
    pub base_path: PathBuf,
    /// Rows decoded per internal Parquet record batch.
    pub decode_batch_rows: usize,
}

/// Dataset layout: which files, and how their columns split.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Backing files, read in this order.
    pub files: Vec<PathBuf>,
    /// Feature column names, in output order.
    pub features: Vec<String>,
    /// Label (or weight) column name.
    pub label: String,
}

// Batch iteration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    // Rows per training batch.
    pub batch_size: usize,
    // Batches materialized per storage read.
    pub buffer_batches: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./data"),
            decode_batch_rows: 8192,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            buffer_batches: 8,
        }
    }
}

impl FromStr for ReaderConfig {
    type Err = ReaderError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| ReaderError::config_with_source("failed to parse TOML config", e))
    }
}

impl ReaderConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReaderError::storage_with_source(path, "failed to read config file", e)
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Environment variables are prefixed with `ROWSTREAM_`:
    // - `ROWSTREAM_STORAGE_BASE_PATH` overrides `storage.base_path`
    // - `ROWSTREAM_DATASET_FILES` overrides `dataset.files` (comma-separated)
    // - `ROWSTREAM_DATASET_FEATURES` overrides `dataset.features` (comma-separated)
    // - `ROWSTREAM_DATASET_LABEL` overrides `dataset.label`
    // - `ROWSTREAM_LOADER_BATCH_SIZE` overrides `loader.batch_size`
    //
    // Numeric variables that fail to parse are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        // Storage overrides
        if let Ok(val) = std::env::var("ROWSTREAM_STORAGE_BASE_PATH") {
            self.storage.base_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("ROWSTREAM_STORAGE_DECODE_BATCH_ROWS") {
            if let Ok(v) = val.parse() {
                self.storage.decode_batch_rows = v;
            }
        }

        // Dataset overrides
        if let Ok(val) = std::env::var("ROWSTREAM_DATASET_FILES") {
            self.dataset.files = split_list(&val).map(PathBuf::from).collect();
        }
        if let Ok(val) = std::env::var("ROWSTREAM_DATASET_FEATURES") {
            self.dataset.features = split_list(&val).map(str::to_string).collect();
        }
        if let Ok(val) = std::env::var("ROWSTREAM_DATASET_LABEL") {
            self.dataset.label = val;
        }

        // Loader overrides
        if let Ok(val) = std::env::var("ROWSTREAM_LOADER_BATCH_SIZE") {
            if let Ok(v) = val.parse() {
                self.loader.batch_size = v;
            }
        }
        if let Ok(val) = std::env::var("ROWSTREAM_LOADER_BUFFER_BATCHES") {
            if let Ok(v) = val.parse() {
                self.loader.buffer_batches = v;
            }
        }

        self
    }

    // Validate all configuration values.
    //
    // # Errors
    //
    // Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.decode_batch_rows == 0 {
            return Err(ReaderError::config(
                "storage.decode_batch_rows must be greater than 0",
            ));
        }

        if self.dataset.files.is_empty() {
            return Err(ReaderError::config("dataset.files must not be empty"));
        }
        validate_columns(&self.dataset.features, &self.dataset.label)?;

        if self.loader.batch_size == 0 {
            return Err(ReaderError::config(
                "loader.batch_size must be greater than 0",
            ));
        }
        if self.loader.buffer_batches == 0 {
            return Err(ReaderError::config(
                "loader.buffer_batches must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Checks the feature/label split: at least one feature, no duplicates, and
/// a non-empty label that is not also a feature.
pub(crate) fn validate_columns(features: &[String], label: &str) -> Result<()> {
    if features.is_empty() {
        return Err(ReaderError::config("dataset.features must not be empty"));
    }
    if label.is_empty() {
        return Err(ReaderError::config("dataset.label must not be empty"));
    }

    let mut seen = HashSet::new();
    for feature in features {
        if !seen.insert(feature.as_str()) {
            return Err(ReaderError::config(format!(
                "dataset.features lists '{feature}' more than once"
            )));
        }
    }
    if seen.contains(label) {
        return Err(ReaderError::config(format!(
            "dataset.label '{label}' is also listed as a feature"
        )));
    }
    Ok(())
}

fn split_list(val: &str) -> impl Iterator<Item = &str> {
    val.split(',').map(str::trim).filter(|s| !s.is_empty())
}
