// rowstream-core/src/runtime.rs

//! Configured entry point.
//!
//! [`Dataset`] owns the configuration and the storage backend and hands out
//! fresh readers and feeds. Cursors never rewind, so each epoch starts from
//! a new reader.
//!
//! # Example
//!
//! ```no_run
//! use rowstream_core::Dataset;
//!
//! let dataset = Dataset::from_config_file("rowstream.toml").unwrap();
//! println!("{} rows", dataset.total_rows().unwrap());
//!
//! for epoch in 0..3 {
//!     for events in dataset.feed().unwrap() {
//!         let (features, labels) = events.unwrap();
//!         // Train on features / labels
//!     }
//!     println!("epoch {epoch} complete");
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::config::ReaderConfig;
use crate::dataset::BatchedDatasetReader;
use crate::error::Result;
use crate::feed::BatchFeed;
use crate::storage::{ColumnarBackend, ParquetBackend};

/// A configured dataset: file list, column split, and backend.
pub struct Dataset {
    config: ReaderConfig,
    backend: Arc<dyn ColumnarBackend>,
}

impl Dataset {
    /// Creates a dataset from a configuration file.
    ///
    /// The configuration file should be in TOML format. Environment variable
    /// overrides are applied after loading the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or is invalid.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = ReaderConfig::from_file(path)?.with_env_overrides();
        Self::from_config(config)
    }

    /// Creates a dataset reading Parquet files.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: ReaderConfig) -> Result<Self> {
        let backend: Arc<dyn ColumnarBackend> = Arc::new(ParquetBackend::new(&config.storage));
        Self::with_backend(config, backend)
    }

    /// Creates a dataset over an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_backend(config: ReaderConfig, backend: Arc<dyn ColumnarBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    /// A reader positioned at the first row of the first file.
    pub fn reader(&self) -> Result<BatchedDatasetReader> {
        BatchedDatasetReader::new(
            self.backend.clone(),
            self.config.dataset.files.clone(),
            self.config.dataset.features.clone(),
            self.config.dataset.label.clone(),
        )
    }

    /// A batch feed sized by the `[loader]` section.
    pub fn feed(&self) -> Result<BatchFeed> {
        BatchFeed::new(
            self.reader()?,
            self.config.loader.batch_size,
            self.config.loader.buffer_batches,
        )
    }

    /// Total rows across all files, read from file metadata.
    pub fn total_rows(&self) -> Result<usize> {
        self.reader()?.cursor_mut().total_rows()
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Returns a reference to the storage backend.
    pub fn backend(&self) -> &Arc<dyn ColumnarBackend> {
        &self.backend
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("backend", &self.backend.name())
            .field("num_files", &self.config.dataset.files.len())
            .field("features", &self.config.dataset.features)
            .field("label", &self.config.dataset.label)
            .finish()
    }
}
