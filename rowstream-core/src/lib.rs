// rowstream-core/src/lib.rs

//! Batched row reading - Core Library
//!
//! This crate streams fixed-size batches of tabular rows out of an ordered
//! collection of columnar files, splitting each batch into feature and label
//! tables, and caches a window of recent batches so that repeated lookups do
//! not re-read storage.

pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use storage::{ColumnarBackend, ColumnarFile, MemoryBackend, ParquetBackend};

pub mod dataset;
pub use dataset::{
    BatchedDatasetReader, CursorPosition, Events, MultiFileCursor, WindowedBatchCache,
};

pub mod feed;
pub use feed::BatchFeed;

pub mod runtime;
pub use runtime::Dataset;

#[cfg(test)]
mod test_util;
