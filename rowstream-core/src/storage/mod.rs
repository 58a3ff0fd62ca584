// rowstream-core/src/storage/mod.rs

//! Storage abstraction for columnar row files.
//!
//! The cursor reads rows through the [`ColumnarBackend`] trait, so the same
//! reading logic works over Parquet files on disk or tables held in memory.
//!
//! # Example
//!
//! ```no_run
//! use rowstream_core::config::StorageConfig;
//! use rowstream_core::storage::{ColumnarBackend, ParquetBackend};
//! use std::path::Path;
//!
//! let backend = ParquetBackend::new(&StorageConfig::default());
//! let mut file = backend.open(Path::new("events_0.parquet")).unwrap();
//!
//! // Footer metadata only; no rows are decoded here.
//! println!("{} rows", file.row_count());
//!
//! let columns = vec!["pt".to_string(), "label".to_string()];
//! let rows = file.read_rows(&columns, 0, 128).unwrap();
//! assert_eq!(rows.num_rows(), 128);
//! ```

mod memory;
mod parquet;
mod traits;

pub use self::memory::MemoryBackend;
pub use self::parquet::ParquetBackend;
pub use traits::{ColumnarBackend, ColumnarFile};
