// rowstream-core/src/dataset/mod.rs

//! Sequential batched reading over many columnar files.
//!
//! [`MultiFileCursor`] turns an ordered list of files into one forward-only
//! row stream with all-or-nothing reads. [`BatchedDatasetReader`] splits
//! each read into feature and label tables. [`WindowedBatchCache`] keeps the
//! last read table around and answers batch-index lookups from it.
//!
//! # Example
//!
//! ```ignore
//! use rowstream_core::dataset::BatchedDatasetReader;
//!
//! let mut reader = BatchedDatasetReader::new(backend, files, features, "label")?;
//! loop {
//!     match reader.read_events(128) {
//!         Ok((features, labels)) => train_step(features, labels),
//!         Err(e) if e.is_end_of_data() => break, // epoch complete
//!         Err(e) => return Err(e),
//!     }
//! }
//! ```

mod cursor;
mod reader;
mod window;

pub use cursor::{CursorPosition, MultiFileCursor};
pub use reader::{BatchedDatasetReader, Events};
pub use window::WindowedBatchCache;
