// rowstream-core/src/storage/traits.rs

//! Storage abstraction traits for columnar row files.
//!
//! A backend hands out per-file handles that know their row count up front
//! and can materialize any `[start, stop)` row range for a set of named
//! columns. The cursor never touches files any other way.

use std::path::Path;

use arrow::record_batch::RecordBatch;

use crate::error::{ReaderError, Result};

/// An open handle onto one columnar file.
///
/// Handles are owned by the cursor and dropped as soon as their row range is
/// fully consumed, which releases the underlying file descriptor.
pub trait ColumnarFile: Send {
    /// Path this handle was opened from.
    fn path(&self) -> &Path;

    /// Total number of rows stored in the file.
    ///
    /// Implementations must answer this from metadata, without decoding rows.
    fn row_count(&self) -> usize;

    /// Names of all columns present in the file, in file order.
    fn column_names(&self) -> Vec<String>;

    /// Reads rows `[start, stop)` of the named columns.
    ///
    /// The returned batch has exactly `stop - start` rows and its columns
    /// appear in the order given by `columns`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range exceeds `row_count()`, a column is
    /// missing, or decoding fails.
    fn read_rows(&mut self, columns: &[String], start: usize, stop: usize) -> Result<RecordBatch>;
}

/// The storage backend trait consumed by the cursor.
///
/// Opening the same unmodified file twice must yield the same row order.
///
/// # Object Safety
///
/// This trait is object-safe and can be used with `Arc<dyn ColumnarBackend>`.
pub trait ColumnarBackend: Send + Sync {
    /// Opens a file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or cannot be decoded.
    fn open(&self, path: &Path) -> Result<Box<dyn ColumnarFile>>;

    /// Name of this backend, for logging.
    fn name(&self) -> &'static str;
}

/// Checks that `start..stop` lies inside a file of `row_count` rows.
pub(crate) fn check_range(path: &Path, start: usize, stop: usize, row_count: usize) -> Result<()> {
    if start > stop || stop > row_count {
        return Err(ReaderError::storage(
            path,
            format!("row range {start}..{stop} outside file of {row_count} rows"),
        ));
    }
    Ok(())
}

/// Reorders `batch` so its columns follow `columns`, dropping the rest.
pub(crate) fn project_by_name(path: &Path, batch: &RecordBatch, columns: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices = columns
        .iter()
        .map(|name| {
            schema.index_of(name).map_err(|_| {
                ReaderError::schema(path, format!("column '{name}' not found"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    batch.project(&indices).map_err(|e| {
        ReaderError::table_with_source("failed to project columns", e)
    })
}
