// rowstream-core/src/dataset/reader.rs

use std::path::PathBuf;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use crate::config::validate_columns;
use crate::error::{ReaderError, Result};
use crate::storage::ColumnarBackend;

use super::cursor::MultiFileCursor;

/// Feature and label tables returned by one read.
///
/// `features` has one column per feature name; `labels` has exactly one.
pub type Events = (RecordBatch, RecordBatch);

/// Splits rows read by a [`MultiFileCursor`] into features and labels.
///
/// The cursor projects `features` followed by `label`, so every table it
/// returns has the label as its last column.
#[derive(Debug)]
pub struct BatchedDatasetReader {
    cursor: MultiFileCursor,
    features: Vec<String>,
    label: String,
}

impl BatchedDatasetReader {
    /// Create a reader over `files`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `features` is empty, contains
    /// duplicates, or includes `label`.
    pub fn new(
        backend: Arc<dyn ColumnarBackend>,
        files: Vec<PathBuf>,
        features: Vec<String>,
        label: impl Into<String>,
    ) -> Result<Self> {
        let label = label.into();
        validate_columns(&features, &label)?;

        let mut columns = features.clone();
        columns.push(label.clone());

        Ok(Self {
            cursor: MultiFileCursor::new(backend, files, columns),
            features,
            label,
        })
    }

    /// Read the next `n` events as `(features, labels)`.
    ///
    /// # Errors
    ///
    /// Propagates `EndOfData` (and any storage error) from the cursor
    /// unchanged; nothing is consumed on failure.
    pub fn read_events(&mut self, n: usize) -> Result<Events> {
        let table = self.cursor.read_rows(n)?;
        self.split(&table)
    }

    /// Read the next `n` rows without splitting them.
    pub fn read_table(&mut self, n: usize) -> Result<RecordBatch> {
        self.cursor.read_rows(n)
    }

    /// Split a table laid out as `features..., label` into its two blocks.
    ///
    /// Both results share the input's column buffers; nothing is copied.
    pub fn split(&self, table: &RecordBatch) -> Result<Events> {
        let num_features = self.features.len();
        if table.num_columns() != num_features + 1 {
            return Err(ReaderError::table(format!(
                "expected {} columns, got {}",
                num_features + 1,
                table.num_columns()
            )));
        }

        let feature_indices: Vec<usize> = (0..num_features).collect();
        let features = table
            .project(&feature_indices)
            .map_err(|e| ReaderError::table_with_source("failed to select feature columns", e))?;
        let labels = table
            .project(&[num_features])
            .map_err(|e| ReaderError::table_with_source("failed to select label column", e))?;

        Ok((features, labels))
    }

    /// Feature column names, in output order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Label column name.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cursor(&self) -> &MultiFileCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut MultiFileCursor {
        &mut self.cursor
    }
}
