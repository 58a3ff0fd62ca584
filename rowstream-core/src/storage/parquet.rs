// rowstream-core/src/storage/parquet.rs

//! Local Parquet backend.
//!
//! Row counts come from the file footer, so probing a file never decodes
//! column data. Range reads push the row offset, limit and column projection
//! down into the Parquet decoder, which skips whole pages outside the range.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::compute::concat_batches;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReaderBuilder,
};
use parquet::arrow::ProjectionMask;

use super::traits::{check_range, project_by_name, ColumnarBackend, ColumnarFile};
use crate::config::StorageConfig;
use crate::error::{ReaderError, Result};

/// Parquet files on the local filesystem.
pub struct ParquetBackend {
    /// Base path that relative file paths are resolved against.
    base_path: PathBuf,
    /// Rows decoded per internal record batch.
    decode_batch_rows: usize,
}

impl ParquetBackend {
    /// Creates a new `ParquetBackend` from configuration.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_path: config.base_path.clone(),
            decode_batch_rows: config.decode_batch_rows,
        }
    }

    /// Resolves a path relative to the base path.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

impl ColumnarBackend for ParquetBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn ColumnarFile>> {
        let full_path = self.resolve_path(path);
        let file = File::open(&full_path)
            .map_err(|e| ReaderError::storage_with_source(&full_path, "failed to open file", e))?;

        let metadata = ArrowReaderMetadata::load(&file, ArrowReaderOptions::new()).map_err(|e| {
            ReaderError::storage_with_source(&full_path, "not a valid Parquet file", e)
        })?;

        let num_rows = metadata.metadata().file_metadata().num_rows();
        let row_count = usize::try_from(num_rows).map_err(|_| {
            ReaderError::storage(&full_path, format!("invalid row count in footer: {num_rows}"))
        })?;

        tracing::debug!(path = %full_path.display(), rows = row_count, "opened parquet file");

        Ok(Box::new(ParquetFile {
            path: full_path,
            file,
            metadata,
            row_count,
            decode_batch_rows: self.decode_batch_rows,
        }))
    }

    fn name(&self) -> &'static str {
        "parquet"
    }
}

/// An open Parquet file with its parsed footer.
struct ParquetFile {
    path: PathBuf,
    file: File,
    metadata: ArrowReaderMetadata,
    row_count: usize,
    decode_batch_rows: usize,
}

impl ParquetFile {
    fn root_indices(&self, columns: &[String]) -> Result<Vec<usize>> {
        let schema = self.metadata.schema();
        columns
            .iter()
            .map(|name| {
                schema.index_of(name).map_err(|_| {
                    ReaderError::schema(&self.path, format!("column '{name}' not found"))
                })
            })
            .collect()
    }
}

impl ColumnarFile for ParquetFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_names(&self) -> Vec<String> {
        self.metadata
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    fn read_rows(&mut self, columns: &[String], start: usize, stop: usize) -> Result<RecordBatch> {
        check_range(&self.path, start, stop, self.row_count)?;
        let indices = self.root_indices(columns)?;

        let file = self.file.try_clone().map_err(|e| {
            ReaderError::storage_with_source(&self.path, "failed to duplicate file handle", e)
        })?;
        let builder = ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone());
        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

        let reader = builder
            .with_projection(mask)
            .with_offset(start)
            .with_limit(stop - start)
            .with_batch_size(self.decode_batch_rows)
            .build()
            .map_err(|e| ReaderError::storage_with_source(&self.path, "failed to build reader", e))?;

        let schema = reader.schema();
        let batches = reader
            .collect::<std::result::Result<Vec<_>, ArrowError>>()
            .map_err(|e| ReaderError::storage_with_source(&self.path, "failed to decode rows", e))?;

        let table = concat_batches(&schema, &batches)
            .map_err(|e| ReaderError::table_with_source("failed to concatenate decoded rows", e))?;

        if table.num_rows() != stop - start {
            return Err(ReaderError::storage(
                &self.path,
                format!(
                    "decoded {} rows for range {start}..{stop}",
                    table.num_rows()
                ),
            ));
        }

        // The decoder yields columns in file order; restore the requested order.
        project_by_name(&self.path, &table, columns)
    }
}
