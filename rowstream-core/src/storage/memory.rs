// rowstream-core/src/storage/memory.rs

//! In-memory columnar backend.
//!
//! Tables are registered under a path and served back through the same
//! handle contract as on-disk files. Useful for tests and for embedding
//! tables that were produced elsewhere in the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use arrow::record_batch::RecordBatch;

use super::traits::{check_range, project_by_name, ColumnarBackend, ColumnarFile};
use crate::error::{ReaderError, Result};

/// Backend serving `RecordBatch` tables keyed by path.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<PathBuf, RecordBatch>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under `path`, replacing any previous table.
    pub fn insert(&self, path: impl Into<PathBuf>, table: RecordBatch) {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.into(), table);
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ColumnarBackend for MemoryBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn ColumnarFile>> {
        let tables = self
            .tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let table = tables
            .get(path)
            .ok_or_else(|| ReaderError::storage(path, "not found"))?
            .clone();

        Ok(Box::new(MemoryFile {
            path: path.to_path_buf(),
            table,
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Handle onto a registered table. Cloning a `RecordBatch` only bumps
/// reference counts, so opening never copies column data.
struct MemoryFile {
    path: PathBuf,
    table: RecordBatch,
}

impl ColumnarFile for MemoryFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn row_count(&self) -> usize {
        self.table.num_rows()
    }

    fn column_names(&self) -> Vec<String> {
        self.table
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    fn read_rows(&mut self, columns: &[String], start: usize, stop: usize) -> Result<RecordBatch> {
        check_range(&self.path, start, stop, self.row_count())?;
        let projected = project_by_name(&self.path, &self.table, columns)?;
        Ok(projected.slice(start, stop - start))
    }
}
