// rowstream-core/src/dataset/cursor.rs

use std::path::PathBuf;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::{ReaderError, Result};
use crate::storage::{ColumnarBackend, ColumnarFile};

/// Read position within the ordered file list.
///
/// `file_index == files.len()` means every file has been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub file_index: usize,
    pub row_offset: usize,
}

/// A forward-only cursor presenting many files as one row stream.
///
/// Reads are all-or-nothing: rows are gathered into a scratch list and the
/// position is committed only once all `n` rows are in hand. A short or
/// failed read leaves the cursor untouched. When the row counts of the
/// remaining files are already known a short read is rejected before any
/// rows are decoded.
///
/// At most two file handles are open at once: the handle for the file under
/// the cursor, plus one lookahead handle for a later file. A lookahead opened
/// to learn a row count is the same handle its rows are later read from, so
/// each file is opened once per pass. Handles are dropped as soon as their
/// rows are consumed.
pub struct MultiFileCursor {
    backend: Arc<dyn ColumnarBackend>,
    files: Vec<PathBuf>,
    columns: Vec<String>,
    position: CursorPosition,
    /// Row counts learned so far, indexed like `files`.
    row_counts: Vec<Option<usize>>,
    /// Open handle for `files[position.file_index]`, if any.
    current: Option<Box<dyn ColumnarFile>>,
    /// Open handle for a file after the current one, with its index.
    lookahead: Option<(usize, Box<dyn ColumnarFile>)>,
    schema: Option<SchemaRef>,
}

impl MultiFileCursor {
    /// Create a cursor over `files`, projecting `columns` from each.
    ///
    /// No file is opened until rows (or row counts) are first needed.
    pub fn new(backend: Arc<dyn ColumnarBackend>, files: Vec<PathBuf>, columns: Vec<String>) -> Self {
        let row_counts = vec![None; files.len()];
        Self {
            backend,
            files,
            columns,
            position: CursorPosition::default(),
            row_counts,
            current: None,
            lookahead: None,
            schema: None,
        }
    }

    /// Read the next `n` rows across file boundaries.
    ///
    /// Returns a table of exactly `n` rows whose columns follow the cursor's
    /// column list. `n == 0` returns an empty table and does not move. A read
    /// that ends exactly on a file boundary steps over any empty files that
    /// follow, so consuming the last row leaves the cursor exhausted.
    ///
    /// # Errors
    ///
    /// Returns `EndOfData` if fewer than `n` rows remain; storage and schema
    /// errors propagate from the backend. In every error case the position
    /// is unchanged.
    pub fn read_rows(&mut self, n: usize) -> Result<RecordBatch> {
        if n == 0 {
            return self.empty_table();
        }
        if let Some(remaining) = self.known_remaining() {
            if remaining < n {
                return Err(ReaderError::end_of_data(n, remaining));
            }
        }

        let mut pieces = Vec::new();
        let mut needed = n;
        let mut file_index = self.position.file_index;
        let mut row_offset = self.position.row_offset;

        while needed > 0 && file_index < self.files.len() {
            let (count, piece) = if file_index == self.position.file_index {
                self.read_current(row_offset, needed)?
            } else {
                self.read_lookahead(file_index, needed)?
            };
            let take = piece.as_ref().map_or(0, RecordBatch::num_rows);
            pieces.extend(piece);
            needed -= take;

            if row_offset + take >= count {
                file_index += 1;
                row_offset = 0;
            } else {
                row_offset += take;
            }
        }

        if needed > 0 {
            return Err(ReaderError::end_of_data(n, n - needed));
        }

        // Step over empty files after a boundary so the final read lands on
        // the exhausted position.
        while row_offset == 0 && file_index < self.files.len() {
            match self.probe_ahead(file_index) {
                Ok(0) => file_index += 1,
                Ok(_) => break,
                Err(e) => {
                    // Surfaced again by the next read.
                    tracing::debug!(error = %e, file_index, "probe after boundary failed");
                    break;
                }
            }
        }

        let touched = pieces.len();
        let table = match touched {
            1 => pieces.swap_remove(0),
            _ => {
                let schema = pieces[0].schema();
                concat_batches(&schema, &pieces).map_err(|e| {
                    ReaderError::table_with_source("failed to join rows across files", e)
                })?
            }
        };

        let next = CursorPosition { file_index, row_offset };
        self.commit(next);
        tracing::trace!(
            rows = n,
            files = touched,
            file_index = next.file_index,
            row_offset = next.row_offset,
            "read rows"
        );
        self.schema.get_or_insert_with(|| table.schema());

        Ok(table)
    }

    /// Move to `next`, promoting the lookahead if it holds the new current
    /// file and releasing every consumed handle.
    fn commit(&mut self, next: CursorPosition) {
        if next.file_index != self.position.file_index {
            if let Some(handle) = self.current.take() {
                tracing::debug!(path = %handle.path().display(), "released consumed file");
            }
            if matches!(&self.lookahead, Some((index, _)) if *index == next.file_index) {
                self.current = self.lookahead.take().map(|(_, handle)| handle);
            }
        }
        if matches!(&self.lookahead, Some((index, _)) if *index <= next.file_index) {
            if let Some((_, handle)) = self.lookahead.take() {
                tracing::debug!(path = %handle.path().display(), "released consumed file");
            }
        }
        self.position = next;
    }

    /// Rows left after the cursor, if every remaining row count is known.
    fn known_remaining(&self) -> Option<usize> {
        let mut remaining = 0;
        for count in &self.row_counts[self.position.file_index..] {
            remaining += (*count)?;
        }
        Some(remaining.saturating_sub(self.position.row_offset))
    }

    /// Read up to `needed` rows of the current file starting at `start`.
    fn read_current(&mut self, start: usize, needed: usize) -> Result<(usize, Option<RecordBatch>)> {
        let index = self.position.file_index;
        if self.current.is_none() {
            self.current = Some(self.open_file(index)?);
        }
        let handle = self.current.as_mut().ok_or_else(|| {
            ReaderError::storage(&self.files[index], "file handle unavailable")
        })?;
        read_from(&mut **handle, &self.columns, start, needed)
    }

    /// Read up to `needed` rows from the start of a later file, keeping its
    /// handle as the lookahead.
    fn read_lookahead(&mut self, index: usize, needed: usize) -> Result<(usize, Option<RecordBatch>)> {
        let mut handle = self.take_lookahead(index)?;
        let result = read_from(&mut *handle, &self.columns, 0, needed);
        self.lookahead = Some((index, handle));
        result
    }

    /// Row count of a later file, keeping any handle opened for it.
    fn probe_ahead(&mut self, index: usize) -> Result<usize> {
        if let Some(count) = self.row_counts[index] {
            return Ok(count);
        }
        let handle = self.take_lookahead(index)?;
        let count = handle.row_count();
        self.lookahead = Some((index, handle));
        Ok(count)
    }

    /// The lookahead handle for `index`, opening it if the held one is for
    /// another file. The held handle is dropped before anything is opened.
    fn take_lookahead(&mut self, index: usize) -> Result<Box<dyn ColumnarFile>> {
        match self.lookahead.take() {
            Some((held, handle)) if held == index => Ok(handle),
            stale => {
                drop(stale);
                self.open_file(index)
            }
        }
    }

    /// Row count of `files[index]`, probing the file on first use.
    fn row_count(&mut self, index: usize) -> Result<usize> {
        if let Some(count) = self.row_counts[index] {
            return Ok(count);
        }

        if index > self.position.file_index {
            return self.probe_ahead(index);
        }

        let handle = self.open_file(index)?;
        let count = handle.row_count();
        if index == self.position.file_index {
            self.current = Some(handle);
        } else {
            tracing::debug!(path = %handle.path().display(), rows = count, "probed file");
        }
        Ok(count)
    }

    /// Opens `files[index]`, checks column presence, and records its row count.
    fn open_file(&mut self, index: usize) -> Result<Box<dyn ColumnarFile>> {
        let path = &self.files[index];
        let handle = self.backend.open(path)?;

        let available = handle.column_names();
        if let Some(missing) = self.columns.iter().find(|c| !available.contains(c)) {
            return Err(ReaderError::schema(
                path,
                format!("column '{missing}' not found (available: {available:?})"),
            ));
        }

        tracing::debug!(
            backend = self.backend.name(),
            path = %path.display(),
            rows = handle.row_count(),
            "opened file"
        );
        self.row_counts[index] = Some(handle.row_count());
        Ok(handle)
    }

    fn empty_table(&mut self) -> Result<RecordBatch> {
        if let Some(schema) = &self.schema {
            return Ok(RecordBatch::new_empty(schema.clone()));
        }

        if self.files.is_empty() {
            // Nothing to learn column types from.
            let fields: Vec<Field> = self
                .columns
                .iter()
                .map(|name| Field::new(name, DataType::Null, true))
                .collect();
            return Ok(RecordBatch::new_empty(Arc::new(Schema::new(fields))));
        }

        let table = if self.is_exhausted() {
            let mut handle = self.open_file(self.files.len() - 1)?;
            let offset = handle.row_count();
            handle.read_rows(&self.columns, offset, offset)?
        } else {
            let index = self.position.file_index;
            let offset = self.position.row_offset;
            if self.current.is_none() {
                self.current = Some(self.open_file(index)?);
            }
            let handle = self.current.as_mut().ok_or_else(|| {
                ReaderError::storage(&self.files[index], "file handle unavailable")
            })?;
            handle.read_rows(&self.columns, offset, offset)?
        };
        self.schema = Some(table.schema());
        Ok(table)
    }

    /// Rows not yet consumed, across all files.
    ///
    /// Probes any file whose row count is still unknown.
    pub fn remaining_rows(&mut self) -> Result<usize> {
        let mut remaining = 0;
        for index in self.position.file_index..self.files.len() {
            remaining += self.row_count(index)?;
        }
        Ok(remaining.saturating_sub(self.position.row_offset))
    }

    /// Rows across all files, consumed or not.
    pub fn total_rows(&mut self) -> Result<usize> {
        let mut total = 0;
        for index in 0..self.files.len() {
            total += self.row_count(index)?;
        }
        Ok(total)
    }

    /// Current read position.
    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// True once the cursor has moved past the last file.
    pub fn is_exhausted(&self) -> bool {
        self.position.file_index >= self.files.len()
    }

    /// The backing files, in read order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Columns projected from every file, in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of file handles currently held open.
    pub fn open_handles(&self) -> usize {
        usize::from(self.current.is_some()) + usize::from(self.lookahead.is_some())
    }
}

/// Reads up to `needed` rows of `handle` from `start`, returning the file's
/// row count alongside the rows (`None` when nothing is left to take).
fn read_from(
    handle: &mut dyn ColumnarFile,
    columns: &[String],
    start: usize,
    needed: usize,
) -> Result<(usize, Option<RecordBatch>)> {
    let count = handle.row_count();
    let take = count.saturating_sub(start).min(needed);
    if take == 0 {
        return Ok((count, None));
    }
    let piece = handle.read_rows(columns, start, start + take)?;
    Ok((count, Some(piece)))
}

impl std::fmt::Debug for MultiFileCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiFileCursor")
            .field("backend", &self.backend.name())
            .field("num_files", &self.files.len())
            .field("columns", &self.columns)
            .field("position", &self.position)
            .finish()
    }
}
