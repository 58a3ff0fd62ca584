// rowstream-core/src/feed.rs

//! Batch-indexed access on top of the sequential reader.
//!
//! A training loop asks for batch `i`. If `i` lies in the cached window the
//! rows come straight from memory; if `i` is the next unread batch the feed
//! reads `batch_size * buffer_batches` rows in one go and refills the window.

use arrow::record_batch::RecordBatch;

use crate::dataset::{BatchedDatasetReader, Events, WindowedBatchCache};
use crate::error::{ReaderError, Result};

/// Serves fixed-size batches by index, refilling a window of several
/// batches at a time.
#[derive(Debug)]
pub struct BatchFeed {
    reader: BatchedDatasetReader,
    cache: WindowedBatchCache,
    batch_size: usize,
    buffer_batches: usize,
    /// First batch index not yet pulled from storage.
    next_unread: i64,
    /// Next index handed out by `next_batch`.
    next_index: i64,
}

impl BatchFeed {
    /// Create a feed serving `batch_size`-row batches, reading
    /// `buffer_batches` batches per storage access.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either size is zero.
    pub fn new(reader: BatchedDatasetReader, batch_size: usize, buffer_batches: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ReaderError::config("batch_size must be greater than 0"));
        }
        if buffer_batches == 0 {
            return Err(ReaderError::config("buffer_batches must be greater than 0"));
        }
        if batch_size.checked_mul(buffer_batches).is_none() {
            return Err(ReaderError::config("batch_size * buffer_batches overflows"));
        }

        Ok(Self {
            reader,
            cache: WindowedBatchCache::new(),
            batch_size,
            buffer_batches,
            next_unread: 0,
            next_index: 0,
        })
    }

    /// Features and labels of batch `batch_index`.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if the batch was already evicted (the reader cannot
    ///   rewind) or lies beyond the next unread batch.
    /// - `EndOfData` if no rows are left for the next unread batch.
    pub fn batch(&mut self, batch_index: i64) -> Result<Events> {
        let rows = self.batch_rows(batch_index)?;
        self.reader.split(&rows)
    }

    /// Unsplit rows of batch `batch_index`.
    pub fn batch_rows(&mut self, batch_index: i64) -> Result<RecordBatch> {
        if !self.cache.contains(batch_index) {
            if batch_index != self.next_unread {
                return Err(ReaderError::out_of_range(
                    batch_index,
                    self.cache.min_batch_index(),
                    self.cache.max_batch_index(),
                ));
            }
            self.refill()?;
        }
        self.cache.get_batch(batch_index)
    }

    /// Pull the next chunk from storage into the window.
    ///
    /// Near the end of the data the chunk shrinks to whatever remains, so
    /// the final batch of an epoch may hold fewer than `batch_size` rows.
    fn refill(&mut self) -> Result<()> {
        let wanted = self.batch_size * self.buffer_batches;
        let table = match self.reader.read_table(wanted) {
            Ok(table) => table,
            Err(ReaderError::EndOfData { remaining, .. }) if remaining > 0 => {
                self.reader.read_table(remaining)?
            }
            Err(e) => return Err(e),
        };

        let batches = i64::try_from(table.num_rows().div_ceil(self.batch_size))
            .map_err(|_| ReaderError::config("window holds too many batches"))?;
        tracing::debug!(
            first_batch = self.next_unread,
            batches,
            rows = table.num_rows(),
            "refilled batch window"
        );

        let next_unread = self
            .next_unread
            .checked_add(batches)
            .ok_or_else(|| ReaderError::config("batch index overflow"))?;
        self.cache.set_window(table, self.next_unread, self.batch_size)?;
        self.next_unread = next_unread;
        Ok(())
    }

    /// Next batch in sequence, or `None` once the data is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Events>> {
        match self.batch(self.next_index) {
            Ok(events) => {
                self.next_index += 1;
                Ok(Some(events))
            }
            Err(e) if e.is_end_of_data() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Total number of batches in one pass over the data, counting a short
    /// final batch.
    pub fn num_batches(&mut self) -> Result<usize> {
        let total = self.reader.cursor_mut().total_rows()?;
        Ok(total.div_ceil(self.batch_size))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn buffer_batches(&self) -> usize {
        self.buffer_batches
    }

    pub fn reader(&self) -> &BatchedDatasetReader {
        &self.reader
    }

    pub fn cache(&self) -> &WindowedBatchCache {
        &self.cache
    }
}

impl Iterator for BatchFeed {
    type Item = Result<Events>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(Some(events)) => Some(Ok(events)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use crate::test_util::{column_values, numbered_table};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn reader(counts: &[usize]) -> BatchedDatasetReader {
        let backend = Arc::new(MemoryBackend::new());
        let mut files = Vec::new();
        let mut first = 0;
        for (i, &rows) in counts.iter().enumerate() {
            let path = PathBuf::from(format!("file_{i}"));
            backend.insert(path.clone(), numbered_table(&["a", "b", "w"], first, rows));
            files.push(path);
            first += rows;
        }
        let features = vec!["a".to_string(), "b".to_string()];
        BatchedDatasetReader::new(backend, files, features, "w").unwrap()
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(BatchFeed::new(reader(&[10]), 0, 2).is_err());
        assert!(BatchFeed::new(reader(&[10]), 2, 0).is_err());
    }

    #[test]
    fn test_batches_served_from_window() {
        let mut feed = BatchFeed::new(reader(&[10, 10]), 4, 3).unwrap();

        let (x, y) = feed.batch(0).unwrap();
        assert_eq!(x.num_rows(), 4);
        assert_eq!(y.num_columns(), 1);
        assert_eq!(feed.cache().min_batch_index(), Some(0));
        assert_eq!(feed.cache().max_batch_index(), Some(2));
        // 12 rows pulled: all of file 0 and two rows of file 1.
        assert_eq!(feed.reader().cursor().position().file_index, 1);
        assert_eq!(feed.reader().cursor().position().row_offset, 2);

        // Served again without touching storage.
        let (x, _) = feed.batch(2).unwrap();
        assert_eq!(column_values(&x, 0), vec![8.0, 9.0, 10.0, 11.0]);
        let (x, _) = feed.batch(1).unwrap();
        assert_eq!(column_values(&x, 0), vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(feed.reader().cursor().position().row_offset, 2);
    }

    #[test]
    fn test_refill_on_next_unread_batch() {
        let mut feed = BatchFeed::new(reader(&[10, 10]), 4, 3).unwrap();
        feed.batch(0).unwrap();

        let (x, _) = feed.batch(3).unwrap();
        assert_eq!(column_values(&x, 1), vec![12.0, 13.0, 14.0, 15.0]);
        assert_eq!(feed.cache().min_batch_index(), Some(3));

        // Remaining 8 rows fit in two more batches: 3 and 4.
        assert_eq!(feed.cache().max_batch_index(), Some(4));
        assert!(feed.reader().cursor().is_exhausted());
    }

    #[test]
    fn test_evicted_batch_is_out_of_range() {
        let mut feed = BatchFeed::new(reader(&[10, 10]), 4, 2).unwrap();
        feed.batch(0).unwrap();
        feed.batch(2).unwrap();

        let err = feed.batch(0).unwrap_err();
        assert!(matches!(err, ReaderError::OutOfRange { batch_index: 0, .. }));
    }

    #[test]
    fn test_skipping_ahead_is_out_of_range() {
        let mut feed = BatchFeed::new(reader(&[10, 10]), 4, 2).unwrap();
        assert!(matches!(
            feed.batch(3),
            Err(ReaderError::OutOfRange { .. })
        ));
        assert_eq!(feed.reader().cursor().position().row_offset, 0);
        assert!(matches!(
            feed.batch(-1),
            Err(ReaderError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_short_final_batch() {
        let mut feed = BatchFeed::new(reader(&[7, 6]), 5, 2).unwrap();
        assert_eq!(feed.num_batches().unwrap(), 3);

        let sizes: Vec<usize> = feed
            .by_ref()
            .map(|events| events.unwrap().0.num_rows())
            .collect();
        assert_eq!(sizes, vec![5, 5, 3]);

        assert!(feed.next().is_none());
        assert!(feed.batch(3).unwrap_err().is_end_of_data());
    }

    #[test]
    fn test_iteration_covers_every_row_once() {
        let mut feed = BatchFeed::new(reader(&[10, 10]), 3, 4).unwrap();

        let mut seen = Vec::new();
        for events in feed.by_ref() {
            let (_, labels) = events.unwrap();
            seen.extend(column_values(&labels, 0));
        }

        let expected: Vec<f64> = (0..20).map(|v| v as f64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_next_unread_tracks_short_window() {
        let mut feed = BatchFeed::new(reader(&[7, 6]), 5, 4).unwrap();
        let (x, _) = feed.batch(0).unwrap();
        assert_eq!(x.num_rows(), 5);

        // 13 rows in one short refill: batches 0..=2, the last holding 3 rows.
        assert_eq!(feed.cache().max_batch_index(), Some(2));
        assert_eq!(feed.batch(2).unwrap().1.num_rows(), 3);
        assert!(feed.batch(3).unwrap_err().is_end_of_data());
    }

    #[test]
    fn test_empty_dataset() {
        let mut feed = BatchFeed::new(reader(&[]), 4, 2).unwrap();
        assert_eq!(feed.num_batches().unwrap(), 0);
        assert!(feed.next_batch().unwrap().is_none());
    }
}
