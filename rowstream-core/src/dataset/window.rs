// rowstream-core/src/dataset/window.rs

use arrow::record_batch::RecordBatch;

use crate::error::{ReaderError, Result};

/// A cached table and the inclusive batch-index range it can serve.
#[derive(Debug, Clone)]
struct Window {
    table: RecordBatch,
    batch_size: usize,
    min_batch: i64,
    max_batch: i64,
}

/// Caches the most recently read contiguous table so that batch lookups
/// inside it are answered without touching storage.
///
/// Batch `min_batch_index` starts at row 0 of the cached table; each later
/// index starts `batch_size` rows further on. The last batch may be short.
#[derive(Debug, Clone, Default)]
pub struct WindowedBatchCache {
    window: Option<Window>,
}

impl WindowedBatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the window with `table`, starting at `min_batch_index`.
    ///
    /// An empty table yields a window whose maximum index is below its
    /// minimum, so it serves nothing.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, leaving the previous window in place,
    /// if `batch_size` is zero or `min_batch_index` is negative.
    pub fn set_window(&mut self, table: RecordBatch, min_batch_index: i64, batch_size: usize) -> Result<()> {
        if batch_size == 0 {
            return Err(ReaderError::config("batch_size must be greater than 0"));
        }
        if min_batch_index < 0 {
            return Err(ReaderError::config(format!(
                "min_batch_index must not be negative, got {min_batch_index}"
            )));
        }

        let batches = i64::try_from(table.num_rows().div_ceil(batch_size))
            .map_err(|_| ReaderError::config("window holds too many batches"))?;
        let max_batch = min_batch_index
            .checked_add(batches - 1)
            .ok_or_else(|| ReaderError::config("batch index overflow"))?;

        self.window = Some(Window {
            table,
            batch_size,
            min_batch: min_batch_index,
            max_batch,
        });
        Ok(())
    }

    /// Whether `batch_index` can be served from the cached table.
    pub fn contains(&self, batch_index: i64) -> bool {
        match &self.window {
            Some(w) => {
                w.table.num_rows() > 0
                    && batch_index >= 0
                    && (w.min_batch..=w.max_batch).contains(&batch_index)
            }
            None => false,
        }
    }

    /// Rows of batch `batch_index`.
    ///
    /// The result is a zero-copy slice of the cached table.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` unless [`contains`](Self::contains) holds.
    pub fn get_batch(&self, batch_index: i64) -> Result<RecordBatch> {
        let window = match &self.window {
            Some(w) if self.contains(batch_index) => w,
            _ => {
                return Err(ReaderError::out_of_range(
                    batch_index,
                    self.min_batch_index(),
                    self.max_batch_index(),
                ))
            }
        };

        // contains() guarantees batch_index >= min_batch
        let offset = (batch_index - window.min_batch) as usize;
        let row_start = offset * window.batch_size;
        let row_stop = (row_start + window.batch_size).min(window.table.num_rows());
        Ok(window.table.slice(row_start, row_stop - row_start))
    }

    /// Drop the cached table.
    pub fn clear(&mut self) {
        self.window = None;
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_none()
    }

    pub fn min_batch_index(&self) -> Option<i64> {
        self.window.as_ref().map(|w| w.min_batch)
    }

    pub fn max_batch_index(&self) -> Option<i64> {
        self.window.as_ref().map(|w| w.max_batch)
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.window.as_ref().map(|w| w.batch_size)
    }

    pub fn table(&self) -> Option<&RecordBatch> {
        self.window.as_ref().map(|w| &w.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{column_values, numbered_table};

    fn rows(first: usize, count: usize) -> Vec<f64> {
        (first..first + count).map(|v| v as f64).collect()
    }

    #[test]
    fn test_empty_cache_contains_nothing() {
        let cache = WindowedBatchCache::new();
        assert!(cache.is_empty());
        for i in [-5, -1, 0, 1, 100] {
            assert!(!cache.contains(i));
        }
        assert!(cache.min_batch_index().is_none());
        assert!(cache.max_batch_index().is_none());
        assert!(matches!(
            cache.get_batch(0),
            Err(ReaderError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_window_bounds() {
        let mut cache = WindowedBatchCache::new();
        cache.set_window(numbered_table(&["x"], 0, 20), 3, 10).unwrap();

        assert_eq!(cache.min_batch_index(), Some(3));
        assert_eq!(cache.max_batch_index(), Some(4));
        assert!(cache.contains(3));
        assert!(cache.contains(4));
        assert!(!cache.contains(2));
        assert!(!cache.contains(5));
        assert!(!cache.contains(-3));

        let batch = cache.get_batch(4).unwrap();
        assert_eq!(column_values(&batch, 0), rows(10, 10));

        let batch = cache.get_batch(3).unwrap();
        assert_eq!(column_values(&batch, 0), rows(0, 10));
    }

    #[test]
    fn test_short_final_batch() {
        let mut cache = WindowedBatchCache::new();
        cache.set_window(numbered_table(&["x"], 0, 25), 0, 10).unwrap();

        assert_eq!(cache.max_batch_index(), Some(2));
        let batch = cache.get_batch(2).unwrap();
        assert_eq!(column_values(&batch, 0), rows(20, 5));
    }

    #[test]
    fn test_get_batch_outside_window() {
        let mut cache = WindowedBatchCache::new();
        cache.set_window(numbered_table(&["x"], 0, 20), 3, 10).unwrap();

        match cache.get_batch(5) {
            Err(ReaderError::OutOfRange {
                batch_index,
                min,
                max,
            }) => {
                assert_eq!(batch_index, 5);
                assert_eq!(min, Some(3));
                assert_eq!(max, Some(4));
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_table_serves_nothing() {
        let mut cache = WindowedBatchCache::new();
        cache.set_window(numbered_table(&["x"], 0, 0), 2, 10).unwrap();

        assert!(!cache.is_empty());
        assert!(cache.max_batch_index().unwrap() < cache.min_batch_index().unwrap());
        assert!(!cache.contains(2));
        assert!(cache.get_batch(2).is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut cache = WindowedBatchCache::new();
        cache.set_window(numbered_table(&["x"], 0, 20), 0, 10).unwrap();

        let err = cache
            .set_window(numbered_table(&["x"], 0, 5), 7, 0)
            .unwrap_err();
        assert!(matches!(err, ReaderError::Config { .. }));

        // Previous window survives.
        assert_eq!(cache.min_batch_index(), Some(0));
        assert!(cache.contains(1));
    }

    #[test]
    fn test_negative_min_batch_rejected() {
        let mut cache = WindowedBatchCache::new();
        let result = cache.set_window(numbered_table(&["x"], 0, 5), -1, 5);
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_window_replaces_wholesale() {
        let mut cache = WindowedBatchCache::new();
        cache.set_window(numbered_table(&["x"], 0, 20), 0, 10).unwrap();
        cache.set_window(numbered_table(&["x"], 100, 10), 2, 10).unwrap();

        assert!(!cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert!(!cache.contains(3));
        assert_eq!(column_values(&cache.get_batch(2).unwrap(), 0), rows(100, 10));
    }

    #[test]
    fn test_clear_from_any_state() {
        let mut cache = WindowedBatchCache::new();
        cache.clear();
        assert!(cache.is_empty());

        cache.set_window(numbered_table(&["x"], 0, 20), 3, 10).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(3));
        assert!(cache.table().is_none());
        assert!(cache.batch_size().is_none());
    }

    #[test]
    fn test_contains_is_pure() {
        let mut cache = WindowedBatchCache::new();
        cache.set_window(numbered_table(&["x"], 0, 20), 3, 10).unwrap();
        for _ in 0..3 {
            assert!(cache.contains(4));
            assert!(!cache.contains(5));
        }
        assert_eq!(cache.table().unwrap().num_rows(), 20);
    }
}
