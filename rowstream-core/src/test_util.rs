// rowstream-core/src/test_util.rs

//! Fixtures shared by the unit tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;

/// Builds a table with `rows` rows where every column holds the global row
/// number (`first..first + rows`) as `f64`.
pub fn numbered_table(columns: &[&str], first: usize, rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let values: Vec<f64> = (first..first + rows).map(|v| v as f64).collect();
    let arrays = columns
        .iter()
        .map(|_| Arc::new(Float64Array::from(values.clone())) as ArrayRef)
        .collect();
    RecordBatch::try_new(schema, arrays).unwrap()
}

/// Writes a `numbered_table` to `dir/name` as Parquet.
pub fn write_parquet(dir: &Path, name: &str, columns: &[&str], first: usize, rows: usize) {
    let table = numbered_table(columns, first, rows);
    let file = File::create(dir.join(name)).unwrap();
    let mut writer = ArrowWriter::try_new(file, table.schema(), None).unwrap();
    writer.write(&table).unwrap();
    writer.close().unwrap();
}

/// Values of column `index` as `f64`.
pub fn column_values(batch: &RecordBatch, index: usize) -> Vec<f64> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap()
        .values()
        .to_vec()
}
