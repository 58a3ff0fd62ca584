// rowstream-core/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {

    #[error("End of data: requested {requested} rows but only {remaining} remain")]
    EndOfData {
        requested: usize,
        remaining: usize,
    },

    #[error("Batch index {batch_index} not in current window ({})", describe_window(.min, .max))]
    OutOfRange {
        batch_index: i64,
        min: Option<i64>,
        max: Option<i64>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Schema error in '{path}': {message}")]
    Schema {
        path: PathBuf,
        message: String,
    },

    #[error("Storage error at '{path}': {message}")]
    Storage {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Table error: {message}")]
    Table {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type Result<T> = std::result::Result<T, ReaderError>;

fn describe_window(min: &Option<i64>, max: &Option<i64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("window covers {min}..={max}"),
        _ => "window is empty".to_string(),
    }
}

// Convenience constructors
impl ReaderError {

    pub fn end_of_data(requested: usize, remaining: usize) -> Self {
        Self::EndOfData { requested, remaining }
    }

    pub fn out_of_range(batch_index: i64, min: Option<i64>, max: Option<i64>) -> Self {
        Self::OutOfRange { batch_index, min, max }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn table(message: impl Into<String>) -> Self {
        Self::Table {
            message: message.into(),
            source: None,
        }
    }

    pub fn table_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Table {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for the end-of-data condition a training loop treats as
    /// "epoch complete".
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::EndOfData { .. })
    }
}
