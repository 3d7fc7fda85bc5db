use pantry_aggregate::AggregateError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Table not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: pantry_core::BoxError,
    },

    #[error("Invalid value '{value}' in {table}.{column} at row {row}")]
    InvalidValue {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error(transparent)]
    Core(#[from] pantry_core::Error),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for pantry_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Core(inner) => inner,
            other => pantry_core::Error::source(other),
        }
    }
}
