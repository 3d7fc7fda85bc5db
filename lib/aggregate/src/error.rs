use thiserror::Error;

pub type Result<T> = std::result::Result<T, AggregateError>;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid value '{value}' in column {column} at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid threshold {0}: must lie in [-1, 1]")]
    InvalidThreshold(f64),

    #[error(transparent)]
    Core(#[from] pantry_core::Error),
}

impl From<AggregateError> for pantry_core::Error {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::Core(inner) => inner,
            AggregateError::MissingColumn(column) => pantry_core::Error::MissingColumn(column),
            other => pantry_core::Error::source(other),
        }
    }
}
