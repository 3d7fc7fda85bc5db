use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by [`Error::Source`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Taxonomy is empty: nothing to match against")]
    EmptyTaxonomy,

    #[error("Empty query batch")]
    EmptyBatch,

    #[error("Invalid vector text for row {row}: {reason}")]
    InvalidVector { row: i64, reason: String },

    #[error("Invalid id '{value}': not convertible to an integer")]
    InvalidId { value: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Reference source failed: {0}")]
    Source(#[source] BoxError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wraps an upstream table/connection failure.
    pub fn source<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Source(err.into())
    }
}
