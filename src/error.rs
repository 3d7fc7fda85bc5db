use thiserror::Error;

pub type Result<T> = std::result::Result<T, PantryError>;

#[derive(Error, Debug)]
pub enum PantryError {
    #[error(transparent)]
    Core(#[from] pantry_core::Error),

    #[error(transparent)]
    Aggregate(#[from] pantry_aggregate::AggregateError),

    #[error(transparent)]
    Storage(#[from] pantry_storage::StorageError),

    #[error(transparent)]
    Service(#[from] pantry_api::ServiceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
