//! FILENAME: persistence/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid cell id in store: {0}")]
    InvalidCellId(String),
}

impl From<PersistenceError> for engine::StoreError {
    fn from(err: PersistenceError) -> Self {
        engine::StoreError::new(err.to_string())
    }
}
