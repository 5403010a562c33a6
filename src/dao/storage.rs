use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record could not be decoded into an entity.
    #[error("corrupted record `{id}`: {reason}")]
    Corrupted { id: String, reason: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a decoding error for the record identified by `id`.
    pub fn corrupted(id: impl ToString, reason: impl Into<String>) -> Self {
        StorageError::Corrupted {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
