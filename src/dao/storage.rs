use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a storage backend, independent of which engine backs
/// the port.
#[derive(Debug, Error)]
#[error("storage backend failed during {operation}")]
pub struct StorageError {
    operation: String,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl StorageError {
    /// Wrap a backend failure, tagging the operation that hit it.
    pub fn backend(operation: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError {
            operation: operation.into(),
            source: Box::new(source),
        }
    }
}
