use thiserror::Error;

/// Errors from the content-addressed media store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested media object was not found.
    #[error("media object not found: {0}")]
    NotFound(String),

    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The provided content hash is invalid.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// The store backend rejected the request.
    #[error("storage backend error: {0}")]
    Backend(String),
}
