//! Error types for filesystem and storage operations.

use thiserror::Error;

/// Errors that can occur during storage operations.
///
/// Errors raised by a [`StorageClient`](crate::StorageClient) are handed back to
/// callers of a filesystem provider as-is. The only variant a provider
/// reinterprets is `NotFound`, which `exists` turns into `false`.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Object not found in the bucket.
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Access denied.
    #[error("Access denied to s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// Network or service error.
    #[error("Network error: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Local I/O error.
    #[error("I/O error for {path}: {message}")]
    IoError { path: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A URL could not be assembled for a file.
    #[error("URL unavailable: {url}")]
    UrlUnavailable { url: String },

    /// The backend does not support this operation.
    #[error("Operation not supported by this backend: {operation}")]
    Unsupported { operation: &'static str },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::NetworkError { retryable, .. } => *retryable,
            StorageError::NotFound { .. } => false,
            StorageError::AccessDenied { .. } => false,
            StorageError::IoError { .. } => false,
            StorageError::InvalidConfig { .. } => false,
            StorageError::UrlUnavailable { .. } => false,
            StorageError::Unsupported { .. } => false,
            StorageError::Other { .. } => false,
        }
    }

    /// Check if this error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Create an IoError from std::io::Error for a given path.
    ///
    /// # Arguments
    /// * `path` - Path where the error occurred
    /// * `err` - The underlying IO error
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        StorageError::IoError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError {
            path: String::new(),
            message: err.to_string(),
        }
    }
}
