//! Storage traits/interfaces.
//!
//! [`StorageClient`] is what a filesystem consumes: low-level object
//! operations implemented by each backend. [`FilesystemProvider`] is what a
//! filesystem exposes to applications.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::StorageError;
use crate::types::{ByteContent, File, ObjectBody, ObjectMetadata, PresignRequest};

/// Low-level S3 operations - implemented by each backend.
///
/// Implementations own transport, signing, retries and connection pooling.
/// They must be safe to share between tasks.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Base endpoint URL of the service, e.g. `https://s3.us-east-1.amazonaws.com`.
    fn endpoint(&self) -> &str;

    /// Fetch an object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StorageError>;

    /// Store an object, forwarding streamed content without buffering it.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteContent,
        content_type: Option<&str>,
    ) -> Result<(), StorageError>;

    /// Fetch object metadata.
    /// Returns `StorageError::NotFound` if the object doesn't exist.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StorageError>;

    /// Delete an object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Produce a time-limited signed URL.
    async fn presign(&self, request: &PresignRequest) -> Result<Url, StorageError>;
}

/// Filesystem capability set exposed to applications.
///
/// All paths are relative to the provider's root.
#[async_trait]
pub trait FilesystemProvider: Send + Sync {
    /// Read a file.
    async fn get(&self, path: &str) -> Result<File, StorageError>;

    /// Create or overwrite a file.
    async fn create(&self, path: &str, content: ByteContent) -> Result<File, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a file.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Public URL of a file.
    fn url(&self, path: &str) -> Result<Url, StorageError>;

    /// Time-limited signed URL granting read access to a file.
    async fn temporary_url(
        &self,
        path: &str,
        expires_in: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<Url, StorageError>;

    /// A provider scoped to a sub-directory of this one.
    fn directory(&self, path: &str) -> Arc<dyn FilesystemProvider>;
}
