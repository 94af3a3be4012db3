//! Filesystem provider backed by S3 or S3-compatible object storage.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rusty_filesystem_storage::{FilesystemProvider, MemoryStorageClient, S3Filesystem};
//!
//! let client = Arc::new(MemoryStorageClient::new("https://s3.us-east-1.amazonaws.com"));
//! let fs = S3Filesystem::new(client, "my-bucket", "uploads");
//! fs.create("avatars/1.png", png_bytes.into()).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::content_type::{content_type_for_path, ContentType};
use crate::error::StorageError;
use crate::path::{resolve_path, scope_root};
use crate::traits::{FilesystemProvider, StorageClient};
use crate::types::{ByteContent, File, FileSource, HttpMethod, ObjectBody, PresignRequest};

/// A [`FilesystemProvider`] for S3 or S3-compatible storage.
///
/// Holds only immutable configuration. The client is shared with whoever
/// created it and with every scoped view derived via `directory`.
pub struct S3Filesystem<C: StorageClient> {
    /// Shared storage client.
    client: Arc<C>,
    /// Bucket holding every object of this filesystem.
    bucket: String,
    /// Prefix prepended to every path. May be empty.
    root: String,
}

impl<C: StorageClient> Clone for S3Filesystem<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            bucket: self.bucket.clone(),
            root: self.root.clone(),
        }
    }
}

impl<C: StorageClient> S3Filesystem<C> {
    /// Create a filesystem over an existing client.
    ///
    /// # Arguments
    /// * `client` - Shared storage client
    /// * `bucket` - Bucket name
    /// * `root` - Root prefix, empty for the bucket root
    pub fn new(client: Arc<C>, bucket: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            root: root.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// The shared storage client.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Full object key for a path relative to the root.
    pub fn resolved_path(&self, path: &str) -> String {
        resolve_path(&self.root, path)
    }

    /// A view rooted at `path` below this one, sharing client and bucket.
    pub fn scoped(&self, path: &str) -> Self {
        Self {
            client: Arc::clone(&self.client),
            bucket: self.bucket.clone(),
            root: scope_root(&self.root, path),
        }
    }

    /// Public URL: the bucket becomes a subdomain of the endpoint host.
    fn public_url(&self, key: &str) -> Result<Url, StorageError> {
        let endpoint: &str = self.client.endpoint().trim_end_matches('/');
        let base: String = endpoint.replacen("://", &format!("://{}.", self.bucket), 1);
        let raw: String = format!("{}/{}", base, key);
        Url::parse(&raw).map_err(|_| StorageError::UrlUnavailable { url: raw })
    }
}

#[async_trait]
impl<C: StorageClient + 'static> FilesystemProvider for S3Filesystem<C> {
    async fn get(&self, path: &str) -> Result<File, StorageError> {
        let key: String = self.resolved_path(path);
        log::debug!("get s3://{}/{}", self.bucket, key);

        let ObjectBody {
            body,
            content_length,
        } = self.client.get_object(&self.bucket, &key).await?;
        if content_length.is_none() {
            log::warn!("No content length reported for s3://{}/{}", self.bucket, key);
        }

        Ok(File {
            name: key.clone(),
            source: FileSource::Filesystem { path: key },
            content: Some(body),
            size: Some(content_length.unwrap_or(0)),
        })
    }

    async fn create(&self, path: &str, content: ByteContent) -> Result<File, StorageError> {
        let key: String = self.resolved_path(path);
        let content_type: Option<ContentType> = content_type_for_path(&key);
        log::debug!(
            "put s3://{}/{} (content type: {:?})",
            self.bucket,
            key,
            content_type.map(|c| c.as_str())
        );

        self.client
            .put_object(
                &self.bucket,
                &key,
                content,
                content_type.as_ref().map(ContentType::as_str),
            )
            .await?;

        Ok(File::stored(key))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let key: String = self.resolved_path(path);
        log::debug!("head s3://{}/{}", self.bucket, key);

        match self.client.head_object(&self.bucket, &key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let key: String = self.resolved_path(path);
        log::debug!("delete s3://{}/{}", self.bucket, key);
        self.client.delete_object(&self.bucket, &key).await
    }

    fn url(&self, path: &str) -> Result<Url, StorageError> {
        self.public_url(&self.resolved_path(path))
    }

    async fn temporary_url(
        &self,
        path: &str,
        expires_in: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<Url, StorageError> {
        let key: String = self.resolved_path(path);
        // A file without a public URL has no signed one either.
        self.public_url(&key)?;
        log::debug!(
            "presign GET s3://{}/{} for {}s",
            self.bucket,
            key,
            expires_in.as_secs()
        );

        let request = PresignRequest {
            method: HttpMethod::Get,
            bucket: self.bucket.clone(),
            key,
            headers: headers.clone(),
            expires_in,
        };
        self.client.presign(&request).await
    }

    fn directory(&self, path: &str) -> Arc<dyn FilesystemProvider> {
        Arc::new(self.scoped(path))
    }
}
