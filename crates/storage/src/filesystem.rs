//! Application-facing filesystem handle.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::StorageError;
use crate::local::LocalFilesystem;
use crate::path::resolve_path;
use crate::s3::S3Filesystem;
use crate::traits::{FilesystemProvider, StorageClient};
use crate::types::{ByteContent, File};

/// A cheaply cloneable handle over any [`FilesystemProvider`].
#[derive(Clone)]
pub struct Filesystem {
    provider: Arc<dyn FilesystemProvider>,
}

impl std::fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filesystem").finish_non_exhaustive()
    }
}

impl Filesystem {
    /// Wrap a provider.
    pub fn new(provider: Arc<dyn FilesystemProvider>) -> Self {
        Self { provider }
    }

    /// A filesystem backed by S3 or S3-compatible storage through an existing client.
    pub fn s3_with_client<C: StorageClient + 'static>(
        client: Arc<C>,
        bucket: impl Into<String>,
        root: impl Into<String>,
    ) -> Self {
        Self::new(Arc::new(S3Filesystem::new(client, bucket, root)))
    }

    /// A filesystem storing files below a local directory.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalFilesystem::new(root)))
    }

    /// The underlying provider.
    pub fn provider(&self) -> &Arc<dyn FilesystemProvider> {
        &self.provider
    }

    pub async fn get(&self, path: &str) -> Result<File, StorageError> {
        self.provider.get(path).await
    }

    pub async fn create(
        &self,
        path: &str,
        content: impl Into<ByteContent>,
    ) -> Result<File, StorageError> {
        self.provider.create(path, content.into()).await
    }

    pub async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.provider.exists(path).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.provider.delete(path).await
    }

    pub fn url(&self, path: &str) -> Result<Url, StorageError> {
        self.provider.url(path)
    }

    /// Signed read URL valid for `expires_in`.
    pub async fn temporary_url(
        &self,
        path: &str,
        expires_in: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<Url, StorageError> {
        self.provider.temporary_url(path, expires_in, headers).await
    }

    /// A filesystem scoped to `path` below this one.
    pub fn directory(&self, path: &str) -> Filesystem {
        Self::new(self.provider.directory(path))
    }

    /// Store an existing file's content under its name, optionally inside `directory`.
    ///
    /// # Errors
    /// Fails if the file has no content loaded, or with any error from `create`.
    pub async fn put(&self, file: File, directory: Option<&str>) -> Result<File, StorageError> {
        let path: String = match directory {
            Some(directory) => resolve_path(directory, &file.name),
            None => file.name,
        };
        let content: ByteContent = file.content.ok_or_else(|| StorageError::Other {
            message: format!("File {} has no content to store", path),
        })?;
        self.provider.create(&path, content).await
    }
}
