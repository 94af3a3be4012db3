//! Constructors for S3-backed filesystems.

use std::sync::Arc;

use rusty_filesystem_storage::{Filesystem, S3Filesystem, StorageError, StorageSettings};

use crate::client::CrtStorageClient;

/// Create an S3 filesystem provider from settings.
///
/// # Arguments
/// * `settings` - Bucket, root, region, credentials and optional endpoint
///
/// # Errors
/// Returns `InvalidConfig` if the settings are incomplete.
pub async fn s3_filesystem(
    settings: &StorageSettings,
) -> Result<S3Filesystem<CrtStorageClient>, StorageError> {
    let client = CrtStorageClient::new(settings).await?;
    Ok(S3Filesystem::new(
        Arc::new(client),
        settings.bucket.clone(),
        settings.root.clone(),
    ))
}

/// Create a [`Filesystem`] backed by S3 or S3-compatible storage.
pub async fn s3(settings: &StorageSettings) -> Result<Filesystem, StorageError> {
    Ok(Filesystem::new(Arc::new(s3_filesystem(settings).await?)))
}
