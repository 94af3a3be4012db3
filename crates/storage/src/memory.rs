//! In-memory storage client.
//!
//! Keeps objects in a process-local map. Useful for tests and for running an
//! application without an object store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::StorageError;
use crate::traits::StorageClient;
use crate::types::{ByteContent, ObjectBody, ObjectMetadata, PresignRequest};

/// An object held by [`MemoryStorageClient`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Stored objects: bucket -> key -> object.
type Buckets = HashMap<String, HashMap<String, StoredObject>>;

/// [`StorageClient`] that keeps objects in memory.
#[derive(Debug)]
pub struct MemoryStorageClient {
    endpoint: String,
    objects: Mutex<Buckets>,
}

impl MemoryStorageClient {
    /// Create an empty store reporting `endpoint` as its base URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// A stored object, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Keys stored in a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buckets> {
        // A panic while holding the lock cannot leave a map half-updated.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn not_found(bucket: &str, key: &str) -> StorageError {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StorageError> {
        let object: StoredObject = self
            .object(bucket, key)
            .ok_or_else(|| Self::not_found(bucket, key))?;
        Ok(ObjectBody {
            content_length: Some(object.data.len() as u64),
            body: ByteContent::Buffer(object.data),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteContent,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        // Drain before locking so a slow producer never holds the map.
        let data: Bytes = body.collect().await?;
        self.lock().entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StorageError> {
        let object: StoredObject = self
            .object(bucket, key)
            .ok_or_else(|| Self::not_found(bucket, key))?;
        Ok(ObjectMetadata {
            size: Some(object.data.len() as u64),
            content_type: object.content_type,
            etag: None,
            last_modified: None,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        if let Some(objects) = self.lock().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    /// Returns the public-style URL with the expiry and signed header names as
    /// query parameters. Nothing is actually signed.
    async fn presign(&self, request: &PresignRequest) -> Result<Url, StorageError> {
        let base: String = self
            .endpoint
            .trim_end_matches('/')
            .replacen("://", &format!("://{}.", request.bucket), 1);
        let raw: String = format!("{}/{}", base, request.key);
        let mut url: Url =
            Url::parse(&raw).map_err(|_| StorageError::UrlUnavailable { url: raw.clone() })?;

        let signed_headers: BTreeMap<String, &String> = request
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        let signed_header_names: Vec<&str> = std::iter::once("host")
            .chain(signed_headers.keys().map(String::as_str))
            .collect();

        url.query_pairs_mut()
            .append_pair("X-Amz-Method", request.method.as_str())
            .append_pair("X-Amz-Expires", &request.expires_in.as_secs().to_string())
            .append_pair("X-Amz-SignedHeaders", &signed_header_names.join(";"));
        Ok(url)
    }
}
