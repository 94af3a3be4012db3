//! Shared data structures for filesystem and storage operations.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::content_type::{content_type_for_path, extension_of, ContentType};
use crate::error::StorageError;

/// Default AWS region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Pull-based sequence of content chunks.
///
/// Finite and not restartable: it is consumed exactly once by whoever reads
/// or writes it. Returning `None` marks the end of data.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Configuration settings for an S3-backed filesystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Bucket holding every object of the filesystem.
    pub bucket: String,
    /// Root prefix prepended to every path (may be empty).
    pub root: String,
    /// AWS region.
    pub region: String,
    /// Custom endpoint for S3-compatible, non-AWS backends.
    pub endpoint: Option<String>,
    /// Address buckets by path instead of subdomain when talking to the service.
    pub force_path_style: bool,
    /// Static credentials. When absent the default provider chain is used.
    pub credentials: Option<AwsCredentials>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            root: String::new(),
            region: DEFAULT_REGION.into(),
            endpoint: None,
            force_path_style: false,
            credentials: None,
        }
    }
}

impl StorageSettings {
    /// Create settings for a bucket with default region and empty root.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Set the root prefix.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set a custom endpoint (e.g. MinIO or another S3-compatible service).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use path-style bucket addressing for service requests.
    pub fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    /// Set static access/secret key credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some(AwsCredentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        });
        self
    }

    /// Check that the settings can be used to build a client.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.bucket.is_empty() {
            return Err(StorageError::InvalidConfig {
                message: "bucket must not be empty".into(),
            });
        }
        if self.region.is_empty() {
            return Err(StorageError::InvalidConfig {
                message: "region must not be empty".into(),
            });
        }
        if matches!(self.endpoint.as_deref(), Some("")) {
            return Err(StorageError::InvalidConfig {
                message: "endpoint must not be empty when set".into(),
            });
        }
        Ok(())
    }
}

/// AWS credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Content of a file: fully buffered or produced chunk by chunk.
pub enum ByteContent {
    /// In-memory bytes.
    Buffer(Bytes),
    /// Lazily produced chunks, with the total length when the producer knows it.
    Stream {
        chunks: ByteStream,
        size: Option<u64>,
    },
}

impl ByteContent {
    /// Wrap a chunk stream of unknown total length.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, StorageError>> + Send + 'static,
    {
        ByteContent::Stream {
            chunks: Box::pin(stream),
            size: None,
        }
    }

    /// Wrap a chunk stream whose chunks add up to exactly `size` bytes.
    ///
    /// Backends use the size to send a content length up front, which lets
    /// them sign and checksum the body while it is still being produced.
    pub fn from_sized_stream<S>(stream: S, size: u64) -> Self
    where
        S: Stream<Item = Result<Bytes, StorageError>> + Send + 'static,
    {
        ByteContent::Stream {
            chunks: Box::pin(stream),
            size: Some(size),
        }
    }

    /// Length in bytes, when known without consuming the content.
    pub fn len(&self) -> Option<u64> {
        match self {
            ByteContent::Buffer(buffer) => Some(buffer.len() as u64),
            ByteContent::Stream { size, .. } => *size,
        }
    }

    /// Returns true when the content is produced chunk by chunk.
    pub fn is_stream(&self) -> bool {
        matches!(self, ByteContent::Stream { .. })
    }

    /// Returns true for an empty buffer. Streams are never reported empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, ByteContent::Buffer(buffer) if buffer.is_empty())
    }

    /// Drain the content into a single buffer.
    pub async fn collect(self) -> Result<Bytes, StorageError> {
        match self {
            ByteContent::Buffer(buffer) => Ok(buffer),
            ByteContent::Stream { mut chunks, .. } => {
                let mut buffer = BytesMut::new();
                while let Some(chunk) = chunks.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                Ok(buffer.freeze())
            }
        }
    }

    /// Turn the content into a stream, wrapping a buffer as a single chunk.
    pub fn into_stream(self) -> ByteStream {
        match self {
            ByteContent::Buffer(buffer) => Box::pin(futures::stream::once(async move { Ok(buffer) })),
            ByteContent::Stream { chunks, .. } => chunks,
        }
    }
}

impl fmt::Debug for ByteContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteContent::Buffer(buffer) => f.debug_tuple("Buffer").field(&buffer.len()).finish(),
            ByteContent::Stream { size, .. } => f.debug_struct("Stream").field("size", size).finish(),
        }
    }
}

impl From<Bytes> for ByteContent {
    fn from(bytes: Bytes) -> Self {
        ByteContent::Buffer(bytes)
    }
}

impl From<Vec<u8>> for ByteContent {
    fn from(bytes: Vec<u8>) -> Self {
        ByteContent::Buffer(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for ByteContent {
    fn from(bytes: &'static [u8]) -> Self {
        ByteContent::Buffer(Bytes::from_static(bytes))
    }
}

impl From<&'static str> for ByteContent {
    fn from(text: &'static str) -> Self {
        ByteContent::Buffer(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for ByteContent {
    fn from(text: String) -> Self {
        ByteContent::Buffer(Bytes::from(text))
    }
}

/// Where a file descriptor came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Resident in a filesystem backend under `path`.
    Filesystem { path: String },
    /// Created in memory and not yet stored.
    Memory,
}

/// A file produced by a read or create operation.
#[derive(Debug)]
pub struct File {
    /// Logical name. For stored files this is the fully resolved key.
    pub name: String,
    /// Where the file came from.
    pub source: FileSource,
    /// Content, if it was loaded.
    pub content: Option<ByteContent>,
    /// Size in bytes, if known.
    pub size: Option<u64>,
}

impl File {
    /// Create an in-memory file that has not been stored yet.
    pub fn new(name: impl Into<String>, content: impl Into<ByteContent>) -> Self {
        let content: ByteContent = content.into();
        Self {
            name: name.into(),
            source: FileSource::Memory,
            size: content.len(),
            content: Some(content),
        }
    }

    /// Descriptor for a stored file, without content.
    pub fn stored(path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self {
            name: path.clone(),
            source: FileSource::Filesystem { path },
            content: None,
            size: None,
        }
    }

    /// Final dot-separated segment of the name, if the name has a `.`.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.name)
    }

    /// Content type inferred from the name's extension.
    pub fn content_type(&self) -> Option<ContentType> {
        content_type_for_path(&self.name)
    }

    /// Read the whole content into memory.
    pub async fn into_bytes(self) -> Result<Bytes, StorageError> {
        match self.content {
            Some(content) => content.collect().await,
            None => Err(StorageError::Other {
                message: format!("File {} has no content loaded", self.name),
            }),
        }
    }
}

/// Body of a fetched object.
#[derive(Debug)]
pub struct ObjectBody {
    /// Object content.
    pub body: ByteContent,
    /// Content length reported by the backend.
    pub content_length: Option<u64>,
}

/// Metadata returned by a HEAD request.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    pub size: Option<u64>,
    /// Stored content type.
    pub content_type: Option<String>,
    /// ETag.
    pub etag: Option<String>,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
}

/// HTTP method a presigned URL authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Head,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Head => "HEAD",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Request for a time-limited signed URL.
#[derive(Debug, Clone)]
pub struct PresignRequest {
    /// Operation the URL authorizes.
    pub method: HttpMethod,
    /// Target bucket.
    pub bucket: String,
    /// Target key.
    pub key: String,
    /// Headers that become part of the signature.
    pub headers: HashMap<String, String>,
    /// How long the URL stays valid.
    pub expires_in: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_settings_default() {
        let settings = StorageSettings::default();
        assert_eq!(settings.region, DEFAULT_REGION);
        assert!(settings.root.is_empty());
        assert!(settings.endpoint.is_none());
    }

    #[test]
    fn test_storage_settings_validate() {
        assert!(StorageSettings::default().validate().is_err());
        assert!(StorageSettings::new("media").validate().is_ok());

        let empty_endpoint = StorageSettings::new("media").with_endpoint("");
        assert!(matches!(
            empty_endpoint.validate(),
            Err(StorageError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let settings = StorageSettings::new("media").with_credentials("AKIA123", "very-secret");
        let printed = format!("{:?}", settings);
        assert!(printed.contains("AKIA123"));
        assert!(!printed.contains("very-secret"));
    }

    #[test]
    fn test_new_file_is_in_memory() {
        let file = File::new("logo.png", vec![1u8, 2, 3]);
        assert_eq!(file.source, FileSource::Memory);
        assert_eq!(file.size, Some(3));
        assert_eq!(file.extension(), Some("png"));
        assert_eq!(file.content_type().map(|c| c.as_str()), Some("image/png"));
    }

    #[tokio::test]
    async fn test_stream_content_collects_in_order() {
        let chunks = vec![Ok(Bytes::from_static(b"hel")), Ok(Bytes::from_static(b"lo"))];
        let content = ByteContent::from_stream(futures::stream::iter(chunks));
        assert_eq!(content.len(), None);
        assert_eq!(content.collect().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_sized_stream_reports_length() {
        let chunks = vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
        let content = ByteContent::from_sized_stream(futures::stream::iter(chunks), 4);
        assert!(content.is_stream());
        assert_eq!(content.len(), Some(4));
        assert!(!content.is_empty());
    }

    #[tokio::test]
    async fn test_stream_error_stops_collection() {
        let chunks = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(StorageError::NetworkError {
                message: "reset".into(),
                retryable: true,
            }),
        ];
        let content = ByteContent::from_stream(futures::stream::iter(chunks));
        assert!(matches!(
            content.collect().await,
            Err(StorageError::NetworkError { .. })
        ));
    }

    #[tokio::test]
    async fn test_stored_file_has_no_content() {
        let file = File::stored("data/a.txt");
        assert_eq!(
            file.source,
            FileSource::Filesystem {
                path: "data/a.txt".into()
            }
        );
        assert!(file.into_bytes().await.is_err());
    }
}
