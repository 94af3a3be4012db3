//! AWS SDK S3 client implementation.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpRequest;
use aws_sdk_s3::config::{Region, RequestChecksumCalculation};
use aws_sdk_s3::presigning::{PresignedRequest, PresigningConfig};
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use http_body::Frame;
use url::Url;

use rusty_filesystem_storage::{
    ByteContent, ByteStream, HttpMethod, ObjectBody, ObjectMetadata, PresignRequest,
    StorageClient, StorageError, StorageSettings,
};

use crate::error::CrtError;

/// Public endpoint of the AWS S3 service in `region`.
pub fn default_endpoint(region: &str) -> String {
    format!("https://s3.{}.amazonaws.com", region)
}

/// StorageClient implementation using AWS SDK for Rust.
///
/// The SDK provides retry, connection pooling and request signing. This type
/// only translates between SDK shapes and the storage traits.
pub struct CrtStorageClient {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Base URL used for public URLs.
    endpoint: String,
}

impl CrtStorageClient {
    /// Create a new CRT storage client.
    ///
    /// Static credentials from `settings` are used when present, otherwise the
    /// default credential chain.
    ///
    /// # Arguments
    /// * `settings` - Region, optional credentials and optional custom endpoint
    ///
    /// # Returns
    /// A new CRT storage client.
    pub async fn new(settings: &StorageSettings) -> Result<Self, StorageError> {
        settings.validate()?;
        if let Some(ref endpoint) = settings.endpoint {
            Url::parse(endpoint).map_err(|e| {
                CrtError::ConfigError(format!("invalid endpoint {}: {}", endpoint, e))
            })?;
        }

        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "rusty-filesystem",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style);
        if let Some(ref endpoint) = settings.endpoint {
            s3_config = s3_config.endpoint_url(endpoint);
        }
        let s3_client = S3Client::from_conf(s3_config.build());

        let endpoint: String = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| default_endpoint(&settings.region));
        log::debug!("Created S3 client for {} ({})", endpoint, settings.region);

        Ok(Self {
            s3_client,
            endpoint,
        })
    }

    /// Create a client from an existing S3Client.
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `endpoint` - Base URL the client talks to, used for public URLs
    pub fn from_client(s3_client: S3Client, endpoint: impl Into<String>) -> Self {
        Self {
            s3_client,
            endpoint: endpoint.into(),
        }
    }

    /// The underlying SDK client.
    pub fn s3_client(&self) -> &S3Client {
        &self.s3_client
    }
}

/// Adapts a chunk stream to an `http_body` body so the SDK can pull from it.
///
/// The SDK requires `Sync` bodies. Chunks are only ever polled through
/// `&mut self`, so the mutex is never contended.
struct StreamingBody {
    chunks: Mutex<ByteStream>,
    /// Exact body length, reported to the SDK through `size_hint`.
    size: Option<u64>,
}

impl http_body::Body for StreamingBody {
    type Data = Bytes;
    type Error = StorageError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, StorageError>>> {
        let chunks: &mut ByteStream = self
            .get_mut()
            .chunks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        chunks
            .as_mut()
            .poll_next(cx)
            .map(|next| next.map(|chunk| chunk.map(Frame::data)))
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self.size {
            Some(size) => http_body::SizeHint::with_exact(size),
            None => http_body::SizeHint::default(),
        }
    }
}

/// Convert content into an SDK body without buffering streams.
fn to_sdk_body(content: ByteContent) -> SdkByteStream {
    match content {
        ByteContent::Buffer(buffer) => SdkByteStream::from(buffer),
        ByteContent::Stream { chunks, size } => SdkByteStream::from_body_1_x(StreamingBody {
            chunks: Mutex::new(chunks),
            size,
        }),
    }
}

/// Convert an SDK body into content, pulling chunks lazily.
fn from_sdk_body(body: SdkByteStream, content_length: Option<u64>) -> ByteContent {
    let chunks = futures::stream::try_unfold(body, |mut body| async move {
        match body.try_next().await {
            Ok(Some(chunk)) => Ok(Some((chunk, body))),
            Ok(None) => Ok(None),
            Err(e) => Err(StorageError::NetworkError {
                message: e.to_string(),
                retryable: true,
            }),
        }
    });
    match content_length {
        Some(size) => ByteContent::from_sized_stream(chunks, size),
        None => ByteContent::from_stream(chunks),
    }
}

/// Request mutator adding caller headers before signing.
fn inject_headers(headers: HashMap<String, String>) -> impl Fn(&mut HttpRequest) + Send + Sync {
    move |request: &mut HttpRequest| {
        for (name, value) in &headers {
            if let Err(e) = request.headers_mut().try_insert(name.clone(), value.clone()) {
                log::warn!("Skipping header {} in presigned request: {}", name, e);
            }
        }
    }
}

#[async_trait]
impl StorageClient for CrtStorageClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StorageError> {
        let response = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(bucket, key, err))?;

        let content_length: Option<u64> = response
            .content_length()
            .and_then(|l| u64::try_from(l).ok());

        Ok(ObjectBody {
            body: from_sdk_body(response.body, content_length),
            content_length,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteContent,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let content_length: Option<u64> = body.len();
        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(to_sdk_body(body));

        if let Some(length) = content_length.and_then(|l| i64::try_from(l).ok()) {
            request = request.content_length(length);
        }

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        // Default checksums need aws-chunked encoding, which needs a known length.
        let result = if content_length.is_some() {
            request.send().await
        } else {
            request
                .customize()
                .config_override(
                    aws_sdk_s3::config::Builder::default()
                        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired),
                )
                .send()
                .await
        };
        result.map_err(|err| CrtError::from_sdk(bucket, key, err))?;

        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StorageError> {
        let output = self
            .s3_client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(bucket, key, err))?;

        let last_modified: Option<i64> = output
            .last_modified()
            .and_then(|dt| dt.to_millis().ok())
            .map(|ms| ms / 1000);

        Ok(ObjectMetadata {
            size: output.content_length().and_then(|l| u64::try_from(l).ok()),
            content_type: output.content_type().map(|s| s.to_string()),
            etag: output.e_tag().map(|s| s.to_string()),
            last_modified,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.s3_client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(bucket, key, err))?;

        Ok(())
    }

    async fn presign(&self, request: &PresignRequest) -> Result<Url, StorageError> {
        let config: PresigningConfig = PresigningConfig::expires_in(request.expires_in)
            .map_err(|e| CrtError::PresignError(e.to_string()))?;
        let bucket: &str = &request.bucket;
        let key: &str = &request.key;
        let headers = inject_headers(request.headers.clone());

        let presigned: PresignedRequest = match request.method {
            HttpMethod::Get => self
                .s3_client
                .get_object()
                .bucket(bucket)
                .key(key)
                .customize()
                .mutate_request(headers)
                .presigned(config)
                .await
                .map_err(|err| CrtError::from_sdk(bucket, key, err))?,
            HttpMethod::Put => self
                .s3_client
                .put_object()
                .bucket(bucket)
                .key(key)
                .customize()
                .mutate_request(headers)
                .presigned(config)
                .await
                .map_err(|err| CrtError::from_sdk(bucket, key, err))?,
            HttpMethod::Head => self
                .s3_client
                .head_object()
                .bucket(bucket)
                .key(key)
                .customize()
                .mutate_request(headers)
                .presigned(config)
                .await
                .map_err(|err| CrtError::from_sdk(bucket, key, err))?,
            HttpMethod::Delete => self
                .s3_client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .customize()
                .mutate_request(headers)
                .presigned(config)
                .await
                .map_err(|err| CrtError::from_sdk(bucket, key, err))?,
        };

        Url::parse(presigned.uri()).map_err(|_| StorageError::UrlUnavailable {
            url: presigned.uri().to_string(),
        })
    }
}
