//! Error types for CRT storage operations.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use rusty_filesystem_storage::StorageError;
use thiserror::Error;

/// Errors specific to the CRT storage client.
#[derive(Error, Debug)]
pub enum CrtError {
    /// The key does not exist.
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The service refused the request.
    #[error("Access denied to s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// AWS SDK error.
    #[error("AWS SDK error: {message}")]
    SdkError { message: String, retryable: bool },

    /// Presigning failed.
    #[error("Presigning error: {0}")]
    PresignError(String),

    /// Settings the SDK cannot be configured with.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CrtError {
    /// Classify an SDK failure for `bucket`/`key`.
    ///
    /// Missing keys are reported as `NotFound` whether the service sent an
    /// error code (GET) or only a bare 404 status (HEAD). A missing bucket is
    /// not a missing key.
    pub fn from_sdk<E>(bucket: &str, key: &str, err: SdkError<E, HttpResponse>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let status: Option<u16> = err.raw_response().map(|r| r.status().as_u16());
        let code: Option<String> = err.code().map(str::to_string);
        let message: String = DisplayErrorContext(&err).to_string();

        match (code.as_deref(), status) {
            (Some("NoSuchBucket"), _) => CrtError::SdkError {
                message,
                retryable: false,
            },
            (Some("NoSuchKey") | Some("NotFound"), _) | (None, Some(404)) => CrtError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            (Some("AccessDenied") | Some("Forbidden"), _) | (_, Some(403)) => {
                CrtError::AccessDenied {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    message,
                }
            }
            _ => {
                // A dispatch failure raised while building the request fails the same way again.
                let retryable: bool = match &err {
                    SdkError::TimeoutError(_) => true,
                    SdkError::DispatchFailure(failure) => failure.is_io() || failure.is_timeout(),
                    _ => status.is_some_and(|s| s >= 500 || s == 429),
                };
                CrtError::SdkError { message, retryable }
            }
        }
    }
}

impl From<CrtError> for StorageError {
    fn from(err: CrtError) -> Self {
        match err {
            CrtError::NotFound { bucket, key } => StorageError::NotFound { bucket, key },
            CrtError::AccessDenied {
                bucket,
                key,
                message,
            } => StorageError::AccessDenied {
                bucket,
                key,
                message,
            },
            CrtError::SdkError { message, retryable } => {
                StorageError::NetworkError { message, retryable }
            }
            CrtError::PresignError(message) => StorageError::Other { message },
            CrtError::ConfigError(message) => StorageError::InvalidConfig { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::get_object::GetObjectError;
    use aws_sdk_s3::operation::head_object::HeadObjectError;
    use aws_sdk_s3::types::error::NotFound;
    use aws_smithy_runtime_api::client::result::ConnectorError;
    use aws_smithy_types::body::SdkBody;

    fn response(status: u16) -> HttpResponse {
        HttpResponse::new(status.try_into().unwrap(), SdkBody::empty())
    }

    fn get_error(code: &str, status: u16) -> SdkError<GetObjectError, HttpResponse> {
        let meta = ErrorMetadata::builder().code(code).message("test").build();
        SdkError::service_error(GetObjectError::generic(meta), response(status))
    }

    #[test]
    fn test_bare_404_head_is_not_found() {
        let err = SdkError::service_error(
            HeadObjectError::NotFound(NotFound::builder().build()),
            response(404),
        );
        assert!(matches!(
            CrtError::from_sdk("b", "k", err),
            CrtError::NotFound { .. }
        ));
    }

    #[test]
    fn test_no_such_key_is_not_found() {
        let err = CrtError::from_sdk("b", "k", get_error("NoSuchKey", 404));
        assert!(matches!(err, CrtError::NotFound { ref key, .. } if key == "k"));
    }

    #[test]
    fn test_missing_bucket_is_not_a_missing_key() {
        let err = CrtError::from_sdk("b", "k", get_error("NoSuchBucket", 404));
        assert!(matches!(err, CrtError::SdkError { retryable: false, .. }));
    }

    #[test]
    fn test_forbidden_is_access_denied() {
        let err = CrtError::from_sdk("b", "k", get_error("AccessDenied", 403));
        assert!(matches!(err, CrtError::AccessDenied { .. }));
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = CrtError::from_sdk("b", "k", get_error("InternalError", 500));
        assert!(matches!(err, CrtError::SdkError { retryable: true, .. }));
    }

    #[test]
    fn test_io_dispatch_failure_is_retryable() {
        let err: SdkError<GetObjectError, HttpResponse> =
            SdkError::dispatch_failure(ConnectorError::io("connection reset".into()));
        let err = CrtError::from_sdk("b", "k", err);
        assert!(matches!(err, CrtError::SdkError { retryable: true, .. }));
    }

    #[test]
    fn test_request_construction_failure_is_not_retryable() {
        let err: SdkError<GetObjectError, HttpResponse> = SdkError::dispatch_failure(
            ConnectorError::user("request bodies without a known size cannot be encoded".into()),
        );
        let err = CrtError::from_sdk("b", "k", err);
        assert!(matches!(err, CrtError::SdkError { retryable: false, .. }));
    }

    #[test]
    fn test_not_found_converts_unchanged() {
        let err: StorageError = CrtError::NotFound {
            bucket: "b".into(),
            key: "k".into(),
        }
        .into();
        assert!(matches!(err, StorageError::NotFound { ref bucket, ref key } if bucket == "b" && key == "k"));
    }

    #[test]
    fn test_sdk_error_keeps_retryable_flag() {
        let err: StorageError = CrtError::SdkError {
            message: "slow down".into(),
            retryable: true,
        }
        .into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_config_error_is_invalid_config() {
        let err: StorageError = CrtError::ConfigError("bad endpoint".into()).into();
        assert!(matches!(err, StorageError::InvalidConfig { .. }));
    }
}
