//! Error types for CRT storage operations.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use manifest_mirror_storage::StorageError;
use thiserror::Error;

/// Errors specific to the CRT storage client.
#[derive(Error, Debug)]
pub enum CrtError {
    /// AWS SDK error.
    #[error("AWS SDK error: {message}")]
    SdkError {
        message: String,
        status: Option<u16>,
        retryable: bool,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error.
    #[error("I/O error on {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CrtError {
    /// Classify an SDK failure.
    ///
    /// Timeouts, dispatch failures and unparseable responses are retryable.
    /// Service errors are retryable only for 408, 429 and 5xx.
    pub(crate) fn from_sdk<E>(err: &SdkError<E, HttpResponse>) -> Self
    where
        E: std::error::Error + 'static,
    {
        let status: Option<u16> = err.raw_response().map(|r| r.status().as_u16());
        let retryable: bool = match err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
                true
            }
            SdkError::ServiceError(_) => {
                status.is_some_and(|s| s == 408 || s == 429 || s >= 500)
            }
            _ => false,
        };

        CrtError::SdkError {
            message: DisplayErrorContext(err).to_string(),
            status,
            retryable,
        }
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            CrtError::SdkError { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<CrtError> for StorageError {
    fn from(err: CrtError) -> Self {
        match err {
            CrtError::SdkError {
                message, retryable, ..
            } => StorageError::NetworkError { message, retryable },
            CrtError::ConfigError(message) => StorageError::InvalidConfig { message },
            CrtError::IoError { path, source } => StorageError::IoError {
                path,
                message: source.to_string(),
            },
        }
    }
}
