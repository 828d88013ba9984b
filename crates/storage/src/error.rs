//! Error types for storage and sync operations.

use std::fmt;

use thiserror::Error;

/// Errors that can occur talking to the source origin or the object store.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Target bucket does not exist.
    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    /// Credentials rejected or insufficient permissions.
    #[error("Access denied to bucket {bucket}: {message}")]
    AccessDenied { bucket: String, message: String },

    /// Source returned a non-2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Request did not complete within its timeout.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Local I/O error.
    #[error("I/O error for {path}: {message}")]
    IoError { path: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::HttpStatus { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            StorageError::Timeout { .. } => true,
            StorageError::NetworkError { retryable, .. } => *retryable,
            StorageError::BucketNotFound { .. } => false,
            StorageError::AccessDenied { .. } => false,
            StorageError::IoError { .. } => false,
            StorageError::InvalidConfig { .. } => false,
            StorageError::Other { .. } => false,
        }
    }

    /// Build an `IoError` for a path.
    pub fn io(path: impl fmt::Display, err: std::io::Error) -> Self {
        StorageError::IoError {
            path: path.to_string(),
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

/// Fatal errors that abort a run before any transfer starts.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Manifest could not be fetched or parsed.
    #[error("Manifest unavailable at {url}: {message}")]
    ManifestUnavailable { url: String, message: String },

    /// Bucket missing or credentials rejected.
    #[error("Bucket {bucket} unavailable: {source}")]
    BucketUnavailable {
        bucket: String,
        #[source]
        source: StorageError,
    },

    /// Scratch directory could not be created or inspected.
    #[error("Scratch directory {path}: {message}")]
    ScratchDirectory { path: String, message: String },
}

/// Pipeline stage at which a single file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Download,
    Upload,
    Hash,
    /// The worker task itself died (panic or cancellation).
    Worker,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            TransferStage::Download => "download",
            TransferStage::Upload => "upload",
            TransferStage::Hash => "hash",
            TransferStage::Worker => "worker",
        };
        f.write_str(name)
    }
}

/// Non-fatal per-file failure.
#[derive(Error, Debug, Clone)]
#[error("{stage} failed: {cause}")]
pub struct TransferFailure {
    /// Stage that failed.
    pub stage: TransferStage,
    /// Human-readable cause.
    pub cause: String,
}

impl TransferFailure {
    /// Create a new transfer failure.
    pub fn new(stage: TransferStage, cause: impl fmt::Display) -> Self {
        Self {
            stage,
            cause: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_retryable() {
        let server_error = StorageError::HttpStatus {
            url: "https://origin/a.js".into(),
            status: 503,
        };
        let not_found = StorageError::HttpStatus {
            url: "https://origin/a.js".into(),
            status: 404,
        };
        let throttled = StorageError::HttpStatus {
            url: "https://origin/a.js".into(),
            status: 429,
        };

        assert!(server_error.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(throttled.is_retryable());
    }

    #[test]
    fn test_bucket_errors_not_retryable() {
        assert!(!StorageError::BucketNotFound { bucket: "b".into() }.is_retryable());
        assert!(!StorageError::AccessDenied {
            bucket: "b".into(),
            message: "denied".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_transfer_failure_display() {
        let failure = TransferFailure::new(TransferStage::Upload, "connection reset");
        assert_eq!(failure.to_string(), "upload failed: connection reset");
    }
}
