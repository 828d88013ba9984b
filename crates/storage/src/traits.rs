//! Transport traits for the content origin and the object store.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::StorageError;

/// Response body as a stream of bounded chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// Read-only access to the manifest endpoint and the content origin.
///
/// Implementations are shared by all workers and must not hold per-call
/// mutable state.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// GET a URL and return its body as a chunk stream.
    ///
    /// Non-2xx statuses are reported as `StorageError::HttpStatus` before any
    /// body is returned. `timeout` bounds the whole request including the
    /// body; `None` falls back to the transport's default ceiling.
    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<ByteStream, StorageError>;
}

/// Object store operations - implemented by each backend.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Check that the bucket exists and the credentials can reach it.
    async fn head_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Upload a local file under `key`, streaming it from disk.
    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &Path,
        content_type: Option<&str>,
    ) -> Result<(), StorageError>;
}
