//! Per-file transfer worker.
//!
//! For one manifest entry the worker:
//!
//! 1. Reuses a non-empty local copy when its digest equals the digest of the
//!    remote content. The remote side has no cheaper freshness signal, so this
//!    reads the whole remote body.
//! 2. Otherwise downloads the file into the scratch directory.
//! 3. Uploads the local file to the bucket.
//!
//! Download and upload each get their own retry budget; the remote read of
//! the freshness check shares the download budget. Uploads carry a
//! Content-Type guessed from the object key's extension. Failures are turned
//! into a `TransferOutcome::Failed` and never escape the worker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::TryStreamExt;
use manifest_mirror_common::{hash_file, ContentDigest, Xxh3Hasher};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{StorageError, TransferStage};
use crate::retry::retry_with_fixed_delay;
use crate::scratch::part_file_name;
use crate::traits::{SourceClient, StorageClient};
use crate::types::{ManifestEntry, RetrySettings, SkipReason, TransferOutcome, TransferReport};

/// Downloads, verifies and uploads single manifest entries.
///
/// One worker is shared by every task of a batch; the only state it mutates
/// is the atomic upload counter.
pub struct TransferWorker<S, C> {
    source: Arc<S>,
    storage: Arc<C>,
    bucket: String,
    scratch_dir: PathBuf,
    download_retry: RetrySettings,
    upload_retry: RetrySettings,
    uploads_succeeded: Arc<AtomicU64>,
}

impl<S: SourceClient, C: StorageClient> TransferWorker<S, C> {
    /// Create a worker writing into `scratch_dir` and uploading to `bucket`.
    pub fn new(
        source: Arc<S>,
        storage: Arc<C>,
        bucket: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            storage,
            bucket: bucket.into(),
            scratch_dir: scratch_dir.into(),
            download_retry: RetrySettings::default(),
            upload_retry: RetrySettings::default(),
            uploads_succeeded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set the per-stage retry budgets.
    pub fn with_retry(mut self, download: RetrySettings, upload: RetrySettings) -> Self {
        self.download_retry = download;
        self.upload_retry = upload;
        self
    }

    /// Successful uploads so far.
    pub fn uploads_succeeded(&self) -> u64 {
        self.uploads_succeeded.load(Ordering::SeqCst)
    }

    /// Scratch path for an entry.
    pub fn local_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.scratch_dir.join(&entry.file_name)
    }

    /// Mirror one entry. Never fails; failures are reported in the outcome.
    pub async fn process(&self, entry: &ManifestEntry) -> TransferReport {
        let local_path: PathBuf = self.local_path(entry);

        let outcome: TransferOutcome = match self.local_copy_is_current(entry, &local_path).await {
            Ok(true) => {
                debug!(file = %entry.file_name, "already exists and is identical, skipping download");
                TransferOutcome::Skipped(SkipReason::ContentIdentical)
            }
            Ok(false) => match self.download(entry, &local_path).await {
                Ok(bytes) => {
                    debug!(file = %entry.file_name, bytes, "downloaded");
                    TransferOutcome::Downloaded
                }
                Err(err) => {
                    error!(file = %entry.file_name, url = %entry.source_url, error = %err, "failed to download");
                    return report(entry, TransferOutcome::failed(TransferStage::Download, err), false);
                }
            },
            Err(err) => {
                error!(file = %entry.file_name, error = %err, "failed to compare digests");
                return report(entry, TransferOutcome::failed(TransferStage::Hash, err), false);
            }
        };

        match self.upload(entry, &local_path).await {
            Ok(()) => {
                self.uploads_succeeded.fetch_add(1, Ordering::SeqCst);
                debug!(
                    file = %entry.file_name,
                    bucket = %self.bucket,
                    key = %entry.destination_key,
                    "uploaded"
                );
                report(entry, outcome, true)
            }
            Err(err) => {
                error!(
                    file = %entry.file_name,
                    bucket = %self.bucket,
                    key = %entry.destination_key,
                    error = %err,
                    "failed to upload"
                );
                report(entry, TransferOutcome::failed(TransferStage::Upload, err), false)
            }
        }
    }

    /// Whether a non-empty local copy exists with the same digest as the remote.
    async fn local_copy_is_current(
        &self,
        entry: &ManifestEntry,
        local_path: &Path,
    ) -> Result<bool, StorageError> {
        let metadata = match tokio::fs::metadata(local_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StorageError::io(local_path.display(), e)),
        };
        if !metadata.is_file() || metadata.len() == 0 {
            return Ok(false);
        }

        let local_digest: ContentDigest = hash_local(local_path).await?;
        let remote_digest: ContentDigest = self.hash_remote(&entry.source_url).await?;
        debug!(
            file = %entry.file_name,
            local_hash = %local_digest,
            remote_hash = %remote_digest,
            "compared digests"
        );

        Ok(local_digest == remote_digest)
    }

    async fn hash_remote(&self, url: &str) -> Result<ContentDigest, StorageError> {
        retry_with_fixed_delay(&self.download_retry, "remote hash", |attempt| {
            debug!(url, attempt, "hashing remote content");
            self.hash_remote_once(url)
        })
        .await
    }

    async fn hash_remote_once(&self, url: &str) -> Result<ContentDigest, StorageError> {
        let mut stream = self.source.get(url, None).await?;
        let mut hasher: Xxh3Hasher = Xxh3Hasher::new();
        while let Some(chunk) = stream.try_next().await? {
            hasher.update(&chunk);
        }
        Ok(hasher.finish())
    }

    async fn download(&self, entry: &ManifestEntry, local_path: &Path) -> Result<u64, StorageError> {
        retry_with_fixed_delay(&self.download_retry, "download", |attempt| {
            self.download_once(entry, local_path, attempt)
        })
        .await
    }

    /// Stream the body into a private `.part` file, then rename it into place.
    async fn download_once(
        &self,
        entry: &ManifestEntry,
        local_path: &Path,
        attempt: u32,
    ) -> Result<u64, StorageError> {
        debug!(file = %entry.file_name, url = %entry.source_url, attempt, "downloading");
        let part_path: PathBuf = self
            .scratch_dir
            .join(part_file_name(&entry.file_name, &Uuid::new_v4().simple().to_string()));

        let result: Result<u64, StorageError> =
            match self.write_part(&entry.source_url, &part_path).await {
                Ok(bytes) => tokio::fs::rename(&part_path, local_path)
                    .await
                    .map(|()| bytes)
                    .map_err(|e| StorageError::io(local_path.display(), e)),
                Err(err) => Err(err),
            };

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&part_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %part_path.display(), error = %e, "could not remove partial file");
                }
            }
        }
        result
    }

    async fn write_part(&self, url: &str, part_path: &Path) -> Result<u64, StorageError> {
        let mut stream = self.source.get(url, None).await?;
        let mut file = tokio::fs::File::create(part_path)
            .await
            .map_err(|e| StorageError::io(part_path.display(), e))?;

        let mut written: u64 = 0;
        while let Some(chunk) = stream.try_next().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| StorageError::io(part_path.display(), e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| StorageError::io(part_path.display(), e))?;
        Ok(written)
    }

    async fn upload(&self, entry: &ManifestEntry, local_path: &Path) -> Result<(), StorageError> {
        let content_type: Option<&'static str> = content_type_for_key(&entry.destination_key);
        retry_with_fixed_delay(&self.upload_retry, "upload", |attempt| {
            debug!(
                file = %entry.file_name,
                key = %entry.destination_key,
                content_type = content_type.unwrap_or("-"),
                attempt,
                "uploading"
            );
            self.storage.put_object_from_file(
                &self.bucket,
                &entry.destination_key,
                local_path,
                content_type,
            )
        })
        .await
    }
}

/// Hash a local file off the async runtime.
async fn hash_local(path: &Path) -> Result<ContentDigest, StorageError> {
    let owned: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_file(&owned))
        .await
        .map_err(|e| StorageError::Other {
            message: format!("hashing task failed: {}", e),
        })?
        .map_err(|e| StorageError::io(path.display(), e))
}

/// MIME type for an object key, from its extension.
///
/// `None` leaves the choice to the store.
pub fn content_type_for_key(key: &str) -> Option<&'static str> {
    mime_guess::from_path(key).first_raw()
}

fn report(entry: &ManifestEntry, outcome: TransferOutcome, uploaded: bool) -> TransferReport {
    TransferReport {
        entry: entry.clone(),
        outcome,
        uploaded,
    }
}
