//! Run coordination.
//!
//! `SyncOrchestrator::run` performs one full mirror run:
//!
//! 1. Check the bucket (fatal on failure)
//! 2. Fetch the manifest (fatal on failure)
//! 3. Create the scratch directory
//! 4. Process every entry on a bounded pool of tokio tasks
//! 5. Count scratch files and uploads, decide success
//! 6. Remove the scratch directory only on success
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use manifest_mirror_storage::{SyncOptions, SyncOrchestrator};
//!
//! let orchestrator = SyncOrchestrator::new(Arc::new(source), Arc::new(storage), "my-bucket")
//!     .with_options(SyncOptions::default().with_max_concurrency(4));
//! let summary = orchestrator.run().await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use manifest_mirror_common::{
    default_max_concurrency, DEFAULT_BASE_URL, DEFAULT_MANIFEST_TIMEOUT, DEFAULT_MANIFEST_URL,
    DEFAULT_SCRATCH_DIR_NAME,
};
use tracing::{error, info, info_span, Instrument};

use crate::error::{SyncError, TransferStage};
use crate::manifest::{fetch_manifest, Manifest};
use crate::scratch::ScratchDir;
use crate::summary::RunSummary;
use crate::traits::{SourceClient, StorageClient};
use crate::transfer::TransferWorker;
use crate::types::{
    ManifestEntry, RetrySettings, TransferOutcome, TransferReport, TransferStatistics,
};

/// Options for one mirror run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// JSON manifest endpoint.
    pub manifest_url: String,
    /// Prefix stripped from source URLs to form object keys.
    pub base_url: String,
    /// Local directory for downloaded files.
    pub scratch_dir: PathBuf,
    /// Worker pool size.
    pub max_concurrency: usize,
    /// Timeout for the manifest request.
    pub manifest_timeout: Duration,
    /// Retry budget for downloads.
    pub download_retry: RetrySettings,
    /// Retry budget for uploads.
    pub upload_retry: RetrySettings,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR_NAME),
            max_concurrency: default_max_concurrency(),
            manifest_timeout: DEFAULT_MANIFEST_TIMEOUT,
            download_retry: RetrySettings::default(),
            upload_retry: RetrySettings::default(),
        }
    }
}

impl SyncOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the manifest endpoint.
    pub fn with_manifest_url(mut self, manifest_url: impl Into<String>) -> Self {
        self.manifest_url = manifest_url.into();
        self
    }

    /// Set the prefix stripped from source URLs.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the scratch directory.
    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    /// Set the worker pool size.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the manifest request timeout.
    pub fn with_manifest_timeout(mut self, timeout: Duration) -> Self {
        self.manifest_timeout = timeout;
        self
    }

    /// Set the same retry budget for downloads and uploads.
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.download_retry = retry;
        self.upload_retry = retry;
        self
    }
}

/// Reports of one batch plus the shared upload counter.
#[derive(Debug, Clone)]
pub struct TransferBatch {
    /// One report per entry, in completion order.
    pub reports: Vec<TransferReport>,
    /// Final value of the atomic upload counter.
    pub uploads_succeeded: u64,
}

/// Drives transfer workers over a manifest.
pub struct SyncOrchestrator<S, C> {
    source: Arc<S>,
    storage: Arc<C>,
    bucket: String,
    options: SyncOptions,
}

impl<S, C> SyncOrchestrator<S, C>
where
    S: SourceClient + 'static,
    C: StorageClient + 'static,
{
    /// Create an orchestrator for `bucket` with default options.
    pub fn new(source: Arc<S>, storage: Arc<C>, bucket: impl Into<String>) -> Self {
        Self {
            source,
            storage,
            bucket: bucket.into(),
            options: SyncOptions::default(),
        }
    }

    /// Set run options.
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Perform one full mirror run.
    ///
    /// # Errors
    /// Only fatal pre-run failures are returned: an unreachable bucket, an
    /// unavailable manifest, or an unusable scratch directory. Per-file
    /// failures show up as `success == false` in the summary.
    pub async fn run(&self) -> Result<RunSummary, SyncError> {
        let start: Instant = Instant::now();

        self.storage
            .head_bucket(&self.bucket)
            .await
            .map_err(|source| {
                error!(bucket = %self.bucket, error = %source, "failed to check bucket");
                SyncError::BucketUnavailable {
                    bucket: self.bucket.clone(),
                    source,
                }
            })?;
        info!(bucket = %self.bucket, "bucket exists");

        let manifest: Manifest = fetch_manifest(
            self.source.as_ref(),
            &self.options.manifest_url,
            &self.options.base_url,
            self.options.manifest_timeout,
        )
        .await?;

        let scratch: ScratchDir = ScratchDir::create(&self.options.scratch_dir).await?;

        let batch: TransferBatch = self
            .run_all(manifest.entries(), self.options.max_concurrency)
            .await;

        let summary: RunSummary = RunSummary::summarize(
            manifest.len() as u64,
            scratch.file_count().await?,
            batch.uploads_succeeded,
            start.elapsed(),
        )
        .with_statistics(TransferStatistics::from_reports(&batch.reports));
        summary.log();

        scratch.finish(&summary).await?;
        Ok(summary)
    }

    /// Process entries on at most `max_concurrency` tasks.
    ///
    /// Reports are collected as tasks complete. A task that panics is turned
    /// into a `Worker` failure; its siblings keep running.
    pub async fn run_all(&self, entries: Vec<ManifestEntry>, max_concurrency: usize) -> TransferBatch {
        let worker: Arc<TransferWorker<S, C>> = Arc::new(
            TransferWorker::new(
                Arc::clone(&self.source),
                Arc::clone(&self.storage),
                self.bucket.clone(),
                self.options.scratch_dir.clone(),
            )
            .with_retry(self.options.download_retry, self.options.upload_retry),
        );
        let max_concurrency: usize = max_concurrency.max(1);

        let reports: Vec<TransferReport> = stream::iter(entries)
            .map(|entry| {
                let worker = Arc::clone(&worker);
                async move {
                    let span = info_span!("transfer", file = %entry.file_name);
                    let task_entry: ManifestEntry = entry.clone();
                    let task = tokio::spawn(
                        async move { worker.process(&task_entry).await }.instrument(span),
                    );

                    match task.await {
                        Ok(report) => report,
                        Err(join_err) => {
                            error!(file = %entry.file_name, error = %join_err, "transfer worker aborted");
                            TransferReport {
                                entry,
                                outcome: TransferOutcome::failed(TransferStage::Worker, join_err),
                                uploaded: false,
                            }
                        }
                    }
                }
            })
            .buffer_unordered(max_concurrency)
            .collect()
            .await;

        TransferBatch {
            reports,
            uploads_succeeded: worker.uploads_succeeded(),
        }
    }
}
