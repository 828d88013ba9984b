//! Shared data structures for storage and sync operations.

use std::fmt;
use std::time::Duration;

use manifest_mirror_common::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};

use crate::error::{TransferFailure, TransferStage};

/// Default region when the endpoint does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for the object store.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// S3-compatible endpoint URL (e.g. `https://oss-cn-shenzhen.aliyuncs.com`).
    pub endpoint: String,
    /// Signing region.
    pub region: String,
    /// Static credentials.
    pub credentials: Credentials,
    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`.
    pub force_path_style: bool,
}

impl StorageSettings {
    /// Create settings for an endpoint with static credentials.
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: DEFAULT_REGION.to_string(),
            credentials,
            force_path_style: false,
        }
    }

    /// Set the signing region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Use path-style bucket addressing.
    pub fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }
}

/// Access key pair for the object store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Fixed-delay retry settings for one transfer stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetrySettings {
    /// Create retry settings.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// One file to mirror, derived from a manifest URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Final path segment of the source URL; the scratch file name.
    pub file_name: String,
    /// Absolute URL to download from.
    pub source_url: String,
    /// Object key in the bucket. Never empty.
    pub destination_key: String,
}

/// Why a download was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Local copy digest equals the remote digest.
    ContentIdentical,
}

/// Result of processing one manifest entry.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    /// Existing local copy reused.
    Skipped(SkipReason),
    /// Fresh copy downloaded to the scratch directory.
    Downloaded,
    /// The entry could not be mirrored.
    Failed(TransferFailure),
}

impl TransferOutcome {
    /// Build a failed outcome.
    pub fn failed(stage: TransferStage, cause: impl fmt::Display) -> Self {
        TransferOutcome::Failed(TransferFailure::new(stage, cause))
    }

    /// Whether this outcome is a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, TransferOutcome::Failed(_))
    }

    /// Failed stage, if any.
    pub fn failed_stage(&self) -> Option<TransferStage> {
        match self {
            TransferOutcome::Failed(failure) => Some(failure.stage),
            _ => None,
        }
    }
}

/// Outcome of one worker, paired with its entry.
#[derive(Debug, Clone)]
pub struct TransferReport {
    pub entry: ManifestEntry,
    pub outcome: TransferOutcome,
    /// The object was written to the bucket.
    pub uploaded: bool,
}

/// Per-outcome tallies over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStatistics {
    /// Fresh downloads.
    pub downloaded: u64,
    /// Local copies reused.
    pub skipped: u64,
    /// Entries that failed at any stage.
    pub failed: u64,
    /// Objects written to the bucket.
    pub uploaded: u64,
}

impl TransferStatistics {
    /// Fold worker reports into tallies.
    pub fn from_reports(reports: &[TransferReport]) -> Self {
        let mut stats = Self::default();
        for report in reports {
            stats.record(report);
        }
        stats
    }

    /// Add one report.
    pub fn record(&mut self, report: &TransferReport) {
        match report.outcome {
            TransferOutcome::Skipped(_) => self.skipped += 1,
            TransferOutcome::Downloaded => self.downloaded += 1,
            TransferOutcome::Failed(_) => self.failed += 1,
        }
        if report.uploaded {
            self.uploaded += 1;
        }
    }
}
