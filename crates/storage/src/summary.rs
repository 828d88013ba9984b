//! Run accounting.
//!
//! The downloaded-or-present count comes from listing the scratch directory
//! after every worker has finished, not from the worker outcomes, so a file
//! lost between download and disk shows up as a mismatch.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::types::TransferStatistics;

/// Final counts for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Regular files in the scratch directory after all workers joined.
    pub files_downloaded_or_present: u64,
    /// Successful uploads.
    pub files_uploaded: u64,
    /// URLs in the manifest.
    pub manifest_size: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
    /// All three counts agree.
    pub success: bool,
    /// Per-outcome tallies.
    pub statistics: TransferStatistics,
}

impl RunSummary {
    /// Build the summary and decide success.
    ///
    /// # Arguments
    /// * `manifest_size` - URLs in the manifest
    /// * `scratch_file_count` - Files found in the scratch directory
    /// * `uploads_succeeded` - Value of the shared upload counter
    /// * `elapsed` - Run duration
    pub fn summarize(
        manifest_size: u64,
        scratch_file_count: u64,
        uploads_succeeded: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            files_downloaded_or_present: scratch_file_count,
            files_uploaded: uploads_succeeded,
            manifest_size,
            elapsed,
            success: scratch_file_count == uploads_succeeded && uploads_succeeded == manifest_size,
            statistics: TransferStatistics::default(),
        }
    }

    /// Attach per-outcome tallies.
    pub fn with_statistics(mut self, statistics: TransferStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Emit the summary line.
    pub fn log(&self) {
        info!(
            downloaded = self.files_downloaded_or_present,
            uploaded = self.files_uploaded,
            manifest_size = self.manifest_size,
            fresh = self.statistics.downloaded,
            skipped = self.statistics.skipped,
            failed = self.statistics.failed,
            "Total number of successful downloads: {}, total number of successful uploads: {}, cost time: {:.2}s",
            self.files_downloaded_or_present,
            self.files_uploaded,
            self.elapsed.as_secs_f64()
        );
        if !self.success {
            warn!(
                downloaded = self.files_downloaded_or_present,
                uploaded = self.files_uploaded,
                manifest_size = self.manifest_size,
                "upload and download counts do not match"
            );
        }
    }
}

/// Count regular files directly inside `dir`.
///
/// # Errors
/// Returns error if the directory cannot be listed.
pub async fn count_scratch_files(dir: &Path) -> Result<u64, std::io::Error> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count: u64 = 0;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_when_all_counts_match() {
        let summary = RunSummary::summarize(2, 2, 2, Duration::from_millis(1500));
        assert!(summary.success);
        assert_eq!(summary.files_downloaded_or_present, 2);
        assert_eq!(summary.files_uploaded, 2);
        assert_eq!(summary.manifest_size, 2);
    }

    #[test]
    fn test_empty_manifest_is_success() {
        assert!(RunSummary::summarize(0, 0, 0, Duration::ZERO).success);
    }

    #[test]
    fn test_upload_shortfall_is_failure() {
        assert!(!RunSummary::summarize(3, 3, 2, Duration::ZERO).success);
    }

    #[test]
    fn test_missing_file_on_disk_is_failure() {
        assert!(!RunSummary::summarize(3, 2, 3, Duration::ZERO).success);
    }

    #[test]
    fn test_stray_file_is_failure() {
        assert!(!RunSummary::summarize(2, 3, 2, Duration::ZERO).success);
    }

    #[tokio::test]
    async fn test_count_scratch_files_ignores_directories() {
        let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f1.js"), b"1").unwrap();
        std::fs::write(dir.path().join("f2.js"), b"2").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(count_scratch_files(dir.path()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_count_scratch_files_missing_dir() {
        let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
        assert!(count_scratch_files(&dir.path().join("absent")).await.is_err());
    }
}
