//! Scratch directory lifecycle.
//!
//! Created before transfers start. Removed only when the run summary reports
//! success; otherwise it is kept so the next run can reuse unchanged files.
//!
//! Downloads land in hidden `.part` files first. A run killed mid-download
//! leaves one behind, so `create` sweeps them before any worker starts.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::summary::{count_scratch_files, RunSummary};

/// Suffix of in-progress download files.
pub(crate) const PART_FILE_SUFFIX: &str = ".part";

/// Name of the in-progress file for `file_name`, unique per attempt.
pub(crate) fn part_file_name(file_name: &str, unique: &str) -> String {
    format!(".{}.{}{}", file_name, unique, PART_FILE_SUFFIX)
}

fn is_part_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PART_FILE_SUFFIX)
}

/// Local directory holding downloaded files pending upload.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create the directory (and parents) if missing and remove partial
    /// downloads left by an interrupted run.
    ///
    /// # Errors
    /// Returns `SyncError::ScratchDirectory` if it cannot be created or
    /// cleaned.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path: PathBuf = path.into();
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| scratch_error(&path, e))?;

        let removed: u64 = remove_part_files(&path)
            .await
            .map_err(|e| scratch_error(&path, e))?;
        if removed > 0 {
            warn!(path = %path.display(), removed, "removed partial downloads from an earlier run");
        }

        debug!(path = %path.display(), "scratch directory ready");
        Ok(Self { path })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Regular files currently in the directory.
    ///
    /// # Errors
    /// Returns `SyncError::ScratchDirectory` if it cannot be listed.
    pub async fn file_count(&self) -> Result<u64, SyncError> {
        count_scratch_files(&self.path)
            .await
            .map_err(|e| scratch_error(&self.path, e))
    }

    /// Remove the directory if the run succeeded, keep it otherwise.
    ///
    /// Returns whether the directory was removed.
    ///
    /// # Errors
    /// Returns `SyncError::ScratchDirectory` if removal fails.
    pub async fn finish(self, summary: &RunSummary) -> Result<bool, SyncError> {
        if !summary.success {
            warn!(path = %self.path.display(), "keeping scratch directory for the next run");
            return Ok(false);
        }

        tokio::fs::remove_dir_all(&self.path)
            .await
            .map_err(|e| scratch_error(&self.path, e))?;
        info!(
            path = %self.path.display(),
            "upload and download counts match, removed scratch directory"
        );
        Ok(true)
    }
}

async fn remove_part_files(dir: &Path) -> Result<u64, std::io::Error> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed: u64 = 0;
    while let Some(entry) = entries.next_entry().await? {
        let is_part: bool = entry.file_name().to_str().is_some_and(is_part_file);
        if is_part && entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path()).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn scratch_error(path: &Path, err: std::io::Error) -> SyncError {
    SyncError::ScratchDirectory {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
