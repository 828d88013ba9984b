//! Manifest-driven mirroring of remote files into object storage.
//!
//! This crate is the core of manifest-mirror. It works with any
//! `SourceClient` (where files come from) and any `StorageClient` (where they
//! go), and provides:
//!
//! - **Manifest fetching** - JSON list of URLs to file-name / object-key pairs
//! - **Transfer workers** - digest comparison, conditional download, upload,
//!   with a fixed-delay retry per stage
//! - **Coordination** - bounded parallel workers with panic isolation
//! - **Accounting** - scratch-file and upload counts decide run success
//! - **Scratch lifecycle** - the directory is removed only after a clean run
//!
//! # Failure model
//!
//! A missing bucket or an unavailable manifest aborts the run with a
//! [`SyncError`]. Everything after that is per file: a failed download, hash
//! or upload is recorded as [`TransferOutcome::Failed`] and the other files
//! carry on.

mod error;
mod manifest;
mod retry;
mod scratch;
mod summary;
mod sync;
mod traits;
mod transfer;
mod types;

pub use error::{StorageError, SyncError, TransferFailure, TransferStage};
pub use manifest::{fetch_manifest, Manifest};
pub use retry::retry_with_fixed_delay;
pub use scratch::ScratchDir;
pub use summary::{count_scratch_files, RunSummary};
pub use sync::{SyncOptions, SyncOrchestrator, TransferBatch};
pub use traits::{ByteStream, SourceClient, StorageClient};
pub use transfer::{content_type_for_key, TransferWorker};
pub use types::{
    Credentials, ManifestEntry, RetrySettings, SkipReason, StorageSettings, TransferOutcome,
    TransferReport, TransferStatistics, DEFAULT_REGION,
};
