//! Shared constants used across manifest-mirror crates.

use std::time::Duration;

/// Manifest endpoint listing the files to mirror.
pub const DEFAULT_MANIFEST_URL: &str = "https://webstatic.h3yun.com/lib/monaco-editor.json";

/// Prefix stripped from every source URL to form its destination key.
pub const DEFAULT_BASE_URL: &str = "https://cdn.bootcdn.net/";

/// Scratch directory name, relative to the working directory.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "tmp_js";

/// Timeout for the manifest request.
pub const DEFAULT_MANIFEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Ceiling for a single content download or upload.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

/// Connect timeout for HTTP transports.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total attempts per transfer stage (first try plus one retry).
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

/// Fixed delay between transfer attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for the worker pool size.
pub const MAX_CONCURRENCY_CAP: usize = 5;

/// Read buffer size used when hashing local files (64KB).
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;
