//! Source URL to local file name and object key derivation.

use url::Url;

use crate::constants::MAX_CONCURRENCY_CAP;
use crate::error::PathError;

/// Extract the final path segment of an absolute URL.
///
/// Query strings and fragments are not part of the name.
///
/// # Arguments
/// * `source_url` - Absolute URL of the file
///
/// # Errors
/// Returns error if the URL is not absolute or ends in `/`.
pub fn file_name_from_url(source_url: &str) -> Result<String, PathError> {
    let parsed: Url = Url::parse(source_url).map_err(|e| PathError::InvalidUrl {
        url: source_url.to_string(),
        message: e.to_string(),
    })?;

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PathError::MissingFileName {
            url: source_url.to_string(),
        })
}

/// Derive the object key for a source URL.
///
/// Strips `base_url` when the URL starts with it literally; otherwise the
/// whole URL is kept. Query string and fragment are dropped, matching
/// [`file_name_from_url`], so the key always ends in the scratch file name.
///
/// # Arguments
/// * `source_url` - Absolute URL of the file
/// * `base_url` - Prefix to strip
pub fn destination_key(source_url: &str, base_url: &str) -> String {
    let without_query: &str = source_url
        .split(['?', '#'])
        .next()
        .unwrap_or(source_url);
    without_query
        .strip_prefix(base_url)
        .unwrap_or(without_query)
        .to_string()
}

/// Default worker pool size: a third of the CPUs, clamped to `[1, 5]`.
pub fn default_max_concurrency() -> usize {
    clamp_concurrency(num_cpus::get() / 3)
}

/// Clamp a requested pool size to `[1, MAX_CONCURRENCY_CAP]`.
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, MAX_CONCURRENCY_CAP)
}
