//! Manifest fetching and entry derivation.
//!
//! The manifest is a JSON array of absolute URLs. Each URL maps to a scratch
//! file named after its final path segment and to an object key formed by
//! stripping the configured base URL.
//!
//! Two URLs with the same final segment share one file name. The name-to-key
//! map keeps the last one, and both entries then point at that key. This is
//! logged but otherwise left alone.

use std::collections::HashMap;
use std::time::Duration;

use futures::TryStreamExt;
use manifest_mirror_common::{destination_key, file_name_from_url, PathError};
use tracing::{debug, warn};

use crate::error::{StorageError, SyncError};
use crate::traits::SourceClient;
use crate::types::ManifestEntry;

/// Parsed manifest: the URL list and the file-name to key map.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Source URLs in manifest order.
    urls: Vec<String>,
    /// File name of each URL, parallel to `urls`.
    file_names: Vec<String>,
    /// File name to destination key; last URL wins on collision.
    file_keys: HashMap<String, String>,
}

impl Manifest {
    /// Derive file names and keys for a list of source URLs.
    ///
    /// # Arguments
    /// * `urls` - Absolute source URLs
    /// * `base_url` - Prefix stripped to form each key
    ///
    /// # Errors
    /// Returns error if a URL is not absolute, has no file name, or yields an
    /// empty key.
    pub fn from_urls(urls: Vec<String>, base_url: &str) -> Result<Self, PathError> {
        let mut file_names: Vec<String> = Vec::with_capacity(urls.len());
        let mut file_keys: HashMap<String, String> = HashMap::with_capacity(urls.len());

        for url in &urls {
            let file_name: String = file_name_from_url(url)?;
            let key: String = destination_key(url, base_url);

            if key.is_empty() {
                return Err(PathError::EmptyDestinationKey { url: url.clone() });
            }
            if !url.starts_with(base_url) {
                warn!(url = %url, base_url, "URL does not start with base URL, using it whole as key");
            }
            if let Some(previous) = file_keys.insert(file_name.clone(), key.clone()) {
                if previous != key {
                    warn!(
                        file = %file_name,
                        previous_key = %previous,
                        key = %key,
                        "duplicate file name in manifest, last entry wins"
                    );
                }
            }

            file_names.push(file_name);
        }

        Ok(Self {
            urls,
            file_names,
            file_keys,
        })
    }

    /// Source URLs in manifest order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// File name to destination key map.
    pub fn file_keys(&self) -> &HashMap<String, String> {
        &self.file_keys
    }

    /// One entry per URL, keyed through the name map.
    pub fn entries(&self) -> Vec<ManifestEntry> {
        self.urls
            .iter()
            .zip(&self.file_names)
            .filter_map(|(url, file_name)| {
                self.file_keys.get(file_name).map(|key| ManifestEntry {
                    file_name: file_name.clone(),
                    source_url: url.clone(),
                    destination_key: key.clone(),
                })
            })
            .collect()
    }

    /// Number of URLs in the manifest.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the manifest lists no URLs.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Fetch and parse the manifest.
///
/// # Arguments
/// * `client` - Source transport
/// * `manifest_url` - Manifest endpoint
/// * `base_url` - Prefix stripped to form each key
/// * `timeout` - Bound on the whole request
///
/// # Errors
/// Returns `SyncError::ManifestUnavailable` on timeout, non-2xx status,
/// a body that is not a JSON array of strings, or an unusable URL.
pub async fn fetch_manifest<S>(
    client: &S,
    manifest_url: &str,
    base_url: &str,
    timeout: Duration,
) -> Result<Manifest, SyncError>
where
    S: SourceClient + ?Sized,
{
    let unavailable = |message: String| SyncError::ManifestUnavailable {
        url: manifest_url.to_string(),
        message,
    };

    let body: Vec<u8> = tokio::time::timeout(timeout, read_body(client, manifest_url, timeout))
        .await
        .map_err(|_| {
            unavailable(
                StorageError::Timeout {
                    url: manifest_url.to_string(),
                }
                .to_string(),
            )
        })?
        .map_err(|e| unavailable(e.to_string()))?;

    let urls: Vec<String> =
        serde_json::from_slice(&body).map_err(|e| unavailable(format!("malformed body: {}", e)))?;

    let manifest: Manifest =
        Manifest::from_urls(urls, base_url).map_err(|e| unavailable(e.to_string()))?;

    debug!(
        url = manifest_url,
        urls = manifest.len(),
        files = manifest.file_keys().len(),
        "fetched manifest"
    );
    Ok(manifest)
}

async fn read_body<S>(client: &S, url: &str, timeout: Duration) -> Result<Vec<u8>, StorageError>
where
    S: SourceClient + ?Sized,
{
    let mut stream = client.get(url, Some(timeout)).await?;
    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.try_next().await? {
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
