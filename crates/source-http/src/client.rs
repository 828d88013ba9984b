//! reqwest client implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use manifest_mirror_common::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TRANSFER_TIMEOUT};
use manifest_mirror_storage::{ByteStream, SourceClient, StorageError};
use tracing::debug;

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("manifest-mirror/", env!("CARGO_PKG_VERSION"));

/// Transport settings for the HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Bound on establishing a connection.
    pub connect_timeout: Duration,
    /// Ceiling for a whole request, body included, unless the caller passes
    /// a shorter one.
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_TRANSFER_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpSettings {
    /// Set the transport ceiling.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// SourceClient implementation using reqwest.
///
/// The inner client pools connections and is shared by every worker.
#[derive(Debug, Clone)]
pub struct ReqwestSourceClient {
    client: reqwest::Client,
}

impl ReqwestSourceClient {
    /// Create a client from transport settings.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidConfig` if the TLS backend or the user
    /// agent cannot be set up.
    pub fn new(settings: HttpSettings) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(|e| StorageError::InvalidConfig {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceClient for ReqwestSourceClient {
    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<ByteStream, StorageError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| map_reqwest_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(url, status = status.as_u16(), content_length = ?response.content_length(), "response received");

        let owned_url: String = url.to_string();
        Ok(response
            .bytes_stream()
            .map_err(move |e| map_reqwest_error(&owned_url, e))
            .boxed())
    }
}

/// Map a transport error onto the shared taxonomy.
///
/// Request construction errors (bad URL, bad header) are not retryable;
/// every other transport failure is.
fn map_reqwest_error(url: &str, err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        return StorageError::Timeout {
            url: url.to_string(),
        };
    }
    if let Some(status) = err.status() {
        return StorageError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        };
    }
    StorageError::NetworkError {
        message: format!("{}: {}", url, err),
        retryable: !err.is_builder(),
    }
}
