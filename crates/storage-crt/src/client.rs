//! AWS SDK S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Region, RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;
use url::Url;

use manifest_mirror_storage::{StorageClient, StorageError, StorageSettings, DEFAULT_REGION};

use crate::error::CrtError;

/// StorageClient implementation using AWS SDK for Rust.
///
/// Talks to any S3-compatible endpoint with static credentials. The SDK's own
/// retry layer is disabled: every call is a single attempt and retries come
/// from the caller's budget.
pub struct CrtStorageClient {
    /// The underlying S3 client.
    s3_client: S3Client,
}

impl CrtStorageClient {
    /// Create a new CRT storage client for an S3-compatible endpoint.
    ///
    /// # Arguments
    /// * `settings` - Endpoint, region, credentials and addressing style
    ///
    /// # Returns
    /// A new CRT storage client.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidConfig` if the endpoint is empty or not a
    /// valid URL.
    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        let endpoint: String = normalize_endpoint(&settings.endpoint)?;

        let credentials = Credentials::new(
            &settings.credentials.access_key_id,
            &settings.credentials.access_key_secret,
            None,
            None,
            "manifest-mirror",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .endpoint_url(&endpoint)
            .load()
            .await;

        // S3-compatible stores do not all accept the SDK's default checksums.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        debug!(
            endpoint = %endpoint,
            region = %settings.region,
            force_path_style = settings.force_path_style,
            "created S3 client"
        );
        Ok(Self::from_client(S3Client::from_conf(s3_config)))
    }

    /// Create a client from an existing S3Client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    pub fn from_client(s3_client: S3Client) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl StorageClient for CrtStorageClient {
    async fn head_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let err = match self.s3_client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        let not_found: bool = err
            .as_service_error()
            .is_some_and(|service_err| service_err.is_not_found());
        let crt_err: CrtError = CrtError::from_sdk(&err);

        if not_found || crt_err.status() == Some(404) {
            return Err(StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            });
        }
        if crt_err.status() == Some(403) {
            return Err(StorageError::AccessDenied {
                bucket: bucket.to_string(),
                message: crt_err.to_string(),
            });
        }
        Err(crt_err.into())
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &Path,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let body = ByteStream::from_path(file_path).await.map_err(|e| CrtError::IoError {
            path: file_path.display().to_string(),
            source: std::io::Error::other(e),
        })?;

        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|err| StorageError::from(CrtError::from_sdk(&err)))?;

        debug!(bucket, key, "put object");
        Ok(())
    }
}

/// Ensure the endpoint carries a scheme; bare hosts get `https://`.
///
/// # Errors
/// Returns `StorageError::InvalidConfig` if the endpoint is empty or does not
/// parse as a URL with a host.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, StorageError> {
    let trimmed: &str = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(CrtError::ConfigError("endpoint must not be empty".into()).into());
    }

    let candidate: String = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    match Url::parse(&candidate) {
        Ok(url) if url.host_str().is_some() => Ok(candidate),
        Ok(_) => Err(CrtError::ConfigError(format!("endpoint has no host: {}", endpoint)).into()),
        Err(e) => {
            Err(CrtError::ConfigError(format!("invalid endpoint {}: {}", endpoint, e)).into())
        }
    }
}

/// Derive the signing region from an Aliyun OSS endpoint.
///
/// `oss-cn-shenzhen.aliyuncs.com` yields `oss-cn-shenzhen`; the `-internal`
/// variant maps to the same region. Anything else yields `us-east-1`.
pub fn region_from_endpoint(endpoint: &str) -> String {
    let host: String = normalize_endpoint(endpoint)
        .ok()
        .and_then(|e| Url::parse(&e).ok())
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default();

    if !host.ends_with(".aliyuncs.com") {
        return DEFAULT_REGION.to_string();
    }

    match host.split('.').next() {
        Some(label) if label.starts_with("oss-") && label.len() > "oss-".len() => label
            .strip_suffix("-internal")
            .unwrap_or(label)
            .to_string(),
        _ => DEFAULT_REGION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest_mirror_storage::Credentials as StaticCredentials;

    #[test]
    fn test_crt_client_implements_storage_client() {
        // This is a compile-time test to ensure the trait is implemented correctly
        fn assert_storage_client<T: StorageClient>() {}
        assert_storage_client::<CrtStorageClient>();
    }

    #[test]
    fn test_region_from_oss_endpoint() {
        assert_eq!(
            region_from_endpoint("https://oss-cn-shenzhen.aliyuncs.com"),
            "oss-cn-shenzhen"
        );
        assert_eq!(
            region_from_endpoint("oss-cn-hangzhou.aliyuncs.com"),
            "oss-cn-hangzhou"
        );
        assert_eq!(
            region_from_endpoint("http://oss-cn-beijing-internal.aliyuncs.com/"),
            "oss-cn-beijing"
        );
    }

    #[test]
    fn test_region_from_other_endpoint() {
        assert_eq!(region_from_endpoint("http://localhost:9000"), "us-east-1");
        assert_eq!(region_from_endpoint("https://s3.amazonaws.com"), "us-east-1");
        assert_eq!(region_from_endpoint("https://cdn.aliyuncs.com"), "us-east-1");
        assert_eq!(region_from_endpoint(""), "us-east-1");
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("oss-cn-shenzhen.aliyuncs.com").unwrap(),
            "https://oss-cn-shenzhen.aliyuncs.com"
        );
        assert_eq!(
            normalize_endpoint("http://127.0.0.1:9000/").unwrap(),
            "http://127.0.0.1:9000"
        );
        assert!(matches!(
            normalize_endpoint("   "),
            Err(StorageError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_new_with_static_credentials() {
        let settings = StorageSettings::new(
            "http://127.0.0.1:9000",
            StaticCredentials::new("test-id", "test-secret"),
        )
        .with_force_path_style(true);

        assert!(CrtStorageClient::new(settings).await.is_ok());
    }

    #[tokio::test]
    async fn test_new_disables_sdk_retries() {
        let settings = StorageSettings::new(
            "https://oss-cn-shenzhen.aliyuncs.com",
            StaticCredentials::new("test-id", "test-secret"),
        );
        let client = CrtStorageClient::new(settings).await.unwrap();

        let retry_config: &RetryConfig = client.s3_client.config().retry_config().unwrap();
        assert_eq!(retry_config.max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_new_rejects_empty_endpoint() {
        let settings = StorageSettings::new("", StaticCredentials::new("id", "secret"));
        assert!(matches!(
            CrtStorageClient::new(settings).await,
            Err(StorageError::InvalidConfig { .. })
        ));
    }
}
