//! Run configuration assembled from arguments and environment.

use anyhow::{bail, Context, Result};
use manifest_mirror_storage::{Credentials, StorageSettings, SyncOptions};
use manifest_mirror_storage_crt::region_from_endpoint;

use crate::cli::Cli;

pub const ENV_MANIFEST_URL: &str = "MANIFEST_MIRROR_MANIFEST_URL";
pub const ENV_BASE_URL: &str = "MANIFEST_MIRROR_BASE_URL";
pub const ENV_SCRATCH_DIR: &str = "MANIFEST_MIRROR_SCRATCH_DIR";
pub const ENV_MAX_CONCURRENCY: &str = "MANIFEST_MIRROR_MAX_CONCURRENCY";

/// Everything one run needs. Built once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageSettings,
    pub bucket: String,
    pub sync: SyncOptions,
}

impl AppConfig {
    /// Build from parsed arguments and the process environment.
    ///
    /// # Errors
    /// Returns an error for an empty endpoint or bucket, or an unparseable
    /// concurrency override.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        Self::from_parts(cli, |key| std::env::var(key).ok())
    }

    fn from_parts(cli: Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if cli.endpoint.trim().is_empty() {
            bail!("endpoint must not be empty");
        }
        if cli.bucket_name.trim().is_empty() {
            bail!("bucket name must not be empty");
        }

        // Unset and empty variables both fall back to the default.
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut sync: SyncOptions = SyncOptions::default();
        if let Some(manifest_url) = env(ENV_MANIFEST_URL) {
            sync = sync.with_manifest_url(manifest_url);
        }
        if let Some(base_url) = env(ENV_BASE_URL) {
            sync = sync.with_base_url(base_url);
        }
        if let Some(scratch_dir) = env(ENV_SCRATCH_DIR) {
            sync = sync.with_scratch_dir(scratch_dir);
        }
        if let Some(raw) = env(ENV_MAX_CONCURRENCY) {
            let max_concurrency: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid {ENV_MAX_CONCURRENCY}: {raw:?}"))?;
            if max_concurrency == 0 {
                bail!("{ENV_MAX_CONCURRENCY} must be at least 1");
            }
            sync = sync.with_max_concurrency(max_concurrency);
        }

        let storage: StorageSettings = StorageSettings::new(
            cli.endpoint.trim(),
            Credentials::new(cli.access_key_id, cli.access_key_secret),
        )
        .with_region(region_from_endpoint(&cli.endpoint));

        Ok(Self {
            storage,
            bucket: cli.bucket_name,
            sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use manifest_mirror_common::{DEFAULT_BASE_URL, DEFAULT_MANIFEST_URL};

    fn cli(endpoint: &str, bucket: &str) -> Cli {
        Cli {
            endpoint: endpoint.to_string(),
            bucket_name: bucket.to_string(),
            access_key_id: "id".to_string(),
            access_key_secret: "secret".to_string(),
        }
    }

    fn with_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_parts(
            cli("oss-cn-shenzhen.aliyuncs.com", "static-assets"),
            with_env(&[]),
        )
        .unwrap();

        assert_eq!(config.bucket, "static-assets");
        assert_eq!(config.storage.region, "oss-cn-shenzhen");
        assert_eq!(config.storage.credentials.access_key_id, "id");
        assert_eq!(config.sync.manifest_url, DEFAULT_MANIFEST_URL);
        assert_eq!(config.sync.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.sync.scratch_dir, PathBuf::from("tmp_js"));
        assert!((1..=5).contains(&config.sync.max_concurrency));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_parts(
            cli("http://127.0.0.1:9000", "bucket"),
            with_env(&[
                (ENV_MANIFEST_URL, "https://origin/manifest.json"),
                (ENV_BASE_URL, "https://origin/"),
                (ENV_SCRATCH_DIR, "/var/tmp/mirror"),
                (ENV_MAX_CONCURRENCY, "8"),
            ]),
        )
        .unwrap();

        assert_eq!(config.storage.region, "us-east-1");
        assert_eq!(config.sync.manifest_url, "https://origin/manifest.json");
        assert_eq!(config.sync.base_url, "https://origin/");
        assert_eq!(config.sync.scratch_dir, PathBuf::from("/var/tmp/mirror"));
        assert_eq!(config.sync.max_concurrency, 8);
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let config =
            AppConfig::from_parts(cli("endpoint", "bucket"), with_env(&[(ENV_BASE_URL, "")]))
                .unwrap();
        assert_eq!(config.sync.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_concurrency_is_rejected() {
        for raw in ["zero", "-1", "0"] {
            let result = AppConfig::from_parts(
                cli("endpoint", "bucket"),
                with_env(&[(ENV_MAX_CONCURRENCY, raw)]),
            );
            assert!(result.is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn test_empty_bucket_is_rejected() {
        assert!(AppConfig::from_parts(cli("endpoint", " "), with_env(&[])).is_err());
        assert!(AppConfig::from_parts(cli("", "bucket"), with_env(&[])).is_err());
    }
}
