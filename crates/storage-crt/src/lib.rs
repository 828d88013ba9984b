//! AWS SDK S3 backend for manifest-mirror.
//!
//! This crate provides a `StorageClient` implementation using the AWS SDK for
//! Rust, pointed at any S3-compatible endpoint (Aliyun OSS, MinIO, AWS S3).
//!
//! # Example
//!
//! ```ignore
//! use manifest_mirror_storage::{Credentials, StorageSettings};
//! use manifest_mirror_storage_crt::{region_from_endpoint, CrtStorageClient};
//!
//! let endpoint = "https://oss-cn-shenzhen.aliyuncs.com";
//! let settings = StorageSettings::new(endpoint, Credentials::new("id", "secret"))
//!     .with_region(region_from_endpoint(endpoint));
//! let client = CrtStorageClient::new(settings).await?;
//! ```

mod client;
mod error;

pub use client::{normalize_endpoint, region_from_endpoint, CrtStorageClient};
pub use error::CrtError;
