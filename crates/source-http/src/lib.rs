//! HTTP content source for manifest-mirror.
//!
//! Provides a `SourceClient` backed by `reqwest`. Bodies are streamed chunk
//! by chunk so neither hashing nor downloading buffers a whole file.
//!
//! # Example
//!
//! ```ignore
//! use manifest_mirror_source_http::{HttpSettings, ReqwestSourceClient};
//!
//! let source = ReqwestSourceClient::new(HttpSettings::default())?;
//! let stream = source.get("https://cdn.bootcdn.net/a/f1.js", None).await?;
//! ```

mod client;

pub use client::{HttpSettings, ReqwestSourceClient, DEFAULT_USER_AGENT};
