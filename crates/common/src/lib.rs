//! Shared types and utilities for manifest-mirror.
//!
//! This crate provides common functionality used across all manifest-mirror crates:
//! - Content digest computation (xxh3-128)
//! - Source URL to file name / destination key derivation
//! - Shared constants and error types

pub mod constants;
pub mod error;
pub mod hash;
pub mod path_utils;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::PathError;
pub use hash::{hash_bytes, hash_file, ContentDigest, Xxh3Hasher};
pub use path_utils::{
    clamp_concurrency, default_max_concurrency, destination_key, file_name_from_url,
};
