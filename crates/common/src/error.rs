//! Shared error types used across manifest-mirror crates.

use thiserror::Error;

/// Errors deriving a file name or destination key from a source URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The URL could not be parsed as an absolute URL.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The URL path has no final segment to use as a file name.
    #[error("URL has no file name: {url}")]
    MissingFileName {
        /// The offending URL.
        url: String,
    },

    /// Stripping the base prefix left nothing to use as an object key.
    #[error("URL {url} yields an empty destination key")]
    EmptyDestinationKey {
        /// The offending URL.
        url: String,
    },
}
