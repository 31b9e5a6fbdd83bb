//! Errors produced while building loaders or resolving images.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Failure to resolve one image reference.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssetError {
    /// An inline reference had no `,` separating header and payload.
    #[error("inline image reference has no payload")]
    MissingPayload,
    /// The inline payload was not valid base64.
    #[error("inline image payload is not valid base64: {source}")]
    Base64 {
        /// Decoder error.
        source: base64::DecodeError,
    },
    /// A remote reference was not a valid URL.
    #[error("invalid image URL {url}: {source}")]
    InvalidUrl {
        /// Offending reference.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs} seconds")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The server answered with an error status.
    #[error("request to {url} failed with status {status}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The request failed before a response arrived.
    #[error("network error fetching {url}: {source}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error.
        source: reqwest::Error,
    },
    /// A local file could not be read.
    #[error("failed to read image {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The bytes were not a supported image.
    #[error("failed to decode image {reference}: {source}")]
    Decode {
        /// Reference the bytes came from.
        reference: String,
        /// Decoder error.
        source: image::ImageError,
    },
}

/// Failure to construct an [`crate::AssetLoader`] or [`crate::AssetPipeline`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssetBuildError {
    /// The HTTP client could not be configured.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// The background runtime could not be started.
    #[error("failed to start asset runtime: {0}")]
    Runtime(#[source] io::Error),
}
