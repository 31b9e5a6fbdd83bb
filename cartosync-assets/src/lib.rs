//! Image loading for marker images and polyline textures.
//!
//! [`AssetLoader`] turns an image reference into a decoded RGBA bitmap. A
//! reference is classified by prefix ([`ImageSource::classify`]): inline
//! `data:image` URIs are decoded in place, `http(s)://` URLs are fetched with
//! `reqwest`, and anything else is read from the local filesystem. Decoded
//! originals are kept in an injectable [`ImageCache`] keyed by the exact
//! reference string.
//!
//! [`AssetPipeline`] runs loads on a background Tokio runtime and hands the
//! finished [`cartosync_core::AssetCompletion`]s back to the UI thread
//! through a channel, so reconciliation never waits on the network.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod error;
mod loader;
mod pipeline;
mod source;

pub use cache::ImageCache;
pub use error::{AssetBuildError, AssetError};
pub use loader::{AssetLoader, AssetLoaderConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use pipeline::{AssetPipeline, DEFAULT_WORKER_THREADS, LoadedImage};
pub use source::ImageSource;

#[cfg(test)]
pub(crate) mod test_support;
