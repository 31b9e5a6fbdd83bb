//! Resolve image references to decoded RGBA bitmaps.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use camino::Utf8Path;
use cartosync_core::Size;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use log::{debug, warn};
use reqwest::Client;
use url::Url;

use crate::cache::ImageCache;
use crate::error::{AssetBuildError, AssetError};
use crate::source::{ImageSource, inline_payload};

/// Default user agent for image requests.
pub const DEFAULT_USER_AGENT: &str = concat!("cartosync/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP settings for an [`AssetLoader`].
#[derive(Debug, Clone)]
pub struct AssetLoaderConfig {
    /// Connect and total request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with remote requests.
    pub user_agent: String,
}

impl Default for AssetLoaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl AssetLoaderConfig {
    /// Configuration with default timeout and user agent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Loads images from inline data, HTTP or the filesystem.
///
/// Cloning is cheap: clones share the HTTP connection pool and the cache.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    client: Client,
    cache: ImageCache,
    config: AssetLoaderConfig,
}

impl AssetLoader {
    /// Create a loader with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`AssetBuildError::HttpClient`] if the HTTP client cannot be
    /// built.
    pub fn new(cache: ImageCache) -> Result<Self, AssetBuildError> {
        Self::with_config(cache, AssetLoaderConfig::default())
    }

    /// Create a loader with explicit HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`AssetBuildError::HttpClient`] if the HTTP client cannot be
    /// built.
    pub fn with_config(
        cache: ImageCache,
        config: AssetLoaderConfig,
    ) -> Result<Self, AssetBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(AssetBuildError::HttpClient)?;
        Ok(Self {
            client,
            cache,
            config,
        })
    }

    /// The cache this loader reads and fills.
    #[must_use]
    pub const fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// The HTTP settings in use.
    #[must_use]
    pub const fn config(&self) -> &AssetLoaderConfig {
        &self.config
    }

    /// Resolve `reference`, consulting the cache first and caching a
    /// successful decode.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetError`] describing why the bytes could not be
    /// obtained or decoded. Failures are not cached.
    pub async fn try_resolve(&self, reference: &str) -> Result<Arc<RgbaImage>, AssetError> {
        if let Some(hit) = self.cache.get(reference) {
            return Ok(hit);
        }
        let source = ImageSource::classify(reference);
        debug!("loading {} image '{reference}'", source.kind());
        let bytes = match source {
            ImageSource::Inline(data) => decode_inline(data)?,
            ImageSource::Remote(url) => self.fetch(url).await?,
            ImageSource::Local(path) => read_local(path)?,
        };
        let decoded = image::load_from_memory(&bytes)
            .map_err(|source| AssetError::Decode {
                reference: reference.to_owned(),
                source,
            })?
            .to_rgba8();
        let shared = Arc::new(decoded);
        self.cache.insert(reference, Arc::clone(&shared));
        Ok(shared)
    }

    /// Resolve `reference`, logging and swallowing any failure.
    pub async fn resolve(&self, reference: &str) -> Option<Arc<RgbaImage>> {
        match self.try_resolve(reference).await {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("image '{reference}' could not be loaded: {err}");
                None
            }
        }
    }

    /// Resolve `reference` and scale it to `size`. The cache keeps the
    /// original; a size that rounds below one pixel leaves it unscaled.
    pub async fn resolve_sized(
        &self,
        reference: &str,
        size: Option<Size>,
    ) -> Option<Arc<RgbaImage>> {
        let original = self.resolve(reference).await?;
        let Some((width, height)) = size.and_then(pixel_dimensions) else {
            return Some(original);
        };
        if original.dimensions() == (width, height) {
            return Some(original);
        }
        Some(Arc::new(imageops::resize(
            &*original,
            width,
            height,
            FilterType::Triangle,
        )))
    }

    /// Resolve several references concurrently, preserving input order.
    pub async fn resolve_many(&self, references: &[String]) -> Vec<Option<Arc<RgbaImage>>> {
        let tasks: Vec<_> = references
            .iter()
            .map(|reference| {
                let loader = self.clone();
                let owned = reference.clone();
                tokio::spawn(async move { loader.resolve(&owned).await })
            })
            .collect();
        let mut images = Vec::with_capacity(tasks.len());
        for task in tasks {
            images.push(task.await.unwrap_or_else(|err| {
                warn!("image load task failed: {err}");
                None
            }));
        }
        images
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
        let url = Url::parse(reference).map_err(|source| AssetError::InvalidUrl {
            url: reference.to_owned(),
            source,
        })?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, reference))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err, reference))?;
        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(err, reference))?;
        Ok(body.to_vec())
    }

    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> AssetError {
        if error.is_timeout() {
            return AssetError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return AssetError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
            };
        }
        AssetError::Network {
            url: url.to_owned(),
            source: error,
        }
    }
}

fn decode_inline(reference: &str) -> Result<Vec<u8>, AssetError> {
    let payload = inline_payload(reference).ok_or(AssetError::MissingPayload)?;
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|source| AssetError::Base64 { source })
}

fn read_local(path: &Utf8Path) -> Result<Vec<u8>, AssetError> {
    cartosync_fs::read_bytes(path).map_err(|source| AssetError::Read {
        path: path.to_owned(),
        source,
    })
}

fn pixel_dimensions(size: Size) -> Option<(u32, u32)> {
    Some((pixels(size.width)?, pixels(size.height)?))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is finite, at least one and clamped to u32::MAX"
)]
fn pixels(extent: f64) -> Option<u32> {
    let rounded = extent.round();
    (rounded.is_finite() && rounded >= 1.0).then(|| rounded.min(f64::from(u32::MAX)) as u32)
}
