//! Requests for images loaded off the UI thread.
//!
//! Reconcilers never block on image loading. They submit an [`AssetRequest`]
//! to an [`AssetSink`] and the host later feeds the matching
//! [`AssetCompletion`] back through the controller, which drops it if the
//! overlay has gone or now points at a different image.

use crate::geometry::Size;

/// The overlay an image is destined for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum AssetTarget {
    /// Image of a custom-style marker.
    MarkerImage {
        /// Marker identifier.
        id: String,
    },
    /// Texture of a polyline.
    PolylineTexture {
        /// Polyline identifier.
        id: String,
    },
}

impl AssetTarget {
    /// Identifier of the target overlay.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::MarkerImage { id } | Self::PolylineTexture { id } => id,
        }
    }
}

/// One image to load for one live overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest<H> {
    /// Overlay that will receive the image.
    pub target: AssetTarget,
    /// Handle of that overlay when the request was made.
    pub handle: H,
    /// Image reference: URL, data URI or local path.
    pub reference: String,
    /// Display size to scale to, if any.
    pub size: Option<Size>,
}

/// Outcome of an [`AssetRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCompletion<H, I> {
    /// The request this answers.
    pub request: AssetRequest<H>,
    /// Decoded image, or `None` if loading failed.
    pub image: Option<I>,
}

impl<H, I> AssetCompletion<H, I> {
    /// Convert the image payload, keeping the request.
    #[must_use]
    pub fn map_image<J>(self, convert: impl FnOnce(I) -> J) -> AssetCompletion<H, J> {
        AssetCompletion {
            request: self.request,
            image: self.image.map(convert),
        }
    }
}

/// Accepts image requests without blocking the caller.
pub trait AssetSink<H> {
    /// Queue `request`. Implementations must return promptly.
    fn submit(&self, request: AssetRequest<H>);
}

impl<H, T: AssetSink<H> + ?Sized> AssetSink<H> for &T {
    fn submit(&self, request: AssetRequest<H>) {
        (**self).submit(request);
    }
}
