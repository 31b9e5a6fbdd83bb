//! The rendering surface the reconcilers drive.
//!
//! A [`MapSurface`] is the host map view: it creates overlays from
//! descriptors, hands back opaque handles and applies patches. Every call is
//! made from the thread that owns the controller.

use std::fmt::Debug;
use std::hash::Hash;

use geo::Coord;

use crate::clustering::ClusterRepresentative;
use crate::geometry::Point;
use crate::marker::{FieldChange, Marker};
use crate::polyline::Polyline;

/// What to create on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayDescriptor<'a> {
    /// A marker view built from its record.
    Marker(&'a Marker),
    /// A polyline built from its record.
    Polyline(&'a Polyline),
    /// A cluster badge.
    Cluster(&'a ClusterRepresentative),
}

/// An in-place modification of a live overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPatch<'a> {
    /// One marker field changed.
    Marker(&'a FieldChange),
    /// A cluster moved or changed its member count.
    Cluster(&'a ClusterRepresentative),
}

/// Host map view driven by the reconcilers.
///
/// Handles are opaque, cheap to copy and unique among live overlays.
pub trait MapSurface {
    /// Identity of a live overlay.
    type Handle: Copy + Eq + Hash + Debug;
    /// Decoded bitmap accepted by [`MapSurface::set_image`].
    type Image;

    /// Create an overlay and return its handle.
    fn add_overlay(&mut self, descriptor: OverlayDescriptor<'_>) -> Self::Handle;

    /// Destroy an overlay. Unknown handles are ignored.
    fn remove_overlay(&mut self, handle: Self::Handle);

    /// Patch an overlay in place.
    fn update_overlay(&mut self, handle: Self::Handle, patch: OverlayPatch<'_>);

    /// Replace the bitmap of a marker or the texture of a polyline; `None`
    /// clears it.
    fn set_image(&mut self, handle: Self::Handle, image: Option<Self::Image>);

    /// Show or hide an overlay without destroying it.
    fn set_visible(&mut self, handle: Self::Handle, visible: bool);

    /// Zoom level the view currently shows.
    fn current_zoom_level(&self) -> f64;

    /// Project a coordinate to view space. Surfaces without a projection
    /// report the origin.
    fn screen_point(&self, _coordinate: Coord<f64>) -> Point {
        Point::default()
    }
}
