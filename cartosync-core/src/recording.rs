//! In-memory [`MapSurface`] and [`AssetSink`] that record what they are asked
//! to do.
//!
//! These back the unit and behaviour tests and the command-line replay tool,
//! where there is no real map view to drive.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use geo::Coord;

use crate::asset::{AssetRequest, AssetSink};
use crate::marker::{FieldValue, MarkerField};
use crate::surface::{MapSurface, OverlayDescriptor, OverlayPatch};

/// Handle issued by [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OverlayId(u64);

impl OverlayId {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a recorded overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OverlayKind {
    /// Marker view.
    Marker,
    /// Polyline.
    Polyline,
    /// Cluster badge.
    Cluster,
}

/// Dimensions of an image applied to a recorded overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// State of one live overlay.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RecordedOverlay {
    /// Caller or cluster identifier.
    pub id: String,
    /// Overlay kind.
    pub kind: OverlayKind,
    /// Whether the overlay is shown.
    pub visible: bool,
    /// Marker position or cluster centroid.
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "crate::geometry::lat_lng::option::serialize")
    )]
    pub coordinate: Option<Coord<f64>>,
    /// Marker title or cluster label.
    pub title: Option<String>,
    /// Image currently applied.
    pub image: Option<RecordedImage>,
    /// Number of in-place patches received.
    pub patches: usize,
}

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")
)]
pub enum SurfaceOp {
    /// Overlay created.
    Add {
        /// New handle.
        handle: OverlayId,
        /// Overlay kind.
        kind: OverlayKind,
        /// Identifier of the record.
        id: String,
    },
    /// Overlay destroyed.
    Remove {
        /// Destroyed handle.
        handle: OverlayId,
    },
    /// Overlay patched.
    Update {
        /// Patched handle.
        handle: OverlayId,
        /// Marker field name, or `"cluster"`.
        key: String,
    },
    /// Image replaced or cleared.
    SetImage {
        /// Target handle.
        handle: OverlayId,
        /// Whether an image was supplied.
        present: bool,
    },
    /// Visibility changed.
    SetVisible {
        /// Target handle.
        handle: OverlayId,
        /// New visibility.
        visible: bool,
    },
}

/// A [`MapSurface`] that keeps overlays in memory and logs every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    next_handle: u64,
    zoom_level: f64,
    overlays: BTreeMap<OverlayId, RecordedOverlay>,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    /// Create an empty surface at zoom 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zoom level reported by [`MapSurface::current_zoom_level`].
    pub const fn set_zoom_level(&mut self, zoom_level: f64) {
        self.zoom_level = zoom_level;
    }

    /// State of a live overlay.
    #[must_use]
    pub fn overlay(&self, handle: OverlayId) -> Option<&RecordedOverlay> {
        self.overlays.get(&handle)
    }

    /// Live overlays ordered by handle.
    pub fn overlays(&self) -> impl Iterator<Item = (OverlayId, &RecordedOverlay)> {
        self.overlays.iter().map(|(handle, overlay)| (*handle, overlay))
    }

    /// Handle of the live overlay of `kind` with `id`.
    #[must_use]
    pub fn handle_of(&self, kind: OverlayKind, id: &str) -> Option<OverlayId> {
        self.overlays()
            .find(|(_, overlay)| overlay.kind == kind && overlay.id == id)
            .map(|(handle, _)| handle)
    }

    /// Sorted identifiers of live overlays of `kind`.
    #[must_use]
    pub fn live_ids(&self, kind: OverlayKind) -> Vec<&str> {
        self.ids_where(|overlay| overlay.kind == kind)
    }

    /// Sorted identifiers of visible overlays of `kind`.
    #[must_use]
    pub fn visible_ids(&self, kind: OverlayKind) -> Vec<&str> {
        self.ids_where(|overlay| overlay.kind == kind && overlay.visible)
    }

    fn ids_where(&self, keep: impl Fn(&RecordedOverlay) -> bool) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .overlays
            .values()
            .filter(|overlay| keep(overlay))
            .map(|overlay| overlay.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Calls recorded since creation or the last [`RecordingSurface::clear_ops`].
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Forget recorded calls, keeping overlay state.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Take recorded calls, leaving the log empty.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }
}

impl MapSurface for RecordingSurface {
    type Handle = OverlayId;
    type Image = RecordedImage;

    fn add_overlay(&mut self, descriptor: OverlayDescriptor<'_>) -> OverlayId {
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = OverlayId(self.next_handle);
        let overlay = match descriptor {
            OverlayDescriptor::Marker(marker) => RecordedOverlay {
                id: marker.id.clone(),
                kind: OverlayKind::Marker,
                visible: true,
                coordinate: Some(marker.coordinate),
                title: marker.title.clone(),
                image: None,
                patches: 0,
            },
            OverlayDescriptor::Polyline(polyline) => RecordedOverlay {
                id: polyline.id.clone(),
                kind: OverlayKind::Polyline,
                visible: true,
                coordinate: polyline.coordinates.first().copied(),
                title: None,
                image: None,
                patches: 0,
            },
            OverlayDescriptor::Cluster(cluster) => RecordedOverlay {
                id: cluster.id.clone(),
                kind: OverlayKind::Cluster,
                visible: true,
                coordinate: Some(cluster.centroid),
                title: Some(cluster.label.clone()),
                image: None,
                patches: 0,
            },
        };
        self.ops.push(SurfaceOp::Add {
            handle,
            kind: overlay.kind,
            id: overlay.id.clone(),
        });
        self.overlays.insert(handle, overlay);
        handle
    }

    fn remove_overlay(&mut self, handle: OverlayId) {
        self.overlays.remove(&handle);
        self.ops.push(SurfaceOp::Remove { handle });
    }

    fn update_overlay(&mut self, handle: OverlayId, patch: OverlayPatch<'_>) {
        let key = match patch {
            OverlayPatch::Marker(change) => change.key.key(),
            OverlayPatch::Cluster(_) => "cluster",
        };
        if let Some(overlay) = self.overlays.get_mut(&handle) {
            overlay.patches += 1;
            match patch {
                OverlayPatch::Marker(change) => match (&change.key, &change.new_value) {
                    (MarkerField::Coordinate, FieldValue::Coordinate(coordinate)) => {
                        overlay.coordinate = Some(*coordinate);
                    }
                    (MarkerField::Title, FieldValue::Text(title)) => {
                        overlay.title.clone_from(title);
                    }
                    _ => {}
                },
                OverlayPatch::Cluster(cluster) => {
                    overlay.coordinate = Some(cluster.centroid);
                    overlay.title = Some(cluster.label.clone());
                }
            }
        }
        self.ops.push(SurfaceOp::Update {
            handle,
            key: key.to_owned(),
        });
    }

    fn set_image(&mut self, handle: OverlayId, image: Option<RecordedImage>) {
        self.ops.push(SurfaceOp::SetImage {
            handle,
            present: image.is_some(),
        });
        if let Some(overlay) = self.overlays.get_mut(&handle) {
            overlay.image = image;
        }
    }

    fn set_visible(&mut self, handle: OverlayId, visible: bool) {
        if let Some(overlay) = self.overlays.get_mut(&handle) {
            overlay.visible = visible;
        }
        self.ops.push(SurfaceOp::SetVisible { handle, visible });
    }

    fn current_zoom_level(&self) -> f64 {
        self.zoom_level
    }
}

/// An [`AssetSink`] that queues requests for the caller to inspect.
#[derive(Debug)]
pub struct RecordingAssetSink<H> {
    requests: RefCell<Vec<AssetRequest<H>>>,
}

impl<H> Default for RecordingAssetSink<H> {
    fn default() -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl<H: Clone> RecordingAssetSink<H> {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every queued request.
    #[must_use]
    pub fn requests(&self) -> Vec<AssetRequest<H>> {
        self.requests.borrow().clone()
    }

    /// Remove and return every queued request.
    pub fn take(&self) -> Vec<AssetRequest<H>> {
        self.requests.take()
    }
}

impl<H> AssetSink<H> for RecordingAssetSink<H> {
    fn submit(&self, request: AssetRequest<H>) {
        self.requests.borrow_mut().push(request);
    }
}
