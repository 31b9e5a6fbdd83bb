//! Declarative overlay reconciliation for native map views.
//!
//! Callers describe what the map should show as plain records ([`Marker`],
//! [`Polyline`], [`RegionClusteringOptions`]) and hand them to a
//! [`MapController`] wholesale. The controller diffs each list against what
//! it last applied and issues the smallest set of calls against a
//! [`MapSurface`], keeping overlay handles stable for records that did not
//! change identity. Markers can be grouped into zoom-dependent cluster
//! badges, and images load asynchronously through an [`AssetSink`].
//!
//! The crate is rendering-agnostic: hosts implement [`MapSurface`] for their
//! map view. [`recording`] provides an in-memory surface for tests and
//! tooling.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod asset;
mod clustering;
mod controller;
mod diff;
mod events;
mod geometry;
mod marker;
mod polyline;
pub mod reconcile;
pub mod recording;
mod registry;
mod style;
mod surface;

pub use asset::{AssetCompletion, AssetRequest, AssetSink, AssetTarget};
pub use clustering::{
    ClusterRepresentative, ClusterSummary, ClusteringEngine, RegionAttribute,
    RegionClusteringOptions, RegionClusteringRule, UNKNOWN_GROUP, compute_clusters,
};
pub use controller::MapController;
pub use diff::{DiffResult, DiffStrategy, Update, diff};
pub use events::{EventBus, MapEvent, SubscriptionId};
pub use geometry::{Point, Region, RegionSpan, Size};
pub use marker::{
    FieldChange, FieldValue, GroupingAttributes, Marker, MarkerDiff, MarkerField, MarkerImage,
    marker_changes,
};
pub use polyline::{
    DEFAULT_LINE_WIDTH, LineCap, LineDash, LineJoin, Polyline, PolylineError, PolylineStyle,
    ResolvedPolylineStyle,
};
pub use registry::OverlayRegistry;
pub use style::{ColorParseError, MarkerStyle, PinColor, Rgba, TeardropFill, TextStyle};
pub use surface::{MapSurface, OverlayDescriptor, OverlayPatch};
