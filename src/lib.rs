//! Facade crate for the cartosync overlay engine.
//!
//! This crate re-exports the core reconciliation and clustering types and,
//! behind the default `assets` feature, the background image loader.

#![forbid(unsafe_code)]

pub use cartosync_core::{
    AssetCompletion, AssetRequest, AssetSink, AssetTarget, ClusterRepresentative,
    ClusterSummary, ClusteringEngine, DiffResult, DiffStrategy, FieldChange, FieldValue,
    GroupingAttributes, MapController, MapEvent, MapSurface, Marker, MarkerDiff, MarkerField,
    MarkerImage, MarkerStyle, OverlayDescriptor, OverlayPatch, OverlayRegistry, PinColor, Point,
    Polyline, PolylineStyle, Region, RegionAttribute, RegionClusteringOptions,
    RegionClusteringRule, RegionSpan, ResolvedPolylineStyle, Rgba, Size, SubscriptionId,
    TextStyle, diff,
};
pub use cartosync_core::{reconcile, recording};

#[cfg(feature = "assets")]
pub use cartosync_assets::{
    AssetBuildError, AssetError, AssetLoader, AssetLoaderConfig, AssetPipeline, ImageCache,
    ImageSource, LoadedImage,
};
