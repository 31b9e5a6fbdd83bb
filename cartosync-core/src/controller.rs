//! The map controller: one owner for the surface, the reconcilers, the
//! clustering engine and the event listeners.

use log::{debug, warn};

use crate::asset::{AssetCompletion, AssetSink, AssetTarget};
use crate::clustering::{
    ClusterRepresentative, ClusterSummary, ClusteringEngine, RegionAttribute,
    RegionClusteringOptions,
};
use crate::events::{EventBus, MapEvent, SubscriptionId};
use crate::geometry::Region;
use crate::marker::Marker;
use crate::polyline::{Polyline, ResolvedPolylineStyle};
use crate::reconcile::{MarkerReconciler, PolylineReconciler, ReconcileSummary};
use crate::style::MarkerStyle;
use crate::surface::MapSurface;

/// Drives a [`MapSurface`] from declarative marker, polyline and clustering
/// input.
///
/// Every method runs on the thread that owns the controller. Image loads
/// leave through the [`AssetSink`] and come back through
/// [`MapController::apply_asset`].
///
/// # Examples
/// ```
/// use cartosync_core::recording::{OverlayKind, RecordingAssetSink, RecordingSurface};
/// use cartosync_core::{MapController, Marker};
/// use geo::Coord;
///
/// let mut controller = MapController::new(RecordingSurface::new(), RecordingAssetSink::new());
/// controller.set_markers(vec![Marker::new("a", Coord { x: 1.0, y: 2.0 })]);
/// assert_eq!(controller.surface().live_ids(OverlayKind::Marker), vec!["a"]);
/// ```
#[derive(Debug)]
pub struct MapController<S: MapSurface, A> {
    surface: S,
    assets: A,
    markers: MarkerReconciler<S::Handle>,
    polylines: PolylineReconciler<S::Handle>,
    clustering: ClusteringEngine<S::Handle>,
    events: EventBus,
}

impl<S, A> MapController<S, A>
where
    S: MapSurface,
    A: AssetSink<S::Handle>,
{
    /// Wrap `surface`, sending image loads to `assets`.
    #[must_use]
    pub fn new(surface: S, assets: A) -> Self {
        Self {
            surface,
            assets,
            markers: MarkerReconciler::new(),
            polylines: PolylineReconciler::new(),
            clustering: ClusteringEngine::new(),
            events: EventBus::new(),
        }
    }

    /// Replace the marker list, then refresh clusters if clustering is on.
    pub fn set_markers(&mut self, markers: Vec<Marker>) -> ReconcileSummary {
        let summary = self.markers.apply(&mut self.surface, &self.assets, markers);
        self.refresh_clusters();
        summary
    }

    /// Replace every polyline.
    pub fn set_polylines(&mut self, polylines: &[Polyline]) -> ReconcileSummary {
        self.polylines
            .apply(&mut self.surface, &self.assets, polylines)
    }

    /// Replace the clustering options and recompute. Switching clustering off
    /// removes every cluster and shows the raw markers again.
    pub fn set_region_clustering_options(
        &mut self,
        options: RegionClusteringOptions,
    ) -> ClusterSummary {
        self.clustering.set_options(options);
        self.refresh_clusters()
    }

    fn refresh_clusters(&mut self) -> ClusterSummary {
        if !self.clustering.is_enabled() && self.clustering.clusters().next().is_none() {
            return ClusterSummary::default();
        }
        let summary = self
            .clustering
            .recompute(&mut self.surface, self.markers.markers());
        self.apply_visibility();
        summary
    }

    fn apply_visibility(&mut self) -> Option<RegionAttribute> {
        let zoom = self.surface.current_zoom_level();
        self.clustering
            .apply_visibility(&mut self.surface, zoom, self.markers.handles())
    }

    /// React to a zoom change reported by the surface: switch between
    /// clusters and raw markers, then emit [`MapEvent::Zoom`].
    pub fn handle_zoom_changed(&mut self) -> f64 {
        let zoom_level = self.surface.current_zoom_level();
        if self.clustering.is_enabled() {
            self.apply_visibility();
        }
        self.events.emit(&MapEvent::Zoom { zoom_level });
        zoom_level
    }

    /// Emit [`MapEvent::RegionChanged`] for `region`.
    pub fn handle_region_changed(&mut self, region: Region) {
        self.events.emit(&MapEvent::RegionChanged {
            center: region.center,
            span: region.span,
        });
    }

    /// Resolve a tapped handle to its record and emit the matching event.
    ///
    /// Markers with `enabled: false` and polylines with
    /// `userInteractionEnabled: false` do not respond. Returns the emitted
    /// event, if any.
    pub fn handle_tap(&mut self, handle: S::Handle) -> Option<MapEvent> {
        let Some(event) = self.describe_tap(handle) else {
            debug!("tap on {handle:?} matched no interactive overlay");
            return None;
        };
        self.events.emit(&event);
        Some(event)
    }

    fn describe_tap(&self, handle: S::Handle) -> Option<MapEvent> {
        if let Some(id) = self.markers.id_for(handle) {
            let marker = self.markers.marker(id)?;
            if marker.enabled == Some(false) {
                return None;
            }
            return Some(MapEvent::TapMarker {
                id: marker.id.clone(),
                coordinate: marker.coordinate,
                screen_point: self.surface.screen_point(marker.coordinate),
            });
        }
        if let Some(cluster) = self.clustering.cluster_for(handle) {
            return Some(MapEvent::TapCluster {
                id: cluster.id.clone(),
                by: cluster.by,
                member_count: cluster.member_count,
                coordinate: cluster.centroid,
            });
        }
        let id = self.polylines.id_for(handle)?;
        let interactive = self
            .polylines
            .style_for(handle)
            .and_then(|style| style.user_interaction_enabled)
            .unwrap_or(true);
        interactive.then(|| MapEvent::TapPolyline { id: id.to_owned() })
    }

    /// Apply a finished image load if its overlay is still live and still
    /// wants that image. Returns whether the surface was updated.
    pub fn apply_asset(&mut self, completion: AssetCompletion<S::Handle, S::Image>) -> bool {
        let AssetCompletion { request, image } = completion;
        if !self.is_current(&request.target, request.handle, &request.reference) {
            debug!(
                "discarding image '{}' for {}: overlay changed or removed",
                request.reference,
                request.target.id()
            );
            return false;
        }
        let Some(decoded) = image else {
            warn!(
                "image '{}' unavailable; {} renders without it",
                request.reference,
                request.target.id()
            );
            return false;
        };
        self.surface.set_image(request.handle, Some(decoded));
        true
    }

    fn is_current(&self, target: &AssetTarget, handle: S::Handle, reference: &str) -> bool {
        match target {
            AssetTarget::MarkerImage { id } => {
                self.markers.handle_for(id) == Some(handle)
                    && self.markers.marker(id).is_some_and(|marker| {
                        marker.style == MarkerStyle::Custom
                            && marker
                                .image
                                .as_ref()
                                .is_some_and(|image| image.url == reference)
                    })
            }
            AssetTarget::PolylineTexture { id } => {
                self.polylines.id_for(handle) == Some(id.as_str())
                    && self
                        .polylines
                        .style_for(handle)
                        .and_then(|style| style.texture_image.as_deref())
                        == Some(reference)
            }
        }
    }

    /// Resolved drawing style for a live polyline, or `None` so the host can
    /// use its default renderer.
    #[must_use]
    pub fn polyline_style_for(&self, handle: S::Handle) -> Option<ResolvedPolylineStyle> {
        self.polylines.style_for(handle).map(|style| style.resolve())
    }

    /// Register an event listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&MapEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Remove an event listener, reporting whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Markers as last applied.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        self.markers.markers()
    }

    /// Handle rendering the marker `id`.
    #[must_use]
    pub fn marker_handle(&self, id: &str) -> Option<S::Handle> {
        self.markers.handle_for(id)
    }

    /// Handle rendering the cluster `id`.
    #[must_use]
    pub fn cluster_handle(&self, id: &str) -> Option<S::Handle> {
        self.clustering.handle_for(id)
    }

    /// Live cluster representatives ordered by id.
    pub fn clusters(&self) -> impl Iterator<Item = &ClusterRepresentative> {
        self.clustering.clusters()
    }

    /// Attribute of the rule active at the surface's current zoom.
    #[must_use]
    pub fn active_rule(&self) -> Option<RegionAttribute> {
        self.clustering
            .active_rule(self.surface.current_zoom_level())
            .map(|rule| rule.by)
    }

    /// Handles of every live polyline, in creation order.
    pub fn polyline_handles(&self) -> impl Iterator<Item = S::Handle> + '_ {
        self.polylines.handles()
    }

    /// The driven surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The driven surface, mutably. Zoom changes made here take effect on
    /// the next [`MapController::handle_zoom_changed`].
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The asset sink.
    #[must_use]
    pub const fn assets(&self) -> &A {
        &self.assets
    }
}
