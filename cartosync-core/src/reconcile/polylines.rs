use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, warn};

use crate::asset::{AssetRequest, AssetSink, AssetTarget};
use crate::polyline::{Polyline, PolylineStyle};
use crate::surface::{MapSurface, OverlayDescriptor};

use super::ReconcileSummary;

/// Replaces polyline overlays wholesale on every call.
///
/// Styles are kept by identifier so the host can look them up lazily when it
/// first draws a line, through [`PolylineReconciler::style_for`]. Handles map
/// back to identifiers one to one; a repeated identifier gets its own overlay
/// and shares the later style.
#[derive(Debug, Clone)]
pub struct PolylineReconciler<H> {
    order: Vec<H>,
    ids: HashMap<H, String>,
    styles: HashMap<String, PolylineStyle>,
}

impl<H> Default for PolylineReconciler<H> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            ids: HashMap::new(),
            styles: HashMap::new(),
        }
    }
}

impl<H: Copy + Eq + Hash + Debug> PolylineReconciler<H> {
    /// Create a reconciler with nothing applied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every live polyline, then add one overlay per valid entry of
    /// `polylines`. Lines with fewer than two vertices are skipped.
    pub fn apply<S, A>(
        &mut self,
        surface: &mut S,
        assets: &A,
        polylines: &[Polyline],
    ) -> ReconcileSummary
    where
        S: MapSurface<Handle = H> + ?Sized,
        A: AssetSink<H> + ?Sized,
    {
        let mut summary = ReconcileSummary {
            removed: self.order.len(),
            ..ReconcileSummary::default()
        };
        for handle in self.order.drain(..) {
            surface.remove_overlay(handle);
        }
        self.ids.clear();
        self.styles.clear();

        for polyline in polylines {
            if let Err(err) = polyline.validate() {
                warn!("{err}; skipping");
                summary.skipped += 1;
                continue;
            }
            if self.styles.contains_key(&polyline.id) {
                warn!("polyline {}: duplicate id; later style wins", polyline.id);
            }
            let handle = surface.add_overlay(OverlayDescriptor::Polyline(polyline));
            self.styles
                .insert(polyline.id.clone(), polyline.style.clone());
            self.order.push(handle);
            self.ids.insert(handle, polyline.id.clone());
            summary.added += 1;

            if let Some(texture) = polyline.style.texture_image.as_ref() {
                assets.submit(AssetRequest {
                    target: AssetTarget::PolylineTexture {
                        id: polyline.id.clone(),
                    },
                    handle,
                    reference: texture.clone(),
                    size: None,
                });
                summary.asset_requests += 1;
            }
        }
        debug!(
            "polylines replaced: -{} +{} ({} skipped)",
            summary.removed, summary.added, summary.skipped
        );
        summary
    }

    /// Identifier rendered by `handle`.
    #[must_use]
    pub fn id_for(&self, handle: H) -> Option<&str> {
        self.ids.get(&handle).map(String::as_str)
    }

    /// Style to draw `handle` with, or `None` for unknown handles so the host
    /// can fall back to its own default renderer.
    #[must_use]
    pub fn style_for(&self, handle: H) -> Option<&PolylineStyle> {
        self.id_for(handle).and_then(|id| self.styles.get(id))
    }

    /// Handles of every live polyline, in creation order.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.order.iter().copied()
    }

    /// Number of live polylines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no polylines are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{OverlayId, OverlayKind, RecordingAssetSink, RecordingSurface};
    use geo::Coord;
    use rstest::rstest;

    fn line(id: &str, points: usize) -> Polyline {
        let coordinates = (0..points)
            .map(|step| Coord {
                x: f64::from(u32::try_from(step).unwrap_or(0)),
                y: 0.0,
            })
            .collect();
        Polyline::new(id, coordinates)
    }

    #[rstest]
    fn every_call_replaces_all_lines() {
        let mut surface = RecordingSurface::new();
        let assets = RecordingAssetSink::new();
        let mut reconciler = PolylineReconciler::<OverlayId>::new();

        reconciler.apply(&mut surface, &assets, &[line("a", 2), line("b", 3)]);
        let first: Vec<_> = reconciler.handles().collect();
        let summary = reconciler.apply(&mut surface, &assets, &[line("a", 2), line("b", 3)]);

        assert_eq!((summary.removed, summary.added), (2, 2));
        let second: Vec<_> = reconciler.handles().collect();
        assert!(first.iter().all(|handle| !second.contains(handle)));
        assert_eq!(surface.live_ids(OverlayKind::Polyline), vec!["a", "b"]);
    }

    #[rstest]
    fn styles_resolve_lazily_by_handle() {
        let mut surface = RecordingSurface::new();
        let assets = RecordingAssetSink::new();
        let mut reconciler = PolylineReconciler::new();
        let styled = line("route", 2).with_style(PolylineStyle {
            line_width: Some(8.0),
            ..PolylineStyle::default()
        });
        reconciler.apply(&mut surface, &assets, &[styled]);

        let handle = reconciler.handles().next();
        let width = handle
            .and_then(|h| reconciler.style_for(h))
            .and_then(|style| style.line_width);
        assert_eq!(width, Some(8.0));
        assert_eq!(reconciler.style_for(OverlayId::new(9_999)), None);
    }

    #[rstest]
    fn handles_resolve_to_ids_until_replaced() {
        let mut surface = RecordingSurface::new();
        let assets = RecordingAssetSink::new();
        let mut reconciler = PolylineReconciler::<OverlayId>::new();
        reconciler.apply(&mut surface, &assets, &[line("a", 2), line("b", 2)]);
        let first: Vec<_> = reconciler.handles().collect();
        let ids: Vec<_> = first.iter().filter_map(|h| reconciler.id_for(*h)).collect();
        assert_eq!(ids, vec!["a", "b"]);

        reconciler.apply(&mut surface, &assets, &[line("a", 2)]);
        assert!(first.iter().all(|h| reconciler.id_for(*h).is_none()));
        assert_eq!(reconciler.len(), 1);
    }

    #[rstest]
    fn duplicate_ids_keep_both_overlays_with_the_later_style() {
        let mut surface = RecordingSurface::new();
        let assets = RecordingAssetSink::new();
        let mut reconciler = PolylineReconciler::<OverlayId>::new();
        let wide = |width| {
            line("dup", 2).with_style(PolylineStyle {
                line_width: Some(width),
                ..PolylineStyle::default()
            })
        };
        reconciler.apply(&mut surface, &assets, &[wide(2.0), wide(9.0)]);

        let handles: Vec<_> = reconciler.handles().collect();
        assert_eq!(handles.len(), 2);
        for handle in handles {
            assert_eq!(reconciler.id_for(handle), Some("dup"));
            assert_eq!(
                reconciler.style_for(handle).and_then(|style| style.line_width),
                Some(9.0)
            );
        }
    }

    #[rstest]
    fn short_lines_are_skipped() {
        let mut surface = RecordingSurface::new();
        let assets = RecordingAssetSink::new();
        let mut reconciler = PolylineReconciler::new();
        let summary = reconciler.apply(&mut surface, &assets, &[line("dot", 1), line("ok", 2)]);
        assert_eq!((summary.added, summary.skipped), (1, 1));
        assert_eq!(surface.live_ids(OverlayKind::Polyline), vec!["ok"]);
    }

    #[rstest]
    fn textures_are_requested() {
        let mut surface = RecordingSurface::new();
        let assets = RecordingAssetSink::new();
        let mut reconciler = PolylineReconciler::new();
        let textured = line("t", 2).with_style(PolylineStyle {
            texture_image: Some("/tmp/arrow.png".into()),
            ..PolylineStyle::default()
        });
        reconciler.apply(&mut surface, &assets, &[textured]);
        let requests = assets.requests();
        assert_eq!(requests.len(), 1);
        assert!(matches!(
            requests.first().map(|r| &r.target),
            Some(AssetTarget::PolylineTexture { id }) if id == "t"
        ));
    }
}
