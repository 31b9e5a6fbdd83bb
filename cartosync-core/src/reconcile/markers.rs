use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, warn};

use crate::asset::{AssetRequest, AssetSink, AssetTarget};
use crate::diff::{Update, diff};
use crate::marker::{FieldChange, Marker, MarkerDiff, MarkerField};
use crate::registry::OverlayRegistry;
use crate::style::MarkerStyle;
use crate::surface::{MapSurface, OverlayDescriptor, OverlayPatch};

use super::ReconcileSummary;

/// Keeps marker overlays in step with the latest marker list.
///
/// Each call to [`MarkerReconciler::apply`] diffs the incoming list against
/// the previously applied one and issues removals, then in-place patches,
/// then additions. Markers are paired by `id` and `style`, so a style change
/// recreates the overlay.
///
/// # Examples
/// ```
/// use cartosync_core::recording::{RecordingAssetSink, RecordingSurface};
/// use cartosync_core::reconcile::MarkerReconciler;
/// use cartosync_core::Marker;
/// use geo::Coord;
///
/// let mut surface = RecordingSurface::new();
/// let assets = RecordingAssetSink::new();
/// let mut reconciler = MarkerReconciler::new();
///
/// let first = reconciler.apply(&mut surface, &assets, vec![Marker::new("a", Coord { x: 0.0, y: 0.0 })]);
/// assert_eq!(first.added, 1);
/// let again = reconciler.apply(&mut surface, &assets, vec![Marker::new("a", Coord { x: 0.0, y: 0.0 })]);
/// assert!(again.is_noop());
/// ```
#[derive(Debug, Clone)]
pub struct MarkerReconciler<H> {
    applied: Vec<Marker>,
    registry: OverlayRegistry<H>,
}

impl<H> Default for MarkerReconciler<H> {
    fn default() -> Self {
        Self {
            applied: Vec::new(),
            registry: OverlayRegistry::default(),
        }
    }
}

impl<H: Copy + Eq + Hash + Debug> MarkerReconciler<H> {
    /// Create a reconciler with nothing applied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile `surface` with `markers`.
    ///
    /// Later records reusing an identifier already seen in `markers` are
    /// skipped with a warning so the identifier keeps a single overlay.
    pub fn apply<S, A>(&mut self, surface: &mut S, assets: &A, markers: Vec<Marker>) -> ReconcileSummary
    where
        S: MapSurface<Handle = H> + ?Sized,
        A: AssetSink<H> + ?Sized,
    {
        let mut summary = ReconcileSummary::default();
        let incoming = dedupe_by_id(markers, &mut summary);
        let registry = &mut self.registry;
        {
            let result = diff(&self.applied, &incoming, &MarkerDiff);

            for old in &result.to_remove {
                match registry.unregister(&old.id) {
                    Some(handle) => {
                        surface.remove_overlay(handle);
                        summary.removed += 1;
                    }
                    None => warn!("marker {}: no live overlay to remove", old.id),
                }
            }

            for update in &result.to_update {
                let Some(handle) = registry.handle_for(&update.new.id) else {
                    warn!("marker {}: no live overlay to update", update.new.id);
                    continue;
                };
                patch(surface, assets, handle, update, &mut summary);
                summary.updated += 1;
            }

            for marker in &result.to_add {
                let handle = surface.add_overlay(OverlayDescriptor::Marker(marker));
                if let Some(stale) = registry.register(marker.id.as_str(), handle) {
                    warn!("marker {}: replacing stale overlay {stale:?}", marker.id);
                    surface.remove_overlay(stale);
                }
                if request_image(assets, handle, marker) {
                    summary.asset_requests += 1;
                }
                summary.added += 1;
            }
        }

        debug!(
            "markers reconciled: +{} ~{} -{} ({} fields, {} images)",
            summary.added,
            summary.updated,
            summary.removed,
            summary.patched_fields,
            summary.asset_requests
        );
        self.applied = incoming;
        summary
    }

    /// Markers as last applied.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.applied
    }

    /// Last applied record for `id`.
    #[must_use]
    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.applied.iter().find(|marker| marker.id == id)
    }

    /// Handle of the overlay rendering `id`.
    #[must_use]
    pub fn handle_for(&self, id: &str) -> Option<H> {
        self.registry.handle_for(id)
    }

    /// Identifier rendered by `handle`.
    #[must_use]
    pub fn id_for(&self, handle: H) -> Option<&str> {
        self.registry.id_for(handle)
    }

    /// Handles of every live marker overlay.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.registry.handles()
    }

    /// Number of live marker overlays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no marker overlays are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

fn dedupe_by_id(markers: Vec<Marker>, summary: &mut ReconcileSummary) -> Vec<Marker> {
    let mut seen = HashSet::with_capacity(markers.len());
    markers
        .into_iter()
        .filter(|marker| {
            if seen.insert(marker.id.clone()) {
                return true;
            }
            warn!("marker {}: duplicate id ignored", marker.id);
            summary.skipped += 1;
            false
        })
        .collect()
}

fn patch<S, A>(
    surface: &mut S,
    assets: &A,
    handle: S::Handle,
    update: &Update<'_, Marker, FieldChange>,
    summary: &mut ReconcileSummary,
) where
    S: MapSurface + ?Sized,
    A: AssetSink<S::Handle> + ?Sized,
{
    let style = update.new.style;
    for change in &update.changes {
        if !change.key.applies_to(style) {
            continue;
        }
        summary.patched_fields += 1;
        if change.key == MarkerField::Image {
            if request_image(assets, handle, update.new) {
                summary.asset_requests += 1;
            } else {
                surface.set_image(handle, None);
            }
            continue;
        }
        surface.update_overlay(handle, OverlayPatch::Marker(change));
    }
}

fn request_image<H, A>(assets: &A, handle: H, marker: &Marker) -> bool
where
    A: AssetSink<H> + ?Sized,
{
    if marker.style != MarkerStyle::Custom {
        return false;
    }
    let Some(image) = marker.image.as_ref() else {
        return false;
    };
    assets.submit(AssetRequest {
        target: AssetTarget::MarkerImage {
            id: marker.id.clone(),
        },
        handle,
        reference: image.url.clone(),
        size: Some(image.size),
    });
    true
}
