//! Reconcilers that turn declarative overlay lists into surface calls.
//!
//! [`MarkerReconciler`] diffs against the last applied list and patches only
//! what changed. [`PolylineReconciler`] replaces its overlays wholesale.

mod markers;
mod polylines;

pub use markers::MarkerReconciler;
pub use polylines::PolylineReconciler;

/// Counts of the surface work one reconciliation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ReconcileSummary {
    /// Overlays created.
    pub added: usize,
    /// Overlays patched in place.
    pub updated: usize,
    /// Overlays destroyed.
    pub removed: usize,
    /// Field patches forwarded to the surface.
    pub patched_fields: usize,
    /// Image loads queued.
    pub asset_requests: usize,
    /// Input records ignored as invalid or duplicate.
    pub skipped: usize,
}

impl ReconcileSummary {
    /// Whether the reconciliation touched the surface at all.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}
