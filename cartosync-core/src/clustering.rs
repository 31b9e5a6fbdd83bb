//! Region clustering: grouping markers by administrative area and choosing
//! between cluster badges and raw markers by zoom level.
//!
//! [`compute_clusters`] is the pure grouping step. [`ClusteringEngine`] keeps
//! one surface overlay per cluster id alive across recomputations so badges
//! move smoothly instead of being recreated.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{self, Debug};
use std::hash::Hash;

use geo::{Centroid, Coord, MultiPoint};
use log::{debug, warn};

use crate::marker::Marker;
use crate::surface::{MapSurface, OverlayDescriptor, OverlayPatch};

/// Group key for markers missing the rule's attribute.
pub const UNKNOWN_GROUP: &str = "unknown";

/// Administrative level markers can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RegionAttribute {
    /// Province level.
    Province,
    /// City level.
    City,
    /// District level.
    District,
}

impl RegionAttribute {
    /// Lowercase name, used as the cluster id prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Province => "province",
            Self::City => "city",
            Self::District => "district",
        }
    }
}

impl fmt::Display for RegionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Show clusters grouped `by` an attribute while the zoom is below
/// `threshold_zoom_level`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RegionClusteringRule {
    /// Grouping attribute.
    pub by: RegionAttribute,
    /// Zoom level at and above which this rule no longer applies.
    pub threshold_zoom_level: f64,
}

impl RegionClusteringRule {
    /// Construct a rule.
    #[must_use]
    pub const fn new(by: RegionAttribute, threshold_zoom_level: f64) -> Self {
        Self {
            by,
            threshold_zoom_level,
        }
    }
}

/// Clustering switch and rule set.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegionClusteringOptions {
    /// Whether clustering runs at all.
    pub enabled: bool,
    /// Rules in caller order.
    pub rules: Vec<RegionClusteringRule>,
}

impl RegionClusteringOptions {
    /// Enabled options with the given rules.
    #[must_use]
    pub const fn enabled(rules: Vec<RegionClusteringRule>) -> Self {
        Self {
            enabled: true,
            rules,
        }
    }
}

/// A synthetic overlay standing in for every marker of one group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ClusterRepresentative {
    /// `"<attribute>_<groupKey>"`, stable across recomputations.
    pub id: String,
    /// Attribute of the rule that produced the cluster.
    pub by: RegionAttribute,
    /// Shared attribute value, or [`UNKNOWN_GROUP`].
    pub group_key: String,
    /// Mean position of the members.
    #[cfg_attr(feature = "serde", serde(with = "crate::geometry::lat_lng"))]
    pub centroid: Coord<f64>,
    /// Number of members.
    pub member_count: usize,
    /// Badge text: `"<groupKey> <memberCount>"`.
    pub label: String,
}

/// Group `markers` under every rule.
///
/// Groups are emitted per rule in rule order, then by group key. A rule
/// whose attribute was already used by an earlier rule is skipped.
///
/// # Examples
/// ```
/// use cartosync_core::{
///     GroupingAttributes, Marker, RegionAttribute, RegionClusteringRule, compute_clusters,
/// };
/// use geo::Coord;
///
/// let city = |name: &str| GroupingAttributes { city: Some(name.into()), ..Default::default() };
/// let markers = vec![
///     Marker::new("a", Coord { x: 0.0, y: 0.0 }).with_grouping(city("Taiyuan")),
///     Marker::new("b", Coord { x: 2.0, y: 4.0 }).with_grouping(city("Taiyuan")),
/// ];
/// let clusters = compute_clusters(&[RegionClusteringRule::new(RegionAttribute::City, 10.0)], &markers);
/// assert_eq!(clusters.len(), 1);
/// assert_eq!(clusters[0].id, "city_Taiyuan");
/// assert_eq!(clusters[0].centroid, Coord { x: 1.0, y: 2.0 });
/// ```
#[must_use]
pub fn compute_clusters(
    rules: &[RegionClusteringRule],
    markers: &[Marker],
) -> Vec<ClusterRepresentative> {
    let mut seen = HashSet::new();
    let mut clusters = Vec::new();
    for rule in rules {
        if !seen.insert(rule.by) {
            warn!("clustering rule for '{}' repeated; ignoring", rule.by);
            continue;
        }
        let mut groups: BTreeMap<&str, Vec<Coord<f64>>> = BTreeMap::new();
        for marker in markers {
            let key = marker
                .grouping_attributes
                .get(rule.by)
                .unwrap_or(UNKNOWN_GROUP);
            groups.entry(key).or_default().push(marker.coordinate);
        }
        clusters.extend(groups.into_iter().filter_map(|(key, members)| {
            let member_count = members.len();
            let centroid = MultiPoint::from(members).centroid()?;
            Some(ClusterRepresentative {
                id: format!("{}_{key}", rule.by),
                by: rule.by,
                group_key: key.to_owned(),
                centroid: centroid.0,
                member_count,
                label: format!("{key} {member_count}"),
            })
        }));
    }
    clusters
}

/// Surface work performed by [`ClusteringEngine::recompute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClusterSummary {
    /// Cluster overlays created.
    pub created: usize,
    /// Cluster overlays patched in place.
    pub updated: usize,
    /// Cluster overlays destroyed.
    pub removed: usize,
}

#[derive(Debug, Clone)]
struct LiveCluster<H> {
    handle: H,
    representative: ClusterRepresentative,
}

/// Owns the cluster overlays and decides what is visible at a zoom level.
#[derive(Debug, Clone)]
pub struct ClusteringEngine<H> {
    options: RegionClusteringOptions,
    live: BTreeMap<String, LiveCluster<H>>,
    ids_by_handle: HashMap<H, String>,
}

impl<H> Default for ClusteringEngine<H> {
    fn default() -> Self {
        Self {
            options: RegionClusteringOptions::default(),
            live: BTreeMap::new(),
            ids_by_handle: HashMap::new(),
        }
    }
}

impl<H: Copy + Eq + Hash + Debug> ClusteringEngine<H> {
    /// Create a disabled engine without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the options. Call [`ClusteringEngine::recompute`] afterwards.
    pub fn set_options(&mut self, options: RegionClusteringOptions) {
        self.options = options;
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &RegionClusteringOptions {
        &self.options
    }

    /// Whether clustering is switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    /// Rebuild clusters from `markers`, patching surviving ids in place and
    /// removing ids no longer produced. When clustering is disabled every
    /// cluster overlay is removed.
    pub fn recompute<S>(&mut self, surface: &mut S, markers: &[Marker]) -> ClusterSummary
    where
        S: MapSurface<Handle = H> + ?Sized,
    {
        if !self.options.enabled {
            return ClusterSummary {
                removed: self.clear(surface),
                ..ClusterSummary::default()
            };
        }

        let mut summary = ClusterSummary::default();
        let mut next = BTreeMap::new();
        let mut ids_by_handle = HashMap::new();
        for representative in compute_clusters(&self.options.rules, markers) {
            let handle = match self.live.remove(&representative.id) {
                Some(existing) => {
                    if existing.representative != representative {
                        surface.update_overlay(
                            existing.handle,
                            OverlayPatch::Cluster(&representative),
                        );
                        summary.updated += 1;
                    }
                    existing.handle
                }
                None => {
                    summary.created += 1;
                    surface.add_overlay(OverlayDescriptor::Cluster(&representative))
                }
            };
            ids_by_handle.insert(handle, representative.id.clone());
            next.insert(
                representative.id.clone(),
                LiveCluster {
                    handle,
                    representative,
                },
            );
        }
        self.ids_by_handle = ids_by_handle;
        for stale in std::mem::replace(&mut self.live, next).into_values() {
            surface.remove_overlay(stale.handle);
            summary.removed += 1;
        }
        debug!(
            "clusters recomputed: +{} ~{} -{}",
            summary.created, summary.updated, summary.removed
        );
        summary
    }

    /// Remove every cluster overlay, returning how many were removed.
    pub fn clear<S>(&mut self, surface: &mut S) -> usize
    where
        S: MapSurface<Handle = H> + ?Sized,
    {
        let removed = self.live.len();
        self.ids_by_handle.clear();
        for cluster in std::mem::take(&mut self.live).into_values() {
            surface.remove_overlay(cluster.handle);
        }
        removed
    }

    /// Rule governing `zoom`: the one with the smallest threshold strictly
    /// above `zoom`, later rules winning ties. `None` when clustering is
    /// disabled, `zoom` is NaN or `zoom` is at or above every threshold.
    ///
    /// # Examples
    /// ```
    /// use cartosync_core::{
    ///     ClusteringEngine, RegionAttribute, RegionClusteringOptions, RegionClusteringRule,
    /// };
    ///
    /// let mut engine = ClusteringEngine::<u32>::new();
    /// engine.set_options(RegionClusteringOptions::enabled(vec![
    ///     RegionClusteringRule::new(RegionAttribute::District, 12.0),
    ///     RegionClusteringRule::new(RegionAttribute::City, 10.0),
    ///     RegionClusteringRule::new(RegionAttribute::Province, 8.0),
    /// ]));
    /// assert_eq!(engine.active_rule(9.5).map(|rule| rule.by), Some(RegionAttribute::City));
    /// assert!(engine.active_rule(13.0).is_none());
    /// ```
    #[must_use]
    pub fn active_rule(&self, zoom: f64) -> Option<&RegionClusteringRule> {
        if !self.options.enabled {
            return None;
        }
        self.options
            .rules
            .iter()
            .rev()
            .filter(|rule| zoom < rule.threshold_zoom_level)
            .min_by(|a, b| a.threshold_zoom_level.total_cmp(&b.threshold_zoom_level))
    }

    /// Show either the active rule's clusters or the raw markers, hiding the
    /// rest. Returns the attribute of the active rule.
    pub fn apply_visibility<S, I>(
        &self,
        surface: &mut S,
        zoom: f64,
        marker_handles: I,
    ) -> Option<RegionAttribute>
    where
        S: MapSurface<Handle = H> + ?Sized,
        I: IntoIterator<Item = H>,
    {
        let active = self.active_rule(zoom).map(|rule| rule.by);
        for handle in marker_handles {
            surface.set_visible(handle, active.is_none());
        }
        for cluster in self.live.values() {
            surface.set_visible(cluster.handle, Some(cluster.representative.by) == active);
        }
        active
    }

    /// Live cluster representatives ordered by id.
    pub fn clusters(&self) -> impl Iterator<Item = &ClusterRepresentative> {
        self.live.values().map(|cluster| &cluster.representative)
    }

    /// Representative rendered by `handle`.
    #[must_use]
    pub fn cluster_for(&self, handle: H) -> Option<&ClusterRepresentative> {
        self.ids_by_handle
            .get(&handle)
            .and_then(|id| self.live.get(id))
            .map(|cluster| &cluster.representative)
    }

    /// Handle of the cluster overlay with `id`.
    #[must_use]
    pub fn handle_for(&self, id: &str) -> Option<H> {
        self.live.get(id).map(|cluster| cluster.handle)
    }
}
