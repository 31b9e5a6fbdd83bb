//! Behavioural tests for region clustering and zoom-driven visibility.

use std::cell::{Cell, RefCell};

use cartosync_core::recording::{OverlayId, OverlayKind, RecordingAssetSink, RecordingSurface};
use cartosync_core::{
    GroupingAttributes, MapController, Marker, RegionAttribute, RegionClusteringOptions,
    RegionClusteringRule,
};
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

type Controller = MapController<RecordingSurface, RecordingAssetSink<OverlayId>>;

struct ClusterWorld {
    controller: RefCell<Controller>,
    markers: RefCell<Vec<Marker>>,
    taiyuan_cluster: Cell<Option<OverlayId>>,
}

impl ClusterWorld {
    fn zoom_to(&self, zoom: f64) {
        let mut controller = self.controller.borrow_mut();
        controller.surface_mut().set_zoom_level(zoom);
        controller.handle_zoom_changed();
    }
}

fn shanxi(id: &str, city: &str, x: f64, y: f64) -> Marker {
    Marker::new(id, Coord { x, y }).with_grouping(GroupingAttributes {
        province: Some("Shanxi".into()),
        city: Some(city.into()),
        district: None,
    })
}

#[fixture]
fn cluster_world() -> ClusterWorld {
    ClusterWorld {
        controller: RefCell::new(MapController::new(
            RecordingSurface::new(),
            RecordingAssetSink::new(),
        )),
        markers: RefCell::new(Vec::new()),
        taiyuan_cluster: Cell::new(None),
    }
}

#[given("three markers in two cities")]
fn three_markers(#[from(cluster_world)] world: &ClusterWorld) {
    let markers = vec![
        shanxi("t1", "Taiyuan", 112.5, 37.8),
        shanxi("t2", "Taiyuan", 112.6, 37.9),
        shanxi("d1", "Datong", 113.3, 40.1),
    ];
    world.controller.borrow_mut().set_markers(markers.clone());
    world.markers.replace(markers);
}

#[given("clustering rules for district 12, city 10 and province 8")]
fn tiered_rules(#[from(cluster_world)] world: &ClusterWorld) {
    let mut controller = world.controller.borrow_mut();
    controller.surface_mut().set_zoom_level(20.0);
    controller.set_region_clustering_options(RegionClusteringOptions::enabled(vec![
        RegionClusteringRule::new(RegionAttribute::District, 12.0),
        RegionClusteringRule::new(RegionAttribute::City, 10.0),
        RegionClusteringRule::new(RegionAttribute::Province, 8.0),
    ]));
    world
        .taiyuan_cluster
        .set(controller.cluster_handle("city_Taiyuan"));
}

#[when("the map zooms to 9.5")]
fn zoom_nine_and_a_half(#[from(cluster_world)] world: &ClusterWorld) {
    world.zoom_to(9.5);
}

#[when("the map zooms to 13")]
fn zoom_thirteen(#[from(cluster_world)] world: &ClusterWorld) {
    world.zoom_to(13.0);
}

#[when("the map zooms to 11")]
fn zoom_eleven(#[from(cluster_world)] world: &ClusterWorld) {
    world.zoom_to(11.0);
}

#[when("a Taiyuan marker moves east")]
fn move_taiyuan_marker(#[from(cluster_world)] world: &ClusterWorld) {
    let mut markers = world.markers.borrow_mut();
    if let Some(moved) = markers.iter_mut().find(|marker| marker.id == "t2") {
        moved.coordinate.x = 113.6;
    }
    world.controller.borrow_mut().set_markers(markers.clone());
}

#[then("only city clusters are visible")]
fn only_city_clusters(#[from(cluster_world)] world: &ClusterWorld) {
    let controller = world.controller.borrow();
    assert_eq!(
        controller.surface().visible_ids(OverlayKind::Cluster),
        vec!["city_Datong", "city_Taiyuan"]
    );
    assert_eq!(controller.active_rule(), Some(RegionAttribute::City));
}

#[then("raw markers are hidden")]
fn markers_hidden(#[from(cluster_world)] world: &ClusterWorld) {
    let controller = world.controller.borrow();
    assert!(controller.surface().visible_ids(OverlayKind::Marker).is_empty());
}

#[then("no clusters are visible")]
fn no_clusters(#[from(cluster_world)] world: &ClusterWorld) {
    let controller = world.controller.borrow();
    assert!(controller.surface().visible_ids(OverlayKind::Cluster).is_empty());
    assert_eq!(controller.active_rule(), None);
}

#[then("raw markers are visible")]
fn markers_visible(#[from(cluster_world)] world: &ClusterWorld) {
    let controller = world.controller.borrow();
    assert_eq!(
        controller.surface().visible_ids(OverlayKind::Marker),
        vec!["d1", "t1", "t2"]
    );
}

#[then("the Taiyuan city cluster keeps its overlay")]
fn taiyuan_kept(#[from(cluster_world)] world: &ClusterWorld) {
    let before = world.taiyuan_cluster.get();
    assert!(before.is_some(), "cluster existed before the move");
    assert_eq!(world.controller.borrow().cluster_handle("city_Taiyuan"), before);
}

#[then("the Taiyuan city cluster centroid follows its members")]
fn taiyuan_centroid(#[from(cluster_world)] world: &ClusterWorld) {
    let controller = world.controller.borrow();
    let cluster = controller
        .clusters()
        .find(|cluster| cluster.id == "city_Taiyuan")
        .expect("Taiyuan cluster present");
    assert!((cluster.centroid.x - 113.05).abs() < 1e-9);
    assert!((cluster.centroid.y - 37.85).abs() < 1e-9);
    assert_eq!(cluster.member_count, 2);
}

#[then("the unknown district cluster holds every marker")]
fn unknown_district(#[from(cluster_world)] world: &ClusterWorld) {
    let controller = world.controller.borrow();
    assert_eq!(
        controller.surface().visible_ids(OverlayKind::Cluster),
        vec!["district_unknown"]
    );
    let members = controller
        .clusters()
        .find(|cluster| cluster.id == "district_unknown")
        .map(|cluster| cluster.member_count);
    assert_eq!(members, Some(3));
}

#[scenario(
    path = "tests/features/clustering.feature",
    name = "Zooming out past a threshold shows that rule's clusters"
)]
fn zooming_out_shows_clusters(#[from(cluster_world)] world: ClusterWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/clustering.feature",
    name = "Zooming in past every threshold shows raw markers"
)]
fn zooming_in_shows_markers(#[from(cluster_world)] world: ClusterWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/clustering.feature",
    name = "Moving a marker updates its cluster in place"
)]
fn moving_marker_updates_cluster(#[from(cluster_world)] world: ClusterWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/clustering.feature",
    name = "Markers without a district fall into the unknown bucket"
)]
fn unknown_bucket(#[from(cluster_world)] world: ClusterWorld) {
    let _ = world;
}
