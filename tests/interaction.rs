use std::sync::{Arc, Mutex};
use std::time::Duration;

use mapclick::controllers::MapHandle;
use mapclick::data::features::{Feature, FeatureSet};
use mapclick::data::geometry::{Circle, GeoPoint, Geometry, RadiusUnit};
use mapclick::data::layers::{FeatureLayer, Layer, MapLayers, ReferenceLayer};
use mapclick::data::popup::PopupOptions;
use mapclick::data::query::{PendingQuery, Query, QueryEngine, QueryResolver, SpatialRelationship};
use mapclick::events::{EventFilter, EventKind};
use mapclick::{
    ClickEvent, ClickMode, EventController, InteractionController, InteractionSettings, LocalQueryEngine,
    QueryError, StaleResultPolicy,
};
use serde_json::Map;

/// Engine that hands every query to the test to resolve by hand.
#[derive(Default)]
struct ManualEngine {
    issued: Mutex<Vec<(String, Query, QueryResolver)>>,
}

impl ManualEngine {
    fn take(&self) -> Vec<(String, Query, QueryResolver)> {
        std::mem::take(&mut *self.issued.lock().unwrap())
    }
}

impl QueryEngine for ManualEngine {
    fn query_features(&self, layer: &FeatureLayer, query: Query) -> PendingQuery {
        let (resolver, pending) = PendingQuery::channel(layer.id.clone());
        self.issued.lock().unwrap().push((layer.id.clone(), query, resolver));
        pending
    }
}

const CLICK: GeoPoint = GeoPoint::new(33.34, -118.38);

fn point_feature(id: &str, lat: f64, lon: f64) -> Feature {
    Feature {
        id: id.into(),
        attributes: Map::new(),
        geometry: Some(Geometry::Point(GeoPoint::new(lat, lon))),
    }
}

fn feature_set(n: usize) -> FeatureSet {
    FeatureSet {
        features: (0..n).map(|i| point_feature(&format!("f{i}"), 33.3, -118.3)).collect(),
        exceeded_transfer_limit: false,
    }
}

fn demo_map() -> MapHandle {
    MapHandle::new(MapLayers::new(vec![
        Layer::Reference(ReferenceLayer::new("coast", "Coast", vec![])),
        Layer::Feature(FeatureLayer::new(
            "places",
            "Places",
            vec![
                point_feature("avalon", 33.3428, -118.3267),
                point_feature("la", 34.05, -118.24),
            ],
        )),
    ]))
}

fn setup(settings: InteractionSettings) -> (InteractionController, Arc<ManualEngine>) {
    let engine = Arc::new(ManualEngine::default());
    let ctrl = InteractionController::new(demo_map(), engine.clone(), settings);
    (ctrl, engine)
}

fn open_popup(ctrl: &InteractionController) {
    ctrl.map().popup.open(PopupOptions {
        location: CLICK,
        title: "t".into(),
        content: "c".into(),
    });
}

#[test]
fn set_mode_then_mode_returns_it() {
    let (ctrl, _) = setup(InteractionSettings::default());
    assert_eq!(ctrl.mode(), ClickMode::Unset);
    for m in [ClickMode::Coordinates, ClickMode::Buffer, ClickMode::Unset, ClickMode::Buffer] {
        ctrl.set_mode(m);
        assert_eq!(ctrl.mode(), m);
    }
}

#[test]
fn buffer_mode_closes_visible_popup() {
    let (ctrl, _) = setup(InteractionSettings::default());
    open_popup(&ctrl);
    ctrl.set_mode(ClickMode::Buffer);
    assert!(!ctrl.map().popup.is_visible());

    // Already hidden stays hidden; re-entering Buffer is harmless.
    ctrl.set_mode(ClickMode::Buffer);
    assert!(!ctrl.map().popup.is_visible());
}

#[test]
fn coordinates_mode_never_closes_popup() {
    let (ctrl, _) = setup(InteractionSettings::default());
    open_popup(&ctrl);
    ctrl.set_mode(ClickMode::Coordinates);
    assert!(ctrl.map().popup.is_visible());
}

#[test]
fn coordinates_click_opens_popup_with_formatted_location() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Coordinates);
    ctrl.map().graphics.add(mapclick::data::graphics::Graphic::new(
        Geometry::Point(CLICK),
        mapclick::data::symbols::Symbol::click_marker(),
    ));

    ctrl.on_map_click(&ClickEvent::at(CLICK));

    let popup = ctrl.map().popup.state();
    assert!(popup.visible);
    assert_eq!(popup.location, Some(CLICK));
    assert_eq!(popup.title, "Coordinates");
    assert_eq!(popup.content, "Latitude: 33.34000, Longitude: -118.38000");
    assert!(ctrl.map().graphics.is_empty(), "graphics are cleared on click");
    assert!(engine.take().is_empty());
}

#[test]
fn unset_click_only_clears_graphics() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.map().graphics.add(mapclick::data::graphics::Graphic::new(
        Geometry::Point(CLICK),
        mapclick::data::symbols::Symbol::click_marker(),
    ));
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    assert!(ctrl.map().graphics.is_empty());
    assert!(!ctrl.map().popup.is_visible());
    assert!(engine.take().is_empty());
}

#[test]
fn buffer_click_draws_circle_before_result() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));

    let graphics = ctrl.map().graphics.snapshot();
    assert_eq!(graphics.len(), 1);
    match &graphics[0].geometry {
        Some(Geometry::Circle(c)) => {
            assert_eq!(c.center, CLICK);
            assert_eq!(c.radius, 50_000.0);
            assert_eq!(c.radius_unit, RadiusUnit::Meters);
        }
        other => panic!("expected a circle, got {other:?}"),
    }

    let issued = engine.take();
    assert_eq!(issued.len(), 1);
    let (layer, query, _resolver) = &issued[0];
    assert_eq!(layer, "places");
    assert_eq!(query.spatial_relationship, SpatialRelationship::Intersects);
    assert!(query.return_geometry);
    assert_eq!(
        query.geometry,
        Some(Geometry::Circle(Circle::new(CLICK, 50_000.0, RadiusUnit::Meters)))
    );
    assert_eq!(ctrl.in_flight(), 1);
}

#[test]
fn resolved_features_become_graphics() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));

    assert_eq!(ctrl.poll(), 0);
    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.resolve(feature_set(3));

    assert_eq!(ctrl.poll(), 1);
    assert_eq!(ctrl.map().graphics.len(), 1 + 3);
    assert_eq!(ctrl.in_flight(), 0);
    let from_features = ctrl
        .map()
        .graphics
        .snapshot()
        .iter()
        .filter(|g| g.source_feature.is_some())
        .count();
    assert_eq!(from_features, 3);
}

#[test]
fn features_without_geometry_still_get_one_graphic_each() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));

    let bare = FeatureSet {
        features: (0..3)
            .map(|i| Feature {
                id: format!("bare{i}"),
                attributes: Map::new(),
                geometry: None,
            })
            .collect(),
        exceeded_transfer_limit: false,
    };
    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.resolve(bare);
    assert_eq!(ctrl.poll(), 1);

    let graphics = ctrl.map().graphics.snapshot();
    assert_eq!(graphics.len(), 1 + 3);
    assert!(graphics[1..].iter().all(|g| g.geometry.is_none() && g.source_feature.is_some()));
}

#[test]
fn rejected_query_keeps_circle() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.reject(QueryError::Engine("service unavailable".into()));

    assert_eq!(ctrl.poll(), 1);
    let graphics = ctrl.map().graphics.snapshot();
    assert_eq!(graphics.len(), 1);
    assert!(matches!(graphics[0].geometry, Some(Geometry::Circle(_))));
    assert_eq!(ctrl.last_failure(), None, "failures are not surfaced by default");
}

#[test]
fn dropped_resolver_counts_as_failure() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    drop(engine.take());

    assert_eq!(ctrl.poll(), 1);
    assert_eq!(ctrl.map().graphics.len(), 1);
}

#[test]
fn surfaced_failure_can_be_dismissed_and_buffer_removed() {
    let settings = InteractionSettings {
        surface_query_errors: true,
        remove_buffer_on_failure: true,
        ..InteractionSettings::default()
    };
    let (ctrl, engine) = setup(settings);
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.reject(QueryError::Engine("boom".into()));
    ctrl.poll();

    assert!(ctrl.map().graphics.is_empty());
    let failure = ctrl.last_failure().unwrap();
    assert_eq!(failure.layer, "places");
    assert_eq!(failure.error, QueryError::Engine("boom".into()));
    ctrl.dismiss_failure();
    assert_eq!(ctrl.last_failure(), None);
}

#[test]
fn no_feature_layer_is_a_query_failure() {
    let engine = Arc::new(ManualEngine::default());
    let map = MapHandle::new(MapLayers::new(vec![Layer::Reference(ReferenceLayer::new(
        "coast",
        "Coast",
        vec![],
    ))]));
    let settings = InteractionSettings {
        surface_query_errors: true,
        ..InteractionSettings::default()
    };
    let ctrl = InteractionController::new(map, engine.clone(), settings);
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));

    assert_eq!(ctrl.map().graphics.len(), 1, "circle stays");
    assert!(engine.take().is_empty());
    assert_eq!(ctrl.last_failure().unwrap().error, QueryError::NoFeatureLayer);
}

#[test]
fn late_result_is_applied_after_mode_switch_by_default() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    ctrl.set_mode(ClickMode::Coordinates);

    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.resolve(feature_set(2));
    ctrl.poll();
    assert_eq!(ctrl.map().graphics.len(), 1 + 2);
}

#[test]
fn late_result_is_dropped_under_discard_policy() {
    let settings = InteractionSettings {
        stale_results: StaleResultPolicy::Discard,
        ..InteractionSettings::default()
    };
    let (ctrl, engine) = setup(settings);
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    ctrl.set_mode(ClickMode::Coordinates);

    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.resolve(feature_set(2));
    assert_eq!(ctrl.poll(), 1);
    assert_eq!(ctrl.map().graphics.len(), 1);
}

#[test]
fn late_failure_is_dropped_under_discard_policy() {
    let events = EventController::new();
    let rx = events.subscribe(EventFilter::only(EventKind::QUERY_FAILED | EventKind::QUERY_DISCARDED));
    let settings = InteractionSettings {
        stale_results: StaleResultPolicy::Discard,
        surface_query_errors: true,
        remove_buffer_on_failure: true,
        ..InteractionSettings::default()
    };
    let engine = Arc::new(ManualEngine::default());
    let ctrl = InteractionController::new(demo_map(), engine.clone(), settings).with_events(events);
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    ctrl.set_mode(ClickMode::Coordinates);

    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.reject(QueryError::Engine("late".into()));
    assert_eq!(ctrl.poll(), 1);

    assert_eq!(ctrl.last_failure(), None);
    assert_eq!(ctrl.map().graphics.len(), 1, "circle left alone");
    let evt = rx.try_recv().unwrap();
    assert_eq!(evt.kinds, EventKind::QUERY_DISCARDED);
    assert!(evt.query.unwrap().error.is_some());
    assert!(rx.try_recv().is_err());
}

#[test]
fn overlapping_queries_both_apply_to_current_overlay() {
    let (ctrl, engine) = setup(InteractionSettings::default());
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    ctrl.on_map_click(&ClickEvent::at(GeoPoint::new(33.5, -118.5)));
    assert_eq!(ctrl.in_flight(), 2);

    let mut issued = engine.take();
    let (_, _, second) = issued.pop().unwrap();
    let (_, _, first) = issued.pop().unwrap();
    second.resolve(feature_set(1));
    first.resolve(feature_set(2));
    assert_eq!(ctrl.poll(), 2);

    // Only the second circle survives the clear; both result sets land on it.
    let circles = ctrl
        .map()
        .graphics
        .snapshot()
        .iter()
        .filter(|g| matches!(g.geometry, Some(Geometry::Circle(_))))
        .count();
    assert_eq!(circles, 1);
    assert_eq!(ctrl.map().graphics.len(), 1 + 1 + 2);
}

#[test]
fn click_marker_is_opt_in() {
    let settings = InteractionSettings {
        click_marker: true,
        ..InteractionSettings::default()
    };
    let (ctrl, _) = setup(settings);
    ctrl.set_mode(ClickMode::Coordinates);
    ctrl.on_map_click(&ClickEvent::at(CLICK));
    let graphics = ctrl.map().graphics.snapshot();
    assert_eq!(graphics.len(), 1);
    assert_eq!(graphics[0].geometry, Some(Geometry::Point(CLICK)));
}

#[test]
fn events_follow_the_click_cycle() {
    let events = EventController::new();
    let rx = events.subscribe(EventFilter::only(
        EventKind::MODE_CHANGED | EventKind::POPUP_CLOSED | EventKind::QUERY_STARTED | EventKind::QUERY_COMPLETED,
    ));
    let engine = Arc::new(ManualEngine::default());
    let ctrl = InteractionController::new(demo_map(), engine.clone(), InteractionSettings::default())
        .with_events(events);

    open_popup(&ctrl);
    ctrl.set_mode(ClickMode::Buffer);
    let evt = rx.try_recv().unwrap();
    assert!(evt.kinds.contains(EventKind::MODE_CHANGED | EventKind::POPUP_CLOSED));
    let meta = evt.mode.unwrap();
    assert_eq!((meta.previous, meta.current), (ClickMode::Unset, ClickMode::Buffer));

    ctrl.on_map_click(&ClickEvent::at(CLICK));
    let started = rx.try_recv().unwrap();
    assert!(started.kinds.contains(EventKind::QUERY_STARTED));
    assert_eq!(started.query.unwrap().layer, "places");

    let (_, _, resolver) = engine.take().pop().unwrap();
    resolver.resolve(feature_set(4));
    ctrl.poll();
    let done = rx.try_recv().unwrap();
    assert!(done.kinds.contains(EventKind::QUERY_COMPLETED));
    assert_eq!(done.query.unwrap().feature_count, Some(4));
    assert!(rx.try_recv().is_err());
}

#[test]
fn local_engine_finds_intersecting_features() {
    let ctrl = InteractionController::new(
        demo_map(),
        Arc::new(LocalQueryEngine::new()),
        InteractionSettings::default(),
    );
    ctrl.set_mode(ClickMode::Buffer);
    ctrl.on_map_click(&ClickEvent::at(CLICK));

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while ctrl.poll() == 0 {
        assert!(std::time::Instant::now() < deadline, "query never resolved");
        std::thread::sleep(Duration::from_millis(5));
    }
    // Avalon is ~5 km away, downtown LA ~80 km.
    let hits: Vec<String> = ctrl
        .map()
        .graphics
        .snapshot()
        .into_iter()
        .filter_map(|g| g.source_feature)
        .collect();
    assert_eq!(hits, vec!["avalon".to_string()]);
}
