use std::path::Path;

use mapclick::data::features::{load_geojson_file, parse_geojson};
use mapclick::data::geometry::{GeoPoint, Geometry};
use mapclick::data::query::Query;
use mapclick::data::sources::demo_layers;
use mapclick::{Circle, DataError, RadiusUnit};

fn asset(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/demo").join(name)
}

#[test]
fn demo_places_load_from_disk() {
    let features = load_geojson_file(&asset("places.geojson")).unwrap();
    let avalon = features.iter().find(|f| f.id == "avalon").unwrap();
    assert_eq!(avalon.display_name(), "Avalon");
    assert_eq!(avalon.geometry, Some(Geometry::Point(GeoPoint::new(33.3428, -118.3267))));
    assert!(features
        .iter()
        .any(|f| matches!(f.geometry, Some(Geometry::Polyline(_)))));
}

#[test]
fn every_demo_file_parses() {
    for name in ["coastline.geojson", "places.geojson", "marine_reserves.geojson"] {
        let features = load_geojson_file(&asset(name)).unwrap();
        assert!(!features.is_empty(), "{name} is empty");
        assert!(features.iter().all(|f| f.geometry.is_some()), "{name} has a feature without geometry");
    }
}

#[test]
fn malformed_json_is_a_json_error() {
    assert!(matches!(parse_geojson("{ not json"), Err(DataError::Json(_))));
}

#[test]
fn buffer_around_avalon_hits_catalina_features_only() {
    let layers = demo_layers().unwrap();
    let places = layers.first_feature_layer().unwrap();
    let query = Query {
        geometry: Some(Geometry::Circle(Circle::new(
            GeoPoint::new(33.34, -118.38),
            50_000.0,
            RadiusUnit::Meters,
        ))),
        return_geometry: true,
        ..places.create_query()
    };
    let hits = query.evaluate(places.features()).unwrap();
    let ids: Vec<&str> = hits.features.iter().map(|f| f.id.as_str()).collect();
    assert!(ids.contains(&"avalon"));
    assert!(ids.contains(&"two-harbors"));
    assert!(ids.contains(&"catalina-island"));
    assert!(!ids.contains(&"redondo-beach"));
    assert!(!ids.contains(&"newport-beach"));
}
