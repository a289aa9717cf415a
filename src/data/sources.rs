//! Building the map's layers from the embedded demo data or configured files.

use std::path::Path;

use super::features::{load_geojson_file, parse_geojson};
use super::layers::{FeatureLayer, Layer, LayerKind, MapLayers, ReferenceLayer};
use crate::config::LayerSource;
use crate::error::DataError;

const COASTLINE: &str = include_str!("../../assets/demo/coastline.geojson");
const PLACES: &str = include_str!("../../assets/demo/places.geojson");
const MARINE_RESERVES: &str = include_str!("../../assets/demo/marine_reserves.geojson");

/// The embedded demo map: a coastline reference layer and two feature layers
/// around Santa Catalina Island. Buffer queries target "places".
pub fn demo_layers() -> Result<MapLayers, DataError> {
    Ok(MapLayers::new(vec![
        Layer::Reference(ReferenceLayer::new("coastline", "Coastline", parse_geojson(COASTLINE)?)),
        Layer::Feature(FeatureLayer::new("places", "Places", parse_geojson(PLACES)?)),
        Layer::Feature(FeatureLayer::new(
            "marine-reserves",
            "Marine reserves",
            parse_geojson(MARINE_RESERVES)?,
        )),
    ]))
}

/// Load configured layers in order. Relative paths resolve against `base_dir`.
pub fn load_layers(sources: &[LayerSource], base_dir: Option<&Path>) -> Result<MapLayers, DataError> {
    let mut layers = Vec::with_capacity(sources.len());
    for src in sources {
        let path = match base_dir {
            Some(dir) if src.path.is_relative() => dir.join(&src.path),
            _ => src.path.clone(),
        };
        let features = load_geojson_file(&path)?;
        tracing::info!(layer = %src.id, path = %path.display(), features = features.len(), "loaded layer");

        let title = src.title.clone().unwrap_or_else(|| src.id.clone());
        let visible = src.visible.unwrap_or(true);
        let layer = match src.kind {
            LayerKind::Feature => {
                let mut l = FeatureLayer::new(src.id.clone(), title, features);
                l.visible = visible;
                l.symbol = src.symbol;
                Layer::Feature(l)
            }
            LayerKind::Reference => {
                let mut l = ReferenceLayer::new(src.id.clone(), title, features);
                l.visible = visible;
                l.symbol = src.symbol;
                Layer::Reference(l)
            }
        };
        layers.push(layer);
    }
    if !layers.iter().any(|l| l.kind() == LayerKind::Feature) {
        tracing::warn!("no feature layer configured; buffer queries will fail");
    }
    Ok(MapLayers::new(layers))
}

/// Configured layers, or the demo layers when none are configured.
pub fn layers_for(sources: &[LayerSource], base_dir: Option<&Path>) -> Result<MapLayers, DataError> {
    if sources.is_empty() {
        demo_layers()
    } else {
        load_layers(sources, base_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_queries_target_places() {
        let layers = demo_layers().unwrap();
        assert_eq!(layers.len(), 3);
        let first = layers.first_feature_layer().unwrap();
        assert_eq!(first.id, "places");
        assert!(first.features().iter().any(|f| f.display_name() == "Avalon"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let src = LayerSource {
            id: "x".into(),
            title: None,
            path: "does/not/exist.geojson".into(),
            kind: LayerKind::Feature,
            symbol: None,
            visible: None,
        };
        let err = load_layers(&[src], Some(Path::new("/nonexistent"))).unwrap_err();
        match err {
            DataError::Read { path, .. } => assert!(path.starts_with("/nonexistent")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
