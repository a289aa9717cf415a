//! Feature records and GeoJSON loading.

use std::path::Path;

use serde_json::{Map, Value};

use super::geometry::{GeoPoint, Geometry};
use crate::error::DataError;

/// A record of a feature layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Stable identifier: the GeoJSON `id`, else the position in the file.
    pub id: String,
    pub attributes: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Human-readable label: the `name` attribute if present, else the id.
    pub fn display_name(&self) -> String {
        match self.attributes.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => self.id.clone(),
        }
    }
}

/// Result of a feature query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
    /// True when the engine stopped at a record limit.
    pub exceeded_transfer_limit: bool,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Read a GeoJSON `FeatureCollection` from disk.
pub fn load_geojson_file(path: &Path) -> Result<Vec<Feature>, DataError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_geojson(&text)
}

/// Parse a GeoJSON `FeatureCollection` (or a single `Feature`).
///
/// Features whose geometry type is not supported are skipped with a warning;
/// a malformed document is an error.
pub fn parse_geojson(text: &str) -> Result<Vec<Feature>, DataError> {
    let doc: Value = serde_json::from_str(text)?;
    let raw_features: Vec<&Value> = match doc["type"].as_str() {
        Some("FeatureCollection") => doc["features"]
            .as_array()
            .ok_or_else(|| DataError::GeoJson("FeatureCollection without 'features'".into()))?
            .iter()
            .collect(),
        Some("Feature") => vec![&doc],
        Some(other) => {
            return Err(DataError::GeoJson(format!(
                "expected FeatureCollection or Feature, found '{other}'"
            )))
        }
        None => return Err(DataError::GeoJson("missing 'type'".into())),
    };

    let mut features = Vec::with_capacity(raw_features.len());
    for (idx, raw) in raw_features.into_iter().enumerate() {
        let id = match &raw["id"] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => idx.to_string(),
        };
        let attributes = raw["properties"].as_object().cloned().unwrap_or_default();
        let geometry = match &raw["geometry"] {
            Value::Null => None,
            g => match parse_geometry(g) {
                Some(geom) => Some(geom),
                None => {
                    tracing::warn!(feature = %id, "skipping feature with unsupported geometry");
                    continue;
                }
            },
        };
        features.push(Feature {
            id,
            attributes,
            geometry,
        });
    }
    Ok(features)
}

fn parse_geometry(g: &Value) -> Option<Geometry> {
    let coords = &g["coordinates"];
    match g["type"].as_str()? {
        "Point" => Some(Geometry::Point(parse_position(coords)?)),
        "MultiPoint" => Some(Geometry::Multipoint(parse_line(coords)?)),
        "LineString" => Some(Geometry::Polyline(vec![parse_line(coords)?])),
        "MultiLineString" => Some(Geometry::Polyline(parse_lines(coords)?)),
        "Polygon" => Some(Geometry::Polygon(parse_lines(coords)?)),
        "MultiPolygon" => {
            let mut rings = Vec::new();
            for poly in coords.as_array()? {
                rings.extend(parse_lines(poly)?);
            }
            Some(Geometry::Polygon(rings))
        }
        _ => None,
    }
}

/// GeoJSON positions are `[longitude, latitude, ...]`.
fn parse_position(v: &Value) -> Option<GeoPoint> {
    let a = v.as_array()?;
    Some(GeoPoint::new(a.get(1)?.as_f64()?, a.first()?.as_f64()?))
}

fn parse_line(v: &Value) -> Option<Vec<GeoPoint>> {
    v.as_array()?.iter().map(parse_position).collect()
}

fn parse_lines(v: &Value) -> Option<Vec<Vec<GeoPoint>>> {
    v.as_array()?.iter().map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_feature_document() {
        let text = r#"{"type":"Feature","id":7,"properties":{"name":"Avalon"},
            "geometry":{"type":"Point","coordinates":[-118.3267,33.3428]}}"#;
        let f = parse_geojson(text).unwrap();
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].id, "7");
        assert_eq!(f[0].display_name(), "Avalon");
        assert_eq!(
            f[0].geometry,
            Some(Geometry::Point(GeoPoint::new(33.3428, -118.3267)))
        );
    }

    #[test]
    fn multipolygon_flattens_rings() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},
            "geometry":{"type":"MultiPolygon","coordinates":[
              [[[0,0],[1,0],[1,1],[0,0]]],
              [[[5,5],[6,5],[6,6],[5,5]]]
            ]}}]}"#;
        let f = parse_geojson(text).unwrap();
        match &f[0].geometry {
            Some(Geometry::Polygon(rings)) => assert_eq!(rings.len(), 2),
            other => panic!("unexpected geometry {other:?}"),
        }
        assert_eq!(f[0].id, "0");
    }

    #[test]
    fn unsupported_geometry_is_skipped() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"GeometryCollection","geometries":[]}},
            {"type":"Feature","properties":{},"geometry":null}
        ]}"#;
        let f = parse_geojson(text).unwrap();
        assert_eq!(f.len(), 1);
        assert!(f[0].geometry.is_none());
    }

    #[test]
    fn wrong_document_type_is_an_error() {
        let err = parse_geojson(r#"{"type":"Point","coordinates":[0,0]}"#).unwrap_err();
        assert!(matches!(err, DataError::GeoJson(_)));
    }
}
