//! Map layers: queryable feature layers and draw-only reference layers.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::features::Feature;
use super::query::Query;
use super::symbols::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    /// Queryable dataset.
    Feature,
    /// Drawn for context only; never queried.
    Reference,
}

/// A queryable dataset of features.
#[derive(Debug, Clone)]
pub struct FeatureLayer {
    pub id: String,
    pub title: String,
    pub visible: bool,
    /// Symbol override; `None` picks a default per geometry type.
    pub symbol: Option<Symbol>,
    features: Arc<Vec<Feature>>,
}

impl FeatureLayer {
    pub fn new(id: impl Into<String>, title: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            visible: true,
            symbol: None,
            features: Arc::new(features),
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Query pre-populated with this layer's defaults: all fields, no
    /// geometry filter.
    pub fn create_query(&self) -> Query {
        Query {
            out_fields: vec!["*".to_string()],
            ..Query::default()
        }
    }
}

/// Context geometry drawn under the feature layers.
#[derive(Debug, Clone)]
pub struct ReferenceLayer {
    pub id: String,
    pub title: String,
    pub visible: bool,
    pub symbol: Option<Symbol>,
    features: Arc<Vec<Feature>>,
}

impl ReferenceLayer {
    pub fn new(id: impl Into<String>, title: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            visible: true,
            symbol: None,
            features: Arc::new(features),
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}

#[derive(Debug, Clone)]
pub enum Layer {
    Feature(FeatureLayer),
    Reference(ReferenceLayer),
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Feature(_) => LayerKind::Feature,
            Layer::Reference(_) => LayerKind::Reference,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Layer::Feature(l) => &l.id,
            Layer::Reference(l) => &l.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Layer::Feature(l) => &l.title,
            Layer::Reference(l) => &l.title,
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            Layer::Feature(l) => l.visible,
            Layer::Reference(l) => l.visible,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        match self {
            Layer::Feature(l) => l.visible = visible,
            Layer::Reference(l) => l.visible = visible,
        }
    }

    pub fn features(&self) -> &[Feature] {
        match self {
            Layer::Feature(l) => l.features(),
            Layer::Reference(l) => l.features(),
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            Layer::Feature(l) => l.symbol,
            Layer::Reference(l) => l.symbol,
        }
    }
}

/// Shared, ordered list of the map's layers (bottom to top).
#[derive(Debug, Clone, Default)]
pub struct MapLayers {
    pub(crate) inner: Arc<Mutex<Vec<Layer>>>,
}

impl MapLayers {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(layers)),
        }
    }

    pub fn push(&self, layer: Layer) {
        self.inner.lock().unwrap().push(layer);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First layer of type feature, in map order. Visibility is not considered.
    pub fn first_feature_layer(&self) -> Option<FeatureLayer> {
        self.inner.lock().unwrap().iter().find_map(|l| match l {
            Layer::Feature(f) => Some(f.clone()),
            Layer::Reference(_) => None,
        })
    }

    pub fn set_visible(&self, id: &str, visible: bool) -> bool {
        let mut layers = self.inner.lock().unwrap();
        match layers.iter_mut().find(|l| l.id() == id) {
            Some(layer) => {
                layer.set_visible(visible);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<Layer> {
        self.inner.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_feature_layer_skips_reference_layers() {
        let layers = MapLayers::new(vec![
            Layer::Reference(ReferenceLayer::new("coast", "Coastline", vec![])),
            Layer::Feature(FeatureLayer::new("cities", "Cities", vec![])),
            Layer::Feature(FeatureLayer::new("parks", "Parks", vec![])),
        ]);
        assert_eq!(layers.first_feature_layer().unwrap().id, "cities");
    }

    #[test]
    fn no_feature_layer() {
        let layers = MapLayers::new(vec![Layer::Reference(ReferenceLayer::new(
            "coast",
            "Coastline",
            vec![],
        ))]);
        assert!(layers.first_feature_layer().is_none());
    }

    #[test]
    fn toggle_visibility_by_id() {
        let layers = MapLayers::new(vec![Layer::Feature(FeatureLayer::new("a", "A", vec![]))]);
        assert!(layers.set_visible("a", false));
        assert!(!layers.snapshot()[0].visible());
        assert!(!layers.set_visible("missing", true));
    }

    #[test]
    fn create_query_requests_all_fields() {
        let q = FeatureLayer::new("a", "A", vec![]).create_query();
        assert_eq!(q.out_fields, vec!["*".to_string()]);
        assert!(q.geometry.is_none());
    }
}
