//! Overlay graphics: transient shapes drawn on top of the map layers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use super::features::Feature;
use super::geometry::Geometry;
use super::symbols::Symbol;

static NEXT_GRAPHIC_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a [`Graphic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphicId(pub u64);

impl GraphicId {
    fn next() -> Self {
        Self(NEXT_GRAPHIC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A drawable shape. Without a symbol the map falls back to the highlight
/// symbol for its geometry type. Graphics without geometry are kept in the
/// collection but never drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub id: GraphicId,
    pub geometry: Option<Geometry>,
    pub symbol: Option<Symbol>,
    pub attributes: Map<String, Value>,
    /// Id of the feature this graphic was created from, if any.
    pub source_feature: Option<String>,
}

impl Graphic {
    pub fn new(geometry: Geometry, symbol: Symbol) -> Self {
        Self {
            id: GraphicId::next(),
            geometry: Some(geometry),
            symbol: Some(symbol),
            attributes: Map::new(),
            source_feature: None,
        }
    }

    /// Graphic for a query result, one per feature. The geometry is absent
    /// when the feature was returned without one.
    pub fn from_feature(feature: &Feature) -> Self {
        Self {
            id: GraphicId::next(),
            geometry: feature.geometry.clone(),
            symbol: None,
            attributes: feature.attributes.clone(),
            source_feature: Some(feature.id.clone()),
        }
    }

    /// Symbol to draw with, or `None` when there is nothing to draw.
    pub fn effective_symbol(&self) -> Option<Symbol> {
        let geometry = self.geometry.as_ref()?;
        Some(self.symbol.unwrap_or_else(|| Symbol::highlight_for(geometry)))
    }
}

/// Shared handle to the map's overlay graphics collection.
///
/// Cloning the handle shares the collection. The `revision` counter changes on
/// every mutation so views can cheaply detect changes.
#[derive(Clone, Default)]
pub struct GraphicsLayer {
    pub(crate) inner: Arc<Mutex<GraphicsInner>>,
}

#[derive(Default)]
pub(crate) struct GraphicsInner {
    pub(crate) items: Vec<Graphic>,
    pub(crate) revision: u64,
}

impl GraphicsLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, graphic: Graphic) -> GraphicId {
        let id = graphic.id;
        let mut inner = self.inner.lock().unwrap();
        inner.items.push(graphic);
        inner.revision += 1;
        id
    }

    pub fn add_many<I: IntoIterator<Item = Graphic>>(&self, graphics: I) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.items.len();
        inner.items.extend(graphics);
        let added = inner.items.len() - before;
        if added > 0 {
            inner.revision += 1;
        }
        added
    }

    /// Remove one graphic; returns whether it was present.
    pub fn remove(&self, id: GraphicId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.items.len();
        inner.items.retain(|g| g.id != id);
        let removed = inner.items.len() != before;
        if removed {
            inner.revision += 1;
        }
        removed
    }

    /// Remove everything; returns the number of graphics removed.
    pub fn remove_all(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let n = inner.items.len();
        inner.items.clear();
        inner.revision += 1;
        n
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: GraphicId) -> bool {
        self.inner.lock().unwrap().items.iter().any(|g| g.id == id)
    }

    /// Copy of the current graphics, in drawing order.
    pub fn snapshot(&self) -> Vec<Graphic> {
        self.inner.lock().unwrap().items.clone()
    }

    pub fn revision(&self) -> u64 {
        self.inner.lock().unwrap().revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::GeoPoint;

    fn point_graphic() -> Graphic {
        Graphic::new(
            Geometry::Point(GeoPoint::new(1.0, 2.0)),
            Symbol::click_marker(),
        )
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(point_graphic().id, point_graphic().id);
    }

    #[test]
    fn clones_share_the_collection() {
        let a = GraphicsLayer::new();
        let b = a.clone();
        a.add(point_graphic());
        assert_eq!(b.len(), 1);
        assert_eq!(b.remove_all(), 1);
        assert!(a.is_empty());
    }

    #[test]
    fn remove_by_id_bumps_revision_only_when_present() {
        let layer = GraphicsLayer::new();
        let id = layer.add(point_graphic());
        let rev = layer.revision();
        assert!(layer.remove(id));
        assert!(layer.revision() > rev);
        let rev = layer.revision();
        assert!(!layer.remove(id));
        assert_eq!(layer.revision(), rev);
    }

    #[test]
    fn feature_without_geometry_still_yields_a_graphic() {
        let f = Feature {
            id: "1".into(),
            attributes: Map::new(),
            geometry: None,
        };
        let g = Graphic::from_feature(&f);
        assert_eq!(g.source_feature.as_deref(), Some("1"));
        assert!(g.geometry.is_none());
        assert!(g.effective_symbol().is_none());
    }
}
