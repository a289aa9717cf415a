//! Controllers for interacting with the map from external code.
//!
//! The controllers expose lightweight state and a subscription mechanism so
//! non-UI code can observe the view and push simple requests (like moving the
//! camera) without touching the UI thread.

use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::data::geometry::GeoPoint;
use crate::data::graphics::GraphicsLayer;
use crate::data::layers::MapLayers;
use crate::data::popup::Popup;

/// Handles to the collaborators owned by the map view.
///
/// Handed out once the view is ready; everything inside is cheap to clone and
/// shared with the UI thread.
#[derive(Clone, Default)]
pub struct MapHandle {
    /// Overlay graphics drawn above all layers.
    pub graphics: GraphicsLayer,
    pub layers: MapLayers,
    pub popup: Popup,
}

impl MapHandle {
    pub fn new(layers: MapLayers) -> Self {
        Self {
            graphics: GraphicsLayer::new(),
            layers,
            popup: Popup::new(),
        }
    }
}

impl fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapHandle")
            .field("graphics", &self.graphics.len())
            .field("layers", &self.layers.len())
            .field("popup_visible", &self.popup.is_visible())
            .finish()
    }
}

/// Current view information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewInfo {
    /// Geographic center of the visible region.
    pub center: GeoPoint,
    /// Visible longitude span in degrees.
    pub span_degrees: f64,
    /// Size of the map canvas in logical pixels.
    pub canvas_size: Option<[f32; 2]>,
}

/// Controller to get/set the map view and subscribe to updates.
#[derive(Clone)]
pub struct ViewController {
    pub(crate) inner: Arc<Mutex<ViewCtrlInner>>, // crate-visible for UI
}

pub(crate) struct ViewCtrlInner {
    pub(crate) current: Option<ViewInfo>,
    pub(crate) request_go_to: Option<(GeoPoint, f64)>,
    pub(crate) listeners: Vec<Sender<ViewInfo>>,
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ViewCtrlInner {
                current: None,
                request_go_to: None,
                listeners: Vec::new(),
            })),
        }
    }

    /// Last view published by the UI (if any frame was drawn yet).
    pub fn current(&self) -> Option<ViewInfo> {
        self.inner.lock().unwrap().current
    }

    /// Request the view to center on `center` showing `span_degrees` of
    /// longitude. Applied on the next frame; a later request replaces an
    /// unapplied one.
    pub fn go_to(&self, center: GeoPoint, span_degrees: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.request_go_to = Some((center, span_degrees.max(f64::EPSILON)));
    }

    /// Subscribe to view updates. The receiver gets a [`ViewInfo`] every frame
    /// the visible region changes.
    pub fn subscribe(&self) -> std::sync::mpsc::Receiver<ViewInfo> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.listeners.push(tx);
        rx
    }

    pub(crate) fn take_go_to(&self) -> Option<(GeoPoint, f64)> {
        self.inner.lock().unwrap().request_go_to.take()
    }

    /// Record the view drawn this frame. Listeners are only notified when it
    /// differs from the previous one.
    pub(crate) fn publish(&self, info: ViewInfo) {
        let mut inner = self.inner.lock().unwrap();
        if inner.current == Some(info) {
            return;
        }
        inner.current = Some(info);
        inner.listeners.retain(|s| s.send(info).is_ok());
    }
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}
