//! Popup (info window) state shared between the map view and the controller.

use std::sync::{Arc, Mutex};

use super::geometry::GeoPoint;

/// Arguments of [`Popup::open`].
#[derive(Debug, Clone, PartialEq)]
pub struct PopupOptions {
    pub location: GeoPoint,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopupState {
    pub visible: bool,
    pub location: Option<GeoPoint>,
    pub title: String,
    pub content: String,
}

/// Shared handle to the map's popup widget.
#[derive(Clone, Default)]
pub struct Popup {
    pub(crate) inner: Arc<Mutex<PopupState>>,
}

impl Popup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the popup at `options.location` with new content.
    pub fn open(&self, options: PopupOptions) {
        let mut s = self.inner.lock().unwrap();
        s.location = Some(options.location);
        s.title = options.title;
        s.content = options.content;
        s.visible = true;
    }

    /// Hide the popup, keeping its last content. Returns whether it was visible.
    pub fn close(&self) -> bool {
        let mut s = self.inner.lock().unwrap();
        std::mem::replace(&mut s.visible, false)
    }

    pub fn set_visible(&self, visible: bool) {
        self.inner.lock().unwrap().visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.inner.lock().unwrap().visible
    }

    pub fn state(&self) -> PopupState {
        self.inner.lock().unwrap().clone()
    }
}
