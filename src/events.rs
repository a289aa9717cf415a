//! Event bus for the map application.
//!
//! Callers subscribe to map and interaction events via [`EventController`].
//! Each event carries a set of [`EventKind`] flags (bitflags-style) so that a
//! single occurrence can match multiple categories (e.g. the popup closing
//! because the mode switched is both `MODE_CHANGED` and `POPUP_CLOSED`).
//!
//! The caller specifies an [`EventFilter`] to receive only the events they
//! care about. The filter is a simple OR mask: an event is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::controllers::MapHandle;
use crate::data::geometry::GeoPoint;
use crate::data::mode::ClickMode;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the *categories* an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Pointer / interaction ────────────────────────────────────────────
    /// A primary click on the map that resolved to a geographic point.
    pub const CLICK: Self = Self(1 << 0);
    /// The click mode was set (also emitted when re-selecting the active mode).
    pub const MODE_CHANGED: Self = Self(1 << 1);

    // ── Popup ───────────────────────────────────────────────────────────
    pub const POPUP_OPENED: Self = Self(1 << 2);
    pub const POPUP_CLOSED: Self = Self(1 << 3);

    // ── Overlay graphics ────────────────────────────────────────────────
    /// The overlay graphics were cleared at the start of a click cycle.
    pub const GRAPHICS_CLEARED: Self = Self(1 << 4);
    /// One or more graphics were added to the overlay.
    pub const GRAPHIC_ADDED: Self = Self(1 << 5);

    // ── Queries ─────────────────────────────────────────────────────────
    pub const QUERY_STARTED: Self = Self(1 << 6);
    pub const QUERY_COMPLETED: Self = Self(1 << 7);
    pub const QUERY_FAILED: Self = Self(1 << 8);
    /// A result arrived for an outdated click and was dropped.
    pub const QUERY_DISCARDED: Self = Self(1 << 9);

    // ── View ────────────────────────────────────────────────────────────
    /// The map view finished its first layout. Emitted once.
    pub const VIEW_READY: Self = Self(1 << 10);
    pub const PAN: Self = Self(1 << 11);
    pub const ZOOM: Self = Self(1 << 12);

    // ── Hotkeys / keyboard ──────────────────────────────────────────────
    /// A configured hotkey was pressed.
    pub const KEY_PRESSED: Self = Self(1 << 13);

    /// Wildcard: matches *every* event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Combine two event kinds (bitwise OR).
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other` (at least one bit in common).
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::Not for EventKind {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

const KIND_NAMES: &[(EventKind, &str)] = &[
    (EventKind::CLICK, "CLICK"),
    (EventKind::MODE_CHANGED, "MODE_CHANGED"),
    (EventKind::POPUP_OPENED, "POPUP_OPENED"),
    (EventKind::POPUP_CLOSED, "POPUP_CLOSED"),
    (EventKind::GRAPHICS_CLEARED, "GRAPHICS_CLEARED"),
    (EventKind::GRAPHIC_ADDED, "GRAPHIC_ADDED"),
    (EventKind::QUERY_STARTED, "QUERY_STARTED"),
    (EventKind::QUERY_COMPLETED, "QUERY_COMPLETED"),
    (EventKind::QUERY_FAILED, "QUERY_FAILED"),
    (EventKind::QUERY_DISCARDED, "QUERY_DISCARDED"),
    (EventKind::VIEW_READY, "VIEW_READY"),
    (EventKind::PAN, "PAN"),
    (EventKind::ZOOM, "ZOOM"),
    (EventKind::KEY_PRESSED, "KEY_PRESSED"),
];

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in KIND_NAMES {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }

        // Bits that weren't covered by the known list
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata – per-event-type payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Screen (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct ClickMeta {
    /// Geographic point the click resolved to.
    pub location: GeoPoint,
    pub screen_pos: Option<ScreenPos>,
    /// Click sequence number, starting at 1.
    pub sequence: u64,
    /// Mode in effect when the click was handled.
    pub mode: ClickMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeMeta {
    pub previous: ClickMode,
    pub current: ClickMode,
}

#[derive(Debug, Clone)]
pub struct PopupMeta {
    pub location: Option<GeoPoint>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsMeta {
    /// Graphics added by this event.
    pub added: usize,
    /// Graphics removed by this event.
    pub removed: usize,
    /// Overlay size afterwards.
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct QueryMeta {
    /// Layer id the query targeted. Empty when no feature layer existed.
    pub layer: String,
    /// Generation of the click cycle that issued the query.
    pub generation: u64,
    /// Number of features returned (completed queries only).
    pub feature_count: Option<usize>,
    /// Error text (failed queries only).
    pub error: Option<String>,
}

/// Visible region after a pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewChangeMeta {
    pub center: GeoPoint,
    /// Visible longitude span in degrees.
    pub span_degrees: f64,
}

#[derive(Debug, Clone)]
pub struct KeyPressMeta {
    /// The hotkey as displayed, e.g. `"Ctrl+X"`.
    pub key: String,
    /// Action the hotkey is bound to.
    pub action: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// MapEvent – the top-level event type
// ─────────────────────────────────────────────────────────────────────────────

/// An event emitted by the map application.
///
/// `kinds` is a bitflag set of [`EventKind`] categories. The various
/// `Option<…Meta>` fields carry metadata relevant to the kinds that are set.
#[derive(Debug, Clone)]
pub struct MapEvent {
    pub kinds: EventKind,
    /// Seconds since the controller was created; set on emit.
    pub timestamp: f64,

    pub click: Option<ClickMeta>,
    pub mode: Option<ModeMeta>,
    pub popup: Option<PopupMeta>,
    pub graphics: Option<GraphicsMeta>,
    pub query: Option<QueryMeta>,
    pub view_change: Option<ViewChangeMeta>,
    pub key_press: Option<KeyPressMeta>,
    /// Handles to the map's collaborators (`VIEW_READY` only).
    pub view_ready: Option<MapHandle>,
}

impl MapEvent {
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0, // will be set by controller
            click: None,
            mode: None,
            popup: None,
            graphics: None,
            query: None,
            view_change: None,
            key_press: None,
            view_ready: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// A filter that selects which event categories a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &MapEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct Subscriber {
    filter: EventFilter,
    sender: Sender<MapEvent>,
}

/// Controller that collects and distributes events to subscribers.
///
/// Attach it to [`MapClickConfig`](crate::config::MapClickConfig) before
/// launching the UI, then call [`subscribe`](Self::subscribe) to receive
/// events on an `mpsc` channel.
#[derive(Clone)]
pub struct EventController {
    pub(crate) inner: Arc<Mutex<EventCtrlInner>>,
}

pub(crate) struct EventCtrlInner {
    pub(crate) subscribers: Vec<Subscriber>,
    pub(crate) start_instant: std::time::Instant,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<MapEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.push(Subscriber { filter, sender: tx });
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<MapEvent> {
        self.subscribe(EventFilter::all())
    }

    /// Emit an event to all matching subscribers.
    ///
    /// Public so that embedding code can inject synthetic events.
    pub fn emit(&self, event: MapEvent) {
        self.emit_filtered(event);
    }

    /// Send to subscribers whose filter matches. Subscribers whose receiver
    /// was dropped are pruned the next time a matching event is sent.
    pub(crate) fn emit_filtered(&self, mut event: MapEvent) {
        let mut inner = self.inner.lock().unwrap();
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        tracing::trace!(kinds = %event.kinds, "emit");
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_union_and_intersection() {
        let combined = EventKind::MODE_CHANGED | EventKind::POPUP_CLOSED;
        assert!(combined.contains(EventKind::MODE_CHANGED));
        assert!(combined.contains(EventKind::POPUP_CLOSED));
        assert!(combined.intersects(EventKind::POPUP_CLOSED));
        assert!(!EventKind::ZOOM.intersects(EventKind::CLICK));
    }

    #[test]
    fn event_filter_matches() {
        let filter = EventFilter::only(EventKind::QUERY_COMPLETED | EventKind::QUERY_FAILED);
        assert!(filter.matches(&MapEvent::new(EventKind::QUERY_FAILED)));
        assert!(!filter.matches(&MapEvent::new(EventKind::CLICK)));
        assert!(filter.matches(&MapEvent::new(
            EventKind::QUERY_COMPLETED | EventKind::GRAPHIC_ADDED
        )));
    }

    #[test]
    fn event_controller_subscribe_and_emit() {
        let ctrl = EventController::new();
        let rx_all = ctrl.subscribe_all();
        let rx_clicks = ctrl.subscribe(EventFilter::only(EventKind::CLICK));
        let rx_zoom = ctrl.subscribe(EventFilter::only(EventKind::ZOOM));

        ctrl.emit_filtered(MapEvent::new(EventKind::CLICK));

        assert!(rx_all.try_recv().is_ok());
        assert!(rx_clicks.try_recv().is_ok());
        assert!(rx_zoom.try_recv().is_err());
    }

    #[test]
    fn event_controller_timestamp_set_on_emit() {
        let ctrl = EventController::new();
        let rx = ctrl.subscribe_all();

        std::thread::sleep(std::time::Duration::from_millis(10));
        ctrl.emit_filtered(MapEvent::new(EventKind::CLICK));

        let evt = rx.try_recv().unwrap();
        assert!(evt.timestamp > 0.0);
    }

    #[test]
    fn event_kind_display() {
        assert_eq!(EventKind::CLICK.to_string(), "CLICK");
        let combo = EventKind::MODE_CHANGED | EventKind::POPUP_CLOSED;
        assert_eq!(combo.to_string(), "MODE_CHANGED|POPUP_CLOSED");
        assert_eq!(EventKind::ALL.to_string(), "ALL");
        assert_eq!(EventKind(0).to_string(), "EMPTY");
        assert!(EventKind(1 << 63).to_string().starts_with("0x"));
    }

    #[test]
    fn event_kinds_do_not_overlap() {
        for (i, (a, _)) in KIND_NAMES.iter().enumerate() {
            for (j, (b, _)) in KIND_NAMES.iter().enumerate() {
                if i != j {
                    assert!(!a.intersects(*b), "{} and {} overlap", a, b);
                }
            }
        }
    }

    #[test]
    fn dropped_receiver_is_cleaned_up() {
        let ctrl = EventController::new();
        let rx1 = ctrl.subscribe_all();
        let rx2 = ctrl.subscribe_all();
        drop(rx1);

        ctrl.emit_filtered(MapEvent::new(EventKind::CLICK));
        assert!(rx2.try_recv().is_ok());
        assert_eq!(ctrl.subscriber_count(), 1);
    }

    #[test]
    fn event_carries_metadata() {
        let mut evt = MapEvent::new(EventKind::CLICK);
        evt.click = Some(ClickMeta {
            location: GeoPoint::new(33.34, -118.38),
            screen_pos: Some(ScreenPos { x: 100.0, y: 200.0 }),
            sequence: 1,
            mode: ClickMode::Coordinates,
        });
        let click = evt.click.as_ref().unwrap();
        assert_eq!(click.location.latitude, 33.34);
        assert_eq!(click.mode, ClickMode::Coordinates);
    }
}
