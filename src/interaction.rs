//! Click handling: the mode-driven interaction controller.
//!
//! The map surface calls [`InteractionController::on_map_click`] for every
//! primary click. What happens depends on the [`ClickMode`] read at that
//! moment: show the coordinates in the popup, or buffer the point and query
//! the first feature layer for intersecting features.
//!
//! Queries are asynchronous. `on_map_click` only issues them; the UI loop calls
//! [`InteractionController::poll`] once per frame to apply results that have
//! arrived. Queries are never cancelled. Whether a result that arrives after a
//! newer click (or a mode change) is still drawn is decided by
//! [`StaleResultPolicy`].

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::controllers::MapHandle;
use crate::data::features::FeatureSet;
use crate::data::geometry::{Circle, GeoPoint, Geometry, RadiusUnit};
use crate::data::graphics::{Graphic, GraphicId};
use crate::data::mode::{ClickMode, ModeCell};
use crate::data::popup::PopupOptions;
use crate::data::query::{PendingQuery, QueryEngine, QueryResult, SpatialRelationship};
use crate::data::symbols::Symbol;
use crate::error::QueryError;
use crate::events::{
    ClickMeta, EventController, EventKind, GraphicsMeta, MapEvent, ModeMeta, PopupMeta, QueryMeta,
    ScreenPos,
};

/// Default buffer radius in [`RadiusUnit::Meters`].
pub const DEFAULT_BUFFER_RADIUS: f64 = 50_000.0;
/// Title of the coordinates popup.
pub const DEFAULT_POPUP_TITLE: &str = "Coordinates";
/// Decimal places of latitude and longitude in the popup text.
pub const DEFAULT_COORDINATE_DECIMALS: usize = 5;

/// A primary click on the map, already resolved to a geographic point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub map_point: GeoPoint,
    pub screen_pos: Option<ScreenPos>,
    /// Assigned by the map surface, starting at 1.
    pub sequence: u64,
}

impl ClickEvent {
    pub fn at(map_point: GeoPoint) -> Self {
        Self {
            map_point,
            screen_pos: None,
            sequence: 0,
        }
    }
}

/// What to do with a query result whose click cycle is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaleResultPolicy {
    /// Draw it into the current overlay anyway.
    #[default]
    Apply,
    /// Drop it.
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSettings {
    pub buffer_radius: f64,
    pub buffer_unit: RadiusUnit,
    pub popup_title: String,
    /// Decimal places of the coordinates shown in the popup.
    pub coordinate_decimals: usize,
    pub buffer_symbol: Symbol,
    /// Symbol of result graphics; `None` highlights by geometry type.
    pub result_symbol: Option<Symbol>,
    pub stale_results: StaleResultPolicy,
    /// Record failures so the UI can show them.
    pub surface_query_errors: bool,
    /// Remove the buffer circle when its query fails.
    pub remove_buffer_on_failure: bool,
    /// Drop a marker at every clicked point.
    pub click_marker: bool,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            buffer_radius: DEFAULT_BUFFER_RADIUS,
            buffer_unit: RadiusUnit::Meters,
            popup_title: DEFAULT_POPUP_TITLE.to_string(),
            coordinate_decimals: DEFAULT_COORDINATE_DECIMALS,
            buffer_symbol: Symbol::buffer_fill(),
            result_symbol: None,
            stale_results: StaleResultPolicy::Apply,
            surface_query_errors: false,
            remove_buffer_on_failure: false,
            click_marker: false,
        }
    }
}

/// A query failure recorded for display.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFailure {
    pub layer: String,
    pub error: QueryError,
    pub generation: u64,
}

/// `"Latitude: 33.34000, Longitude: -118.38000"` for `decimals == 5`.
pub fn format_coordinates(point: &GeoPoint, decimals: usize) -> String {
    format!(
        "Latitude: {:.*}, Longitude: {:.*}",
        decimals, point.latitude, decimals, point.longitude
    )
}

struct InFlight {
    pending: PendingQuery,
    generation: u64,
    buffer: GraphicId,
}

struct InteractionInner {
    settings: InteractionSettings,
    /// Bumped by every click and every mode change.
    generation: u64,
    in_flight: Vec<InFlight>,
    last_failure: Option<QueryFailure>,
}

/// Routes map clicks to the active workflow.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct InteractionController {
    inner: Arc<Mutex<InteractionInner>>,
    mode: ModeCell,
    map: MapHandle,
    engine: Arc<dyn QueryEngine>,
    events: Option<EventController>,
}

impl InteractionController {
    pub fn new(map: MapHandle, engine: Arc<dyn QueryEngine>, settings: InteractionSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InteractionInner {
                settings,
                generation: 0,
                in_flight: Vec::new(),
                last_failure: None,
            })),
            mode: ModeCell::new(ClickMode::Unset),
            map,
            engine,
            events: None,
        }
    }

    /// Publish interaction events on `events`.
    pub fn with_events(mut self, events: EventController) -> Self {
        self.events = Some(events);
        self
    }

    pub fn map(&self) -> &MapHandle {
        &self.map
    }

    pub fn settings(&self) -> InteractionSettings {
        self.inner.lock().unwrap().settings.clone()
    }

    pub fn mode(&self) -> ClickMode {
        self.mode.get()
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }

    /// Switch the click mode. Entering `Buffer` closes the popup.
    pub fn set_mode(&self, mode: ClickMode) {
        let previous = self.mode.replace(mode);
        self.bump_generation();
        let popup_closed = mode == ClickMode::Buffer && self.map.popup.close();
        tracing::debug!(%previous, current = %mode, popup_closed, "click mode set");

        let mut kinds = EventKind::MODE_CHANGED;
        if popup_closed {
            kinds |= EventKind::POPUP_CLOSED;
        }
        self.emit(kinds, |e| {
            e.mode = Some(ModeMeta {
                previous,
                current: mode,
            })
        });
    }

    /// Handle a click on the map. Never fails; query errors are logged.
    pub fn on_map_click(&self, click: &ClickEvent) {
        let mode = self.mode.get();
        let generation = self.bump_generation();
        let point = click.map_point;
        tracing::debug!(
            %mode,
            lat = point.latitude,
            lon = point.longitude,
            seq = click.sequence,
            "map click"
        );

        let removed = self.map.graphics.remove_all();
        self.emit(EventKind::CLICK | EventKind::GRAPHICS_CLEARED, |e| {
            e.click = Some(ClickMeta {
                location: point,
                screen_pos: click.screen_pos,
                sequence: click.sequence,
                mode,
            });
            e.graphics = Some(GraphicsMeta {
                added: 0,
                removed,
                total: 0,
            });
        });

        let settings = self.settings();
        if settings.click_marker {
            self.add_graphic(Graphic::new(Geometry::Point(point), Symbol::click_marker()));
        }

        match mode {
            ClickMode::Unset => {}
            ClickMode::Coordinates => self.show_coordinates(point, &settings),
            ClickMode::Buffer => self.buffer_and_query(point, generation, &settings),
        }
    }

    fn show_coordinates(&self, point: GeoPoint, settings: &InteractionSettings) {
        let content = format_coordinates(&point, settings.coordinate_decimals);
        self.map.popup.open(PopupOptions {
            location: point,
            title: settings.popup_title.clone(),
            content: content.clone(),
        });
        self.emit(EventKind::POPUP_OPENED, |e| {
            e.popup = Some(PopupMeta {
                location: Some(point),
                title: settings.popup_title.clone(),
                content,
            })
        });
    }

    fn buffer_and_query(&self, point: GeoPoint, generation: u64, settings: &InteractionSettings) {
        let circle = Circle::new(point, settings.buffer_radius, settings.buffer_unit);
        let buffer = self.add_graphic(Graphic::new(
            Geometry::Circle(circle),
            settings.buffer_symbol,
        ));

        let Some(layer) = self.map.layers.first_feature_layer() else {
            self.record_failure(String::new(), QueryError::NoFeatureLayer, generation, buffer);
            return;
        };

        let mut query = layer.create_query();
        query.geometry = Some(Geometry::Circle(circle));
        query.spatial_relationship = SpatialRelationship::Intersects;
        query.return_geometry = true;

        let pending = self.engine.query_features(&layer, query);
        tracing::debug!(layer = %layer.id, generation, radius_m = circle.radius_meters(), "query started");
        self.inner.lock().unwrap().in_flight.push(InFlight {
            pending,
            generation,
            buffer,
        });
        self.emit(EventKind::QUERY_STARTED, |e| {
            e.query = Some(QueryMeta {
                layer: layer.id.clone(),
                generation,
                feature_count: None,
                error: None,
            })
        });
    }

    /// Apply results of queries that have resolved since the last call.
    /// Returns how many queries completed (successfully or not).
    pub fn poll(&self) -> usize {
        let done: Vec<(InFlight, QueryResult)> = {
            let mut inner = self.inner.lock().unwrap();
            let mut done = Vec::new();
            let mut waiting = Vec::new();
            for q in inner.in_flight.drain(..) {
                match q.pending.try_take() {
                    Some(result) => done.push((q, result)),
                    None => waiting.push(q),
                }
            }
            inner.in_flight = waiting;
            done
        };

        let count = done.len();
        for (q, result) in done {
            let layer = q.pending.layer().to_string();
            let (current, policy) = {
                let inner = self.inner.lock().unwrap();
                (inner.generation, inner.settings.stale_results)
            };
            // Stale rejections are dropped along with stale successes.
            if q.generation != current && policy == StaleResultPolicy::Discard {
                self.discard_stale(layer, q.generation, current, &result);
                continue;
            }
            match result {
                Ok(features) => self.apply_features(layer, q.generation, features),
                Err(error) => self.record_failure(layer, error, q.generation, q.buffer),
            }
        }
        count
    }

    fn discard_stale(&self, layer: String, generation: u64, current: u64, result: &QueryResult) {
        let (feature_count, error) = match result {
            Ok(features) => (Some(features.len()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        tracing::debug!(%layer, generation, current, failed = error.is_some(), "discarding stale query result");
        self.emit(EventKind::QUERY_DISCARDED, |e| {
            e.query = Some(QueryMeta {
                layer,
                generation,
                feature_count,
                error,
            })
        });
    }

    fn apply_features(&self, layer: String, generation: u64, features: FeatureSet) {
        let symbol = self.inner.lock().unwrap().settings.result_symbol;

        let graphics = features.features.iter().map(|f| {
            let mut g = Graphic::from_feature(f);
            g.symbol = symbol;
            g
        });
        let added = self.map.graphics.add_many(graphics);
        tracing::info!(%layer, generation, features = features.len(), added, "query completed");

        self.emit(EventKind::QUERY_COMPLETED | EventKind::GRAPHIC_ADDED, |e| {
            e.query = Some(QueryMeta {
                layer,
                generation,
                feature_count: Some(features.len()),
                error: None,
            });
            e.graphics = Some(GraphicsMeta {
                added,
                removed: 0,
                total: self.map.graphics.len(),
            });
        });
    }

    fn record_failure(&self, layer: String, error: QueryError, generation: u64, buffer: GraphicId) {
        tracing::warn!(%layer, generation, %error, "feature query failed");

        let (remove_buffer, surface) = {
            let inner = self.inner.lock().unwrap();
            (
                inner.settings.remove_buffer_on_failure,
                inner.settings.surface_query_errors,
            )
        };
        if remove_buffer {
            self.map.graphics.remove(buffer);
        }
        if surface {
            self.inner.lock().unwrap().last_failure = Some(QueryFailure {
                layer: layer.clone(),
                error: error.clone(),
                generation,
            });
        }

        self.emit(EventKind::QUERY_FAILED, |e| {
            e.query = Some(QueryMeta {
                layer,
                generation,
                feature_count: None,
                error: Some(error.to_string()),
            })
        });
    }

    /// Number of issued queries whose result has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().unwrap().in_flight.len()
    }

    pub fn last_failure(&self) -> Option<QueryFailure> {
        self.inner.lock().unwrap().last_failure.clone()
    }

    pub fn dismiss_failure(&self) {
        self.inner.lock().unwrap().last_failure = None;
    }

    /// Close the popup on user request. Returns whether it was open.
    pub fn close_popup(&self) -> bool {
        let closed = self.map.popup.close();
        if closed {
            self.emit(EventKind::POPUP_CLOSED, |_| {});
        }
        closed
    }

    /// Remove every overlay graphic. Pending queries still apply later.
    pub fn clear_graphics(&self) -> usize {
        let removed = self.map.graphics.remove_all();
        self.emit(EventKind::GRAPHICS_CLEARED, |e| {
            e.graphics = Some(GraphicsMeta {
                added: 0,
                removed,
                total: 0,
            })
        });
        removed
    }

    fn add_graphic(&self, graphic: Graphic) -> GraphicId {
        let id = self.map.graphics.add(graphic);
        self.emit(EventKind::GRAPHIC_ADDED, |e| {
            e.graphics = Some(GraphicsMeta {
                added: 1,
                removed: 0,
                total: self.map.graphics.len(),
            })
        });
        id
    }

    fn bump_generation(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        inner.generation
    }

    fn emit(&self, kinds: EventKind, fill: impl FnOnce(&mut MapEvent)) {
        if let Some(events) = &self.events {
            let mut evt = MapEvent::new(kinds);
            fill(&mut evt);
            events.emit_filtered(evt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_formatted_with_fixed_decimals() {
        let p = GeoPoint::new(33.34, -118.38);
        assert_eq!(
            format_coordinates(&p, 5),
            "Latitude: 33.34000, Longitude: -118.38000"
        );
        assert_eq!(format_coordinates(&p, 2), "Latitude: 33.34, Longitude: -118.38");
    }

    #[test]
    fn default_settings_buffer_fifty_km() {
        let s = InteractionSettings::default();
        assert_eq!(s.buffer_radius, 50_000.0);
        assert_eq!(s.buffer_unit, RadiusUnit::Meters);
        assert_eq!(s.stale_results, StaleResultPolicy::Apply);
        assert!(!s.click_marker);
    }

    #[test]
    fn stale_policy_parses_kebab_case() {
        let p: StaleResultPolicy = serde_yaml::from_str("discard").unwrap();
        assert_eq!(p, StaleResultPolicy::Discard);
    }
}
