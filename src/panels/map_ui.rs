//! The map canvas.
//!
//! Layers and overlay graphics are drawn with `egui_plot` in Web Mercator:
//! x is longitude in degrees, y is the Mercator ordinate scaled to degrees,
//! and the aspect ratio is locked so shapes keep their proportions. Axis
//! ticks are labelled in latitude/longitude.
//!
//! Primary clicks that are not drags are resolved to a [`GeoPoint`] and
//! handed to [`InteractionController::on_map_click`].

use egui::{Align2, Color32, Stroke, Ui};
use egui_plot::{Line, MarkerShape, Plot, PlotBounds, PlotPoint, PlotTransform, PlotUi, Points, Polygon, Text};

use crate::color_scheme::MapColors;
use crate::config::InitialView;
use crate::controllers::{ViewController, ViewInfo};
use crate::data::geometry::{mercator_y_to_lat, project, unproject, Circle, GeoPoint, Geometry, CIRCLE_SEGMENTS};
use crate::data::layers::{Layer, LayerKind};
use crate::data::symbols::Symbol;
use crate::events::{EventController, EventKind, MapEvent, ScreenPos, ViewChangeMeta};
use crate::interaction::{ClickEvent, InteractionController};

/// Point labels are only drawn below this visible span (degrees of longitude).
const LABEL_MAX_SPAN: f64 = 3.0;

/// Bounds changes smaller than this fraction of the span are ignored.
const VIEW_EPS: f64 = 1e-9;

pub struct MapPanel {
    pub colors: MapColors,
    pub show_grid: bool,
    pub show_axes: bool,
    home: InitialView,
    /// View to apply on the next frame.
    pending_view: Option<(GeoPoint, f64)>,
    last_bounds: Option<([f64; 2], [f64; 2])>,
    view_ready: bool,
    click_seq: u64,
    hover: Option<GeoPoint>,
}

impl MapPanel {
    pub fn new(home: InitialView, colors: MapColors) -> Self {
        Self {
            colors,
            show_grid: true,
            show_axes: true,
            home,
            pending_view: Some((home.center, home.span_degrees)),
            last_bounds: None,
            view_ready: false,
            click_seq: 0,
            hover: None,
        }
    }

    pub fn go_home(&mut self) {
        self.pending_view = Some((self.home.center, self.home.span_degrees));
    }

    pub fn go_to(&mut self, center: GeoPoint, span_degrees: f64) {
        self.pending_view = Some((center, span_degrees));
    }

    /// Geographic point under the pointer in the last frame.
    pub fn hover_point(&self) -> Option<GeoPoint> {
        self.hover
    }

    pub fn is_view_ready(&self) -> bool {
        self.view_ready
    }

    /// Draw the map and dispatch clicks.
    ///
    /// `draw_overlays` is called inside the plot after the overlay graphics,
    /// so panels can draw on top of them.
    pub fn render_panel<F>(
        &mut self,
        ui: &mut Ui,
        interaction: &InteractionController,
        view_ctrl: Option<&ViewController>,
        events: Option<&EventController>,
        mut draw_overlays: F,
    ) where
        F: FnMut(&mut PlotUi),
    {
        if let Some((center, span)) = view_ctrl.and_then(|c| c.take_go_to()) {
            self.go_to(center, span);
        }

        let map = interaction.map();
        let layers = map.layers.snapshot();
        let graphics = map.graphics.snapshot();
        let popup = map.popup.state();
        let pending_view = self.pending_view.take();
        let label_color = self.colors.label;
        let graticule = self.show_grid.then_some(self.colors.graticule);
        let show_labels = self
            .last_bounds
            .map_or(true, |(min, max)| max[0] - min[0] < LABEL_MAX_SPAN);

        let plot = Plot::new("map_canvas")
            .data_aspect(1.0)
            .allow_scroll(false)
            .allow_zoom(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .auto_bounds(false)
            .show_background(false)
            .show_grid(false)
            .show_axes(self.show_axes)
            .x_axis_formatter(|x, _range| format_lon(x.value))
            .y_axis_formatter(|y, _range| format_lat(mercator_y_to_lat(y.value)))
            .label_formatter(|_name, value| {
                let p = unproject([value.x, value.y]);
                format!("{:.5}, {:.5}", p.latitude, p.longitude)
            });

        let frame = egui::Frame::NONE.fill(self.colors.background);
        let plot_resp = frame
            .show(ui, |ui| {
                plot.show(ui, |plot_ui| {
                    let resp = plot_ui.response();
                    let rect = resp.rect;

                    let scroll = resp.ctx.input(|i| i.raw_scroll_delta);
                    let wheel_zoom = scroll.y != 0.0 && resp.hovered();
                    if let Some((center, span)) = pending_view {
                        plot_ui.set_plot_bounds(bounds_for(center, span, rect.size()));
                    } else if wheel_zoom {
                        let factor = (1.0 + scroll.y * 0.002).clamp(0.5, 2.0);
                        plot_ui.zoom_bounds_around_hovered(egui::Vec2::splat(factor));
                    }

                    if let Some(color) = graticule {
                        draw_graticule(plot_ui, color);
                    }
                    for layer in layers.iter().filter(|l| l.visible()) {
                        draw_layer(plot_ui, layer, label_color, show_labels);
                    }
                    for g in &graphics {
                        if let (Some(geometry), Some(symbol)) = (&g.geometry, g.effective_symbol()) {
                            draw_geometry(plot_ui, "graphics", geometry, &symbol, 1.0);
                        }
                    }
                    if let (true, Some(loc)) = (popup.visible, popup.location) {
                        plot_ui.points(
                            Points::new("popup", vec![project(&loc)])
                                .radius(3.5)
                                .shape(MarkerShape::Circle)
                                .color(label_color),
                        );
                    }

                    draw_overlays(plot_ui);

                    plot_ui.pointer_coordinate()
                })
            })
            .inner;

        self.hover = plot_resp.inner.map(|p| unproject([p.x, p.y]));
        self.handle_click(&plot_resp.response, &plot_resp.transform, interaction);
        self.publish_view(&plot_resp.transform, view_ctrl, events);

        if !self.view_ready {
            self.view_ready = true;
            tracing::info!(layers = layers.len(), "map view ready");
            if let Some(ctrl) = events {
                let mut evt = MapEvent::new(EventKind::VIEW_READY);
                evt.view_ready = Some(map.clone());
                ctrl.emit_filtered(evt);
            }
        }

        show_popup(ui.ctx(), &plot_resp.transform, interaction);
    }

    fn handle_click(
        &mut self,
        response: &egui::Response,
        transform: &PlotTransform,
        interaction: &InteractionController,
    ) {
        if !response.clicked() {
            return;
        }
        let Some(screen) = response.interact_pointer_pos() else {
            return;
        };
        let value = transform.value_from_position(screen);
        self.click_seq += 1;
        let click = ClickEvent {
            map_point: unproject([value.x, value.y]),
            screen_pos: Some(ScreenPos {
                x: screen.x,
                y: screen.y,
            }),
            sequence: self.click_seq,
        };
        interaction.on_map_click(&click);
    }

    fn publish_view(
        &mut self,
        transform: &PlotTransform,
        view_ctrl: Option<&ViewController>,
        events: Option<&EventController>,
    ) {
        let b = transform.bounds();
        let (min, max) = (b.min(), b.max());
        if !(min[0].is_finite() && max[0].is_finite() && max[0] > min[0]) {
            return;
        }
        let span = max[0] - min[0];
        let center = unproject([(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0]);
        let frame = transform.frame();

        if let Some(ctrl) = view_ctrl {
            ctrl.publish(ViewInfo {
                center,
                span_degrees: span,
                canvas_size: Some([frame.width(), frame.height()]),
            });
        }

        let previous = self.last_bounds.replace((min, max));
        let Some((pmin, pmax)) = previous else {
            return;
        };
        let pspan = pmax[0] - pmin[0];
        let kind = if (span - pspan).abs() > VIEW_EPS * span {
            EventKind::ZOOM
        } else if (min[0] - pmin[0]).abs() > VIEW_EPS * span || (min[1] - pmin[1]).abs() > VIEW_EPS * span {
            EventKind::PAN
        } else {
            return;
        };
        #[cfg(feature = "view_debug")]
        tracing::trace!(%kind, span, lat = center.latitude, lon = center.longitude, "view changed");
        if let Some(ctrl) = events {
            let mut evt = MapEvent::new(kind);
            evt.view_change = Some(ViewChangeMeta {
                center,
                span_degrees: span,
            });
            ctrl.emit_filtered(evt);
        }
    }
}

/// Plot bounds centered on `center` showing `span` degrees of longitude in a
/// canvas of `size` pixels.
fn bounds_for(center: GeoPoint, span: f64, size: egui::Vec2) -> PlotBounds {
    let c = project(&center);
    let half_w = span / 2.0;
    let aspect = if size.x > 0.0 {
        (size.y / size.x) as f64
    } else {
        1.0
    };
    let half_h = half_w * aspect;
    PlotBounds::from_min_max([c[0] - half_w, c[1] - half_h], [c[0] + half_w, c[1] + half_h])
}

pub fn format_lat(lat: f64) -> String {
    let hemi = if lat >= 0.0 { 'N' } else { 'S' };
    format!("{:.2}°{}", lat.abs(), hemi)
}

pub fn format_lon(lon: f64) -> String {
    let hemi = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.2}°{}", lon.abs(), hemi)
}

/// Step between graticule lines giving roughly six lines across `span` degrees.
pub(crate) fn graticule_step(span: f64) -> f64 {
    const STEPS: [f64; 10] = [0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0];
    STEPS
        .iter()
        .copied()
        .find(|s| span / s <= 8.0)
        .unwrap_or(60.0)
}

fn draw_graticule(plot_ui: &mut PlotUi, color: Color32) {
    let b = plot_ui.plot_bounds();
    if !b.is_valid() {
        return;
    }
    let (min, max) = (b.min(), b.max());
    let south = mercator_y_to_lat(min[1]);
    let north = mercator_y_to_lat(max[1]);
    let step = graticule_step(max[0] - min[0]);

    let mut lon = (min[0] / step).ceil() * step;
    while lon <= max[0] {
        plot_ui.line(Line::new("graticule", vec![[lon, min[1]], [lon, max[1]]]).color(color).width(1.0));
        lon += step;
    }
    let mut lat = (south / step).ceil() * step;
    while lat <= north {
        let y = project(&GeoPoint::new(lat, 0.0))[1];
        plot_ui.line(Line::new("graticule", vec![[min[0], y], [max[0], y]]).color(color).width(1.0));
        lat += step;
    }
}

fn draw_layer(plot_ui: &mut PlotUi, layer: &Layer, label_color: Color32, show_labels: bool) {
    let name = layer.title();
    for f in layer.features() {
        let Some(geometry) = &f.geometry else {
            continue;
        };
        let symbol = layer
            .symbol()
            .unwrap_or_else(|| Symbol::layer_default_for(geometry));
        draw_geometry(plot_ui, name, geometry, &symbol, 1.0);

        if show_labels && layer.kind() == LayerKind::Feature {
            if let Geometry::Point(p) = geometry {
                let xy = project(p);
                plot_ui.text(
                    Text::new(name, PlotPoint::new(xy[0], xy[1]), format!("  {}", f.display_name()))
                        .color(label_color)
                        .anchor(Align2::LEFT_CENTER),
                );
            }
        }
    }
}

/// Draw one geometry with `symbol`. `emphasis` scales stroke widths and marker sizes.
pub(crate) fn draw_geometry(plot_ui: &mut PlotUi, name: &str, geometry: &Geometry, symbol: &Symbol, emphasis: f32) {
    match geometry {
        Geometry::Point(p) => draw_markers(plot_ui, name, vec![project(p)], symbol, emphasis),
        Geometry::Multipoint(pts) => {
            draw_markers(plot_ui, name, pts.iter().map(project).collect(), symbol, emphasis)
        }
        Geometry::Polyline(paths) => {
            let stroke = line_stroke(symbol, emphasis);
            for path in paths {
                let pts: Vec<[f64; 2]> = path.iter().map(project).collect();
                plot_ui.line(Line::new(name, pts).color(stroke.color).width(stroke.width));
            }
        }
        Geometry::Polygon(rings) => {
            for ring in rings {
                draw_ring(plot_ui, name, ring.iter().map(project).collect(), symbol, emphasis);
            }
        }
        Geometry::Circle(c) => draw_ring(plot_ui, name, circle_outline(c), symbol, emphasis),
    }
}

/// Projected circle ring, with longitudes kept within 180° of the center so a
/// circle crossing the antimeridian stays one closed shape.
fn circle_outline(circle: &Circle) -> Vec<[f64; 2]> {
    let center_lon = circle.center.longitude;
    circle
        .ring(CIRCLE_SEGMENTS)
        .iter()
        .map(|p| {
            let mut xy = project(p);
            let offset = xy[0] - center_lon;
            if offset > 180.0 {
                xy[0] -= 360.0;
            } else if offset < -180.0 {
                xy[0] += 360.0;
            }
            xy
        })
        .collect()
}

fn draw_markers(plot_ui: &mut PlotUi, name: &str, pts: Vec<[f64; 2]>, symbol: &Symbol, emphasis: f32) {
    let (shape, size, color, outline) = match symbol {
        Symbol::SimpleMarker(m) => (
            m.style.shape(),
            m.size,
            m.color.to_color32(),
            Stroke::new(m.outline.width, m.outline.color.to_color32()),
        ),
        Symbol::SimpleFill(f) => (
            MarkerShape::Circle,
            8.0,
            f.outline.color.to_color32(),
            Stroke::NONE,
        ),
        Symbol::SimpleLine(l) => (MarkerShape::Circle, 8.0, l.color.to_color32(), Stroke::NONE),
    };
    let radius = size * emphasis / 2.0;
    if outline.width > 0.0 {
        plot_ui.points(
            Points::new(name, pts.clone())
                .shape(shape)
                .radius(radius + outline.width)
                .color(outline.color),
        );
    }
    plot_ui.points(Points::new(name, pts).shape(shape).radius(radius).color(color));
}

fn draw_ring(plot_ui: &mut PlotUi, name: &str, ring: Vec<[f64; 2]>, symbol: &Symbol, emphasis: f32) {
    if ring.len() < 3 {
        return;
    }
    let stroke = line_stroke(symbol, emphasis);
    if let Symbol::SimpleFill(f) = symbol {
        // egui only fills convex shapes correctly
        if is_convex(&ring) {
            plot_ui.polygon(
                Polygon::new(name, ring.clone())
                    .fill_color(f.color.to_color32())
                    .stroke(Stroke::NONE),
            );
        }
    }
    plot_ui.line(Line::new(name, ring).color(stroke.color).width(stroke.width));
}

fn line_stroke(symbol: &Symbol, emphasis: f32) -> Stroke {
    match symbol {
        Symbol::SimpleLine(l) => Stroke::new(l.width * emphasis, l.color.to_color32()),
        Symbol::SimpleFill(f) => Stroke::new(f.outline.width * emphasis, f.outline.color.to_color32()),
        Symbol::SimpleMarker(m) => Stroke::new(2.0 * emphasis, m.color.to_color32()),
    }
}

/// Whether a (possibly closed) ring turns in one direction only.
pub(crate) fn is_convex(ring: &[[f64; 2]]) -> bool {
    let pts = match ring.split_last() {
        Some((last, rest)) if rest.first() == Some(last) => rest,
        _ => ring,
    };
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0_f64;
    for i in 0..n {
        let (a, b, c) = (pts[i], pts[(i + 1) % n], pts[(i + 2) % n]);
        let cross = (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]);
        if cross.abs() < f64::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

fn show_popup(ctx: &egui::Context, transform: &PlotTransform, interaction: &InteractionController) {
    let state = interaction.map().popup.state();
    let (true, Some(loc)) = (state.visible, state.location) else {
        return;
    };
    let xy = project(&loc);
    let anchor = transform.position_from_point(&PlotPoint::new(xy[0], xy[1]));
    if !transform.frame().contains(anchor) {
        return;
    }

    let mut close = false;
    egui::Area::new(egui::Id::new("map_popup"))
        .order(egui::Order::Foreground)
        .fixed_pos(anchor + egui::vec2(0.0, -10.0))
        .pivot(Align2::CENTER_BOTTOM)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(320.0);
                ui.horizontal(|ui| {
                    ui.strong(&state.title);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .small_button(egui_phosphor::regular::X)
                            .on_hover_text("Close")
                            .clicked()
                        {
                            close = true;
                        }
                    });
                });
                ui.separator();
                ui.label(&state.content);
            });
        });
    if close {
        interaction.close_popup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::RadiusUnit;

    #[test]
    fn circle_across_antimeridian_stays_contiguous() {
        let circle = Circle::new(GeoPoint::new(0.0, 179.9), 50_000.0, RadiusUnit::Meters);
        let ring = circle_outline(&circle);
        assert!(ring.iter().all(|xy| (xy[0] - 179.9).abs() < 1.0), "{ring:?}");
        assert!(ring.iter().any(|xy| xy[0] > 180.0));
        assert!(is_convex(&ring));
    }

    #[test]
    fn hemisphere_labels() {
        assert_eq!(format_lat(33.344), "33.34°N");
        assert_eq!(format_lat(-12.5), "12.50°S");
        assert_eq!(format_lon(-118.38), "118.38°W");
    }

    #[test]
    fn graticule_step_scales_with_span() {
        assert_eq!(graticule_step(0.3), 0.05);
        assert_eq!(graticule_step(3.0), 0.5);
        assert_eq!(graticule_step(360.0), 60.0);
    }

    #[test]
    fn convexity() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        assert!(is_convex(&square));
        let notch = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [1.0, 0.5], [0.0, 2.0]];
        assert!(!is_convex(&notch));
    }

    #[test]
    fn bounds_follow_canvas_aspect() {
        let b = bounds_for(GeoPoint::new(0.0, 10.0), 4.0, egui::vec2(400.0, 200.0));
        assert!((b.width() - 4.0).abs() < 1e-12);
        assert!((b.height() - 2.0).abs() < 1e-12);
        assert!((b.min()[0] - 8.0).abs() < 1e-12);
    }
}
