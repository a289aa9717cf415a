//! Table of the query results currently drawn on the map.

use chrono::{DateTime, Local};
use eframe::egui;
use egui::Ui;
use egui_phosphor::regular as icons;
use egui_table::{HeaderRow as EgHeaderRow, Table, TableDelegate};
use serde_json::Value;

use super::map_ui::draw_geometry;
use super::panel_trait::{Panel, PanelState};
use crate::data::geometry::{GeoPoint, Geometry};
use crate::data::graphics::{Graphic, GraphicId};
use crate::data::hotkeys::HotkeyName;
use crate::data::symbols::Symbol;
use crate::interaction::InteractionController;

/// One table row, built from a result graphic.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub graphic: GraphicId,
    pub name: String,
    pub geometry_type: &'static str,
    /// Distance from the buffer center to the feature's label point.
    pub distance_km: Option<f64>,
}

/// Rows for every graphic that came from a feature, nearest first.
pub fn result_rows(graphics: &[Graphic]) -> Vec<ResultRow> {
    let center: Option<GeoPoint> = graphics.iter().find_map(|g| match &g.geometry {
        Some(Geometry::Circle(c)) => Some(c.center),
        _ => None,
    });
    let mut rows: Vec<ResultRow> = graphics
        .iter()
        .filter_map(|g| {
            let id = g.source_feature.as_ref()?;
            let name = match g.attributes.get("name") {
                Some(Value::String(s)) => s.clone(),
                _ => id.clone(),
            };
            let distance_km = center
                .zip(g.geometry.as_ref().and_then(Geometry::label_point))
                .map(|(c, p)| c.distance_to(&p) / 1000.0);
            Some(ResultRow {
                graphic: g.id,
                name,
                geometry_type: g.geometry.as_ref().map_or("none", Geometry::type_name),
                distance_km,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.distance_km
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance_km.unwrap_or(f64::INFINITY))
    });
    rows
}

pub struct ResultsPanel {
    pub state: PanelState,
    /// Row under the pointer; highlighted on the map.
    pub hovered: Option<GraphicId>,
    last_revision: Option<u64>,
    updated_at: Option<DateTime<Local>>,
}

impl Default for ResultsPanel {
    fn default() -> Self {
        Self {
            state: PanelState {
                visible: true,
                detached: false,
            },
            hovered: None,
            last_revision: None,
            updated_at: None,
        }
    }
}

struct ResultsDelegate<'a> {
    rows: &'a [ResultRow],
    hover_out: &'a mut Option<GraphicId>,
}

impl TableDelegate for ResultsDelegate<'_> {
    fn header_cell_ui(&mut self, ui: &mut egui::Ui, cell: &egui_table::HeaderCellInfo) {
        let text = match cell.col_range.start {
            0 => "Feature",
            1 => "Type",
            2 => "Distance (km)",
            _ => "",
        };
        ui.add_space(4.0);
        ui.strong(text);
    }

    fn cell_ui(&mut self, ui: &mut egui::Ui, cell: &egui_table::CellInfo) {
        let Some(row) = self.rows.get(cell.row_nr as usize) else {
            return;
        };
        ui.add_space(4.0);
        let resp = match cell.col_nr {
            0 => ui.add(
                egui::Label::new(&row.name)
                    .truncate()
                    .show_tooltip_when_elided(true)
                    .sense(egui::Sense::hover()),
            ),
            1 => ui.label(row.geometry_type),
            2 => match row.distance_km {
                Some(d) => ui.label(format!("{d:.1}")),
                None => ui.weak("–"),
            },
            _ => return,
        };
        if resp.hovered() {
            *self.hover_out = Some(row.graphic);
        }
    }
}

impl Panel for ResultsPanel {
    fn name(&self) -> &'static str {
        "Results"
    }
    fn state(&self) -> &PanelState {
        &self.state
    }
    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }
    fn icon(&self) -> &'static str {
        icons::TABLE
    }
    fn hotkey(&self) -> Option<HotkeyName> {
        Some(HotkeyName::ResultsPanel)
    }

    fn render_menu(&mut self, ui: &mut Ui) {
        ui.checkbox(&mut self.state.detached, "Detach results");
    }

    fn render_panel(&mut self, ui: &mut Ui, interaction: &InteractionController) {
        let graphics = &interaction.map().graphics;
        let revision = graphics.revision();
        if self.last_revision != Some(revision) {
            self.last_revision = Some(revision);
            self.updated_at = Some(Local::now());
        }
        let rows = result_rows(&graphics.snapshot());

        ui.heading("Query results");
        ui.horizontal(|ui| {
            ui.label(format!("{} features", rows.len()));
            let pending = interaction.in_flight();
            if pending > 0 {
                ui.spinner();
                ui.weak(format!("{pending} pending"));
            }
            if let Some(t) = self.updated_at {
                ui.weak(format!("updated {}", t.format("%H:%M:%S")));
            }
        });
        ui.separator();

        self.hovered = None;
        if rows.is_empty() {
            ui.weak("Switch to buffer mode and click the map to query features");
            return;
        }

        let mut delegate = ResultsDelegate {
            rows: &rows,
            hover_out: &mut self.hovered,
        };
        let avail_w = ui.available_width();
        let remaining_h = ui.available_height();
        let (rect, _resp) = ui.allocate_exact_size(egui::vec2(avail_w, remaining_h), egui::Sense::hover());
        let ui_builder = egui::UiBuilder::new()
            .max_rect(rect)
            .layout(egui::Layout::left_to_right(egui::Align::Min));
        let mut table_ui = ui.new_child(ui_builder);
        Table::new()
            .id_salt("query_results_table")
            .num_rows(rows.len() as u64)
            .columns(vec![
                egui_table::Column::new(150.0),
                egui_table::Column::new(90.0),
                egui_table::Column::new(100.0),
            ])
            .headers(vec![EgHeaderRow::new(24.0)])
            .show(&mut table_ui, &mut delegate);
    }

    fn draw(&mut self, plot_ui: &mut egui_plot::PlotUi, interaction: &InteractionController) {
        let Some(id) = self.hovered else {
            return;
        };
        let graphics = interaction.map().graphics.snapshot();
        if let Some(geometry) = graphics.iter().find(|g| g.id == id).and_then(|g| g.geometry.as_ref()) {
            draw_geometry(plot_ui, "highlight", geometry, &Symbol::highlight_for(geometry), 1.8);
        }
    }
}
