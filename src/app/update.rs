//! Per-frame update logic for [`MapClickPanel`].
//!
//! Each frame resolves finished queries, handles hotkeys, draws the chrome
//! (top bar, failure banner, status bar, side panels) and finally the map.

use eframe::egui;
use egui_phosphor::regular as icons;

use crate::data::hotkeys::{detect_hotkey_actions, format_button_tooltip, get_hotkey_for_name};
use crate::events::{EventKind, KeyPressMeta, MapEvent};
use crate::panels::Panel;

use super::MapClickPanel;

impl MapClickPanel {
    /// Main per-frame update. Call from an egui `Ui` each frame.
    pub fn update(&mut self, ui: &mut egui::Ui) {
        self.interaction.poll();
        self.handle_hotkeys(ui.ctx());

        self.render_top_bar(ui);
        self.render_failure_banner(ui);
        self.render_status_bar(ui);
        self.render_side_panels(ui);
        self.render_detached(ui.ctx());

        let Self {
            interaction,
            map_panel,
            left_side_panels,
            right_side_panels,
            view_ctrl,
            event_ctrl,
            ..
        } = self;
        let interaction: &_ = interaction;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show_inside(ui, |ui| {
                map_panel.render_panel(
                    ui,
                    interaction,
                    view_ctrl.as_ref(),
                    event_ctrl.as_ref(),
                    |plot_ui| {
                        for p in left_side_panels.iter_mut().chain(right_side_panels.iter_mut()) {
                            p.draw(plot_ui, interaction);
                        }
                    },
                );
            });
    }

    fn handle_hotkeys(&mut self, ctx: &egui::Context) {
        for action in detect_hotkey_actions(&self.hotkeys, ctx) {
            tracing::debug!(action = action.label(), "hotkey");
            if let Some(ctrl) = &self.event_ctrl {
                let mut evt = MapEvent::new(EventKind::KEY_PRESSED);
                evt.key_press = Some(KeyPressMeta {
                    key: get_hotkey_for_name(&self.hotkeys, action)
                        .map(|hk| hk.to_string())
                        .unwrap_or_default(),
                    action: action.label().to_string(),
                });
                ctrl.emit_filtered(evt);
            }
            self.apply_action(action);
        }
    }

    fn render_top_bar(&mut self, ui: &mut egui::Ui) {
        egui::TopBottomPanel::top(format!("top_bar_{}", self.panel_id)).show_inside(ui, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                if self.features.toolbar {
                    if let Some(action) = self.toolbar.render(ui, &self.interaction, &self.hotkeys) {
                        self.apply_toolbar_action(action);
                    }
                    ui.separator();
                }

                let hotkeys = &self.hotkeys;
                for p in self
                    .left_side_panels
                    .iter_mut()
                    .chain(self.right_side_panels.iter_mut())
                {
                    let active = p.state().visible;
                    let hotkey = p.hotkey().and_then(|name| get_hotkey_for_name(hotkeys, name));
                    let resp = ui
                        .selectable_label(active, format!("{} {}", p.icon(), p.name()))
                        .on_hover_text(format_button_tooltip(p.name(), hotkey.as_ref()));
                    if resp.clicked() {
                        p.toggle();
                    }
                    resp.context_menu(|ui| p.render_menu(ui));
                }
            });
        });
    }

    fn render_failure_banner(&mut self, ui: &mut egui::Ui) {
        let Some(failure) = self.interaction.last_failure() else {
            return;
        };
        egui::TopBottomPanel::top(format!("failure_banner_{}", self.panel_id)).show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(ui.visuals().warn_fg_color, icons::WARNING);
                let layer = if failure.layer.is_empty() {
                    "no layer".to_string()
                } else {
                    format!("layer '{}'", failure.layer)
                };
                ui.label(format!("Feature query on {layer} failed: {}", failure.error));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Dismiss").clicked() {
                        self.interaction.dismiss_failure();
                    }
                });
            });
        });
    }

    fn render_status_bar(&mut self, ui: &mut egui::Ui) {
        egui::TopBottomPanel::bottom(format!("status_bar_{}", self.panel_id)).show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Mode: {}", self.interaction.mode()));
                ui.separator();
                ui.label(format!("{} graphics", self.interaction.map().graphics.len()));
                let pending = self.interaction.in_flight();
                if pending > 0 {
                    ui.separator();
                    ui.spinner();
                    ui.label(format!("{pending} queries pending"));
                }
                if self.features.pointer_readout {
                    if let Some(p) = self.map_panel.hover_point() {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.monospace(format!("{:>10.5}, {:>11.5}", p.latitude, p.longitude));
                        });
                    }
                }
            });
        });
    }

    fn render_side_panels(&mut self, ui: &mut egui::Ui) {
        fn docked(list: &[Box<dyn Panel>]) -> bool {
            list.iter().any(|p| p.state().visible && !p.state().detached)
        }

        if docked(&self.left_side_panels) {
            egui::SidePanel::left(format!("left_sidebar_{}", self.panel_id))
                .resizable(true)
                .default_width(240.0)
                .min_width(160.0)
                .show_inside(ui, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for p in self
                            .left_side_panels
                            .iter_mut()
                            .filter(|p| p.state().visible && !p.state().detached)
                        {
                            p.render_panel(ui, &self.interaction);
                        }
                    });
                });
        }

        if docked(&self.right_side_panels) {
            egui::SidePanel::right(format!("right_sidebar_{}", self.panel_id))
                .resizable(true)
                .default_width(360.0)
                .min_width(220.0)
                .show_inside(ui, |ui| {
                    for p in self
                        .right_side_panels
                        .iter_mut()
                        .filter(|p| p.state().visible && !p.state().detached)
                    {
                        p.render_panel(ui, &self.interaction);
                    }
                });
        }
    }

    fn render_detached(&mut self, ctx: &egui::Context) {
        for p in self
            .left_side_panels
            .iter_mut()
            .chain(self.right_side_panels.iter_mut())
            .filter(|p| p.state().visible && p.state().detached)
        {
            let mut open = true;
            egui::Window::new(p.name())
                .id(egui::Id::new((p.name(), self.panel_id)))
                .open(&mut open)
                .default_size([360.0, 320.0])
                .show(ctx, |ui| p.render_panel(ui, &self.interaction));
            if !open {
                let s = p.state_mut();
                s.visible = false;
                s.detached = false;
            }
        }
    }
}
