//! Standalone application wrapper.
//!
//! [`MapClickApp`] wraps a [`MapClickPanel`] and implements [`eframe::App`]
//! so the map can run in its own native window.

use eframe::egui;

use crate::color_scheme::ColorScheme;
use crate::config::MapClickConfig;
use crate::interaction::InteractionController;

use super::MapClickPanel;

pub struct MapClickApp {
    pub main_panel: MapClickPanel,
    /// Applied once on the first frame.
    pub color_scheme: ColorScheme,
    color_scheme_applied: bool,
}

impl MapClickApp {
    pub fn new(interaction: InteractionController, cfg: &MapClickConfig) -> Self {
        Self {
            main_panel: MapClickPanel::new(interaction, cfg),
            color_scheme: cfg.color_scheme,
            color_scheme_applied: false,
        }
    }
}

impl eframe::App for MapClickApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.color_scheme_applied {
            self.color_scheme.apply(ctx);
            self.color_scheme_applied = true;
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.main_panel.update(ui);
            });

        // Queries resolve off the UI thread; keep polling while any are pending.
        if self.main_panel.interaction.in_flight() > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        }
    }
}
