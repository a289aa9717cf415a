use eframe::egui;
use egui::Ui;
use egui_phosphor::regular as icons;

use super::panel_trait::{Panel, PanelState};
use crate::data::hotkeys::HotkeyName;
use crate::data::layers::LayerKind;
use crate::interaction::InteractionController;

/// Layer list with visibility toggles.
pub struct LayersPanel {
    pub state: PanelState,
}

impl Default for LayersPanel {
    fn default() -> Self {
        Self {
            state: PanelState {
                visible: true,
                detached: false,
            },
        }
    }
}

impl Panel for LayersPanel {
    fn name(&self) -> &'static str {
        "Layers"
    }
    fn state(&self) -> &PanelState {
        &self.state
    }
    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }
    fn icon(&self) -> &'static str {
        icons::STACK
    }
    fn hotkey(&self) -> Option<HotkeyName> {
        Some(HotkeyName::LayersPanel)
    }

    fn render_menu(&mut self, ui: &mut Ui) {
        ui.checkbox(&mut self.state.detached, "Detach layers");
    }

    fn render_panel(&mut self, ui: &mut Ui, interaction: &InteractionController) {
        let layers = &interaction.map().layers;
        // Buffer queries always go to the first feature layer.
        let queried = layers.first_feature_layer().map(|l| l.id);

        ui.heading("Layers");
        ui.separator();

        if layers.is_empty() {
            ui.weak("No layers loaded");
            return;
        }

        for layer in layers.snapshot() {
            let mut visible = layer.visible();
            ui.horizontal(|ui| {
                if ui.checkbox(&mut visible, layer.title()).changed() {
                    layers.set_visible(layer.id(), visible);
                    tracing::debug!(layer = layer.id(), visible, "layer visibility changed");
                }
                if queried.as_deref() == Some(layer.id()) {
                    ui.label(icons::TARGET)
                        .on_hover_text("Buffer queries run against this layer");
                }
            });
            let kind = match layer.kind() {
                LayerKind::Feature => "feature layer",
                LayerKind::Reference => "reference",
            };
            ui.indent(layer.id(), |ui| {
                ui.weak(format!("{} features, {kind}", layer.features().len()));
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_visibility() {
        let mut p = LayersPanel::default();
        assert!(p.state().visible);
        p.toggle();
        assert!(!p.state().visible);
        assert_eq!(p.hotkey(), Some(HotkeyName::LayersPanel));
    }
}
