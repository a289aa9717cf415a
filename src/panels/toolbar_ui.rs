//! Mode toolbar: the two click-mode buttons plus a few map actions.

use eframe::egui;
use egui::Ui;
use egui_phosphor::regular as icons;

use crate::data::hotkeys::{format_button_tooltip, Hotkeys};
use crate::data::mode::ClickMode;
use crate::interaction::InteractionController;

/// Actions the toolbar leaves to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    ClearGraphics,
    HomeView,
}

#[derive(Debug, Default)]
pub struct ModeToolbar;

impl ModeToolbar {
    fn mode_icon(mode: ClickMode) -> &'static str {
        match mode {
            ClickMode::Coordinates => icons::MAP_PIN,
            ClickMode::Buffer => icons::TARGET,
            ClickMode::Unset => "",
        }
    }

    /// Render the toolbar. Mode buttons call [`InteractionController::set_mode`]
    /// directly and are disabled while their mode is active.
    pub fn render(&mut self, ui: &mut Ui, ctrl: &InteractionController, hotkeys: &Hotkeys) -> Option<ToolbarAction> {
        let current = ctrl.mode();
        let mut action = None;

        ui.horizontal(|ui| {
            for (mode, key) in [
                (ClickMode::Coordinates, hotkeys.coordinates_mode.as_ref()),
                (ClickMode::Buffer, hotkeys.buffer_mode.as_ref()),
            ] {
                let label = format!("{} {}", Self::mode_icon(mode), mode.button_label());
                let resp = ui
                    .add_enabled(current != mode, egui::Button::new(label).selected(current == mode))
                    .on_hover_text(format_button_tooltip(mode.button_label(), key))
                    .on_disabled_hover_text(format!("{} (active)", mode.button_label()));
                if resp.clicked() {
                    ctrl.set_mode(mode);
                }
            }

            ui.separator();

            if ui
                .button(icons::BROOM)
                .on_hover_text(format_button_tooltip("Clear graphics", hotkeys.clear_graphics.as_ref()))
                .clicked()
            {
                action = Some(ToolbarAction::ClearGraphics);
            }
            if ui
                .button(icons::HOUSE)
                .on_hover_text(format_button_tooltip("Home view", hotkeys.home_view.as_ref()))
                .clicked()
            {
                action = Some(ToolbarAction::HomeView);
            }

            if current == ClickMode::Unset {
                ui.weak("Pick a mode, then click the map");
            }
        });

        action
    }
}
