use egui::Ui;

use crate::data::hotkeys::HotkeyName;
use crate::interaction::InteractionController;

#[derive(Debug, Clone, Copy, Default)]
pub struct PanelState {
    pub visible: bool,
    pub detached: bool,
}

pub trait Panel {
    fn name(&self) -> &'static str;
    fn state(&self) -> &PanelState;
    fn state_mut(&mut self) -> &mut PanelState;

    /// Icon shown on the panel's toggle button.
    fn icon(&self) -> &'static str {
        ""
    }

    /// Hotkey action toggling this panel, if any.
    fn hotkey(&self) -> Option<HotkeyName> {
        None
    }

    fn toggle(&mut self) {
        let s = self.state_mut();
        s.visible = !s.visible;
    }

    // Optional hooks with default empty impls
    fn render_menu(&mut self, _ui: &mut Ui) {}
    fn render_panel(&mut self, _ui: &mut Ui, _interaction: &InteractionController) {}
    fn draw(&mut self, _plot_ui: &mut egui_plot::PlotUi, _interaction: &InteractionController) {}
}
