//! Main application module.
//!
//! | Sub-module        | Responsibility |
//! | ----------------- | -------------- |
//! | [`update`]        | Per-frame polling, hotkeys, chrome and map rendering |
//! | [`mapclick_app`]  | Standalone [`MapClickApp`] (eframe) wrapper |
//! | [`run`]           | Top-level [`run_mapclick()`] entry point and icon loading |

mod mapclick_app;
mod run;
mod update;

pub use mapclick_app::MapClickApp;
pub use run::run_mapclick;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{FeatureFlags, MapClickConfig};
use crate::controllers::ViewController;
use crate::data::hotkeys::{HotkeyName, Hotkeys};
use crate::data::mode::ClickMode;
use crate::events::EventController;
use crate::interaction::InteractionController;
use crate::panels::{LayersPanel, MapPanel, ModeToolbar, Panel, ResultsPanel, ToolbarAction};

/// Unique ids namespace the egui widget ids of each [`MapClickPanel`].
static PANEL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The central widget: toolbar, side panels, status bar and the map.
///
/// Usable standalone through [`MapClickApp`] or embedded in another egui
/// application by calling [`MapClickPanel::update`] each frame.
pub struct MapClickPanel {
    pub interaction: InteractionController,
    pub hotkeys: Hotkeys,
    pub features: FeatureFlags,

    pub map_panel: MapPanel,
    pub toolbar: ModeToolbar,
    /// Panels docked to the left of the map.
    pub left_side_panels: Vec<Box<dyn Panel>>,
    /// Panels docked to the right of the map.
    pub right_side_panels: Vec<Box<dyn Panel>>,

    pub(crate) view_ctrl: Option<ViewController>,
    pub(crate) event_ctrl: Option<EventController>,
    panel_id: u64,
}

impl MapClickPanel {
    pub fn new(interaction: InteractionController, cfg: &MapClickConfig) -> Self {
        let mut map_panel = MapPanel::new(cfg.initial_view, cfg.color_scheme.map_colors());
        map_panel.show_grid = cfg.features.graticule;
        map_panel.show_axes = cfg.features.axis_labels;

        let mut left_side_panels: Vec<Box<dyn Panel>> = Vec::new();
        if cfg.features.layers_panel {
            left_side_panels.push(Box::new(LayersPanel::default()));
        }
        let mut right_side_panels: Vec<Box<dyn Panel>> = Vec::new();
        if cfg.features.results_panel {
            right_side_panels.push(Box::new(ResultsPanel::default()));
        }

        Self {
            interaction,
            hotkeys: cfg.hotkeys.clone(),
            features: cfg.features.clone(),
            map_panel,
            toolbar: ModeToolbar,
            left_side_panels,
            right_side_panels,
            view_ctrl: cfg.controllers.view.clone(),
            event_ctrl: cfg.controllers.event.clone(),
            panel_id: PANEL_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Apply a hotkey or toolbar action.
    pub fn apply_action(&mut self, action: HotkeyName) {
        match action {
            HotkeyName::CoordinatesMode => self.interaction.set_mode(ClickMode::Coordinates),
            HotkeyName::BufferMode => self.interaction.set_mode(ClickMode::Buffer),
            HotkeyName::ClosePopup => {
                self.interaction.close_popup();
            }
            HotkeyName::ClearGraphics => {
                self.interaction.clear_graphics();
            }
            HotkeyName::HomeView => self.map_panel.go_home(),
            HotkeyName::LayersPanel | HotkeyName::ResultsPanel => {
                for p in self
                    .left_side_panels
                    .iter_mut()
                    .chain(self.right_side_panels.iter_mut())
                    .filter(|p| p.hotkey() == Some(action))
                {
                    p.toggle();
                }
            }
        }
    }

    pub(crate) fn apply_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::ClearGraphics => self.apply_action(HotkeyName::ClearGraphics),
            ToolbarAction::HomeView => self.apply_action(HotkeyName::HomeView),
        }
    }
}
