pub mod layers_ui;
pub mod map_ui;
pub mod panel_trait;
pub mod results_ui;
pub mod toolbar_ui;

pub use layers_ui::LayersPanel;
pub use map_ui::MapPanel;
pub use panel_trait::{Panel, PanelState};
pub use results_ui::ResultsPanel;
pub use toolbar_ui::{ModeToolbar, ToolbarAction};
