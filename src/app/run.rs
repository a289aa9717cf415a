//! Top-level entry point for running the map as a native window.

use std::sync::Arc;

use eframe::egui;

use crate::config::MapClickConfig;
use crate::controllers::MapHandle;
use crate::data::layers::MapLayers;
use crate::data::query::LocalQueryEngine;
use crate::interaction::InteractionController;

use super::MapClickApp;

/// Launch the map application in a native window.
///
/// Builds the [`MapHandle`] around `layers`, wires an [`InteractionController`]
/// to the built-in query engine and any event controller in `cfg`, then
/// enters the eframe event loop. Blocks until the window is closed.
pub fn run_mapclick(mut cfg: MapClickConfig, layers: MapLayers) -> eframe::Result<()> {
    let map = MapHandle::new(layers);
    let engine = Arc::new(LocalQueryEngine::with_latency(cfg.query_latency));
    let mut interaction = InteractionController::new(map, engine, cfg.interaction.clone());
    if let Some(events) = cfg.controllers.event.clone() {
        interaction = interaction.with_events(events);
    }
    let app = MapClickApp::new(interaction, &cfg);

    let title = cfg.title.clone();
    let mut opts = cfg.native_options.take().unwrap_or_default();

    if opts.viewport.icon.is_none() {
        if let Some(icon) = load_app_icon_svg() {
            opts.viewport = opts.viewport.with_icon(icon);
        }
    }
    if opts.viewport.inner_size.is_none() {
        opts.viewport = opts.viewport.with_inner_size(egui::vec2(1280.0, 820.0));
    }

    tracing::info!(title = %title, "starting map window");
    eframe::run_native(
        &title,
        opts,
        Box::new(|cc| {
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(app))
        }),
    )
}

/// Render `icon.svg` from the crate root into window icon data.
///
/// Returns `None` if the file is missing or cannot be rendered.
fn load_app_icon_svg() -> Option<egui::IconData> {
    let svg_path = concat!(env!("CARGO_MANIFEST_DIR"), "/icon.svg");
    let data = match std::fs::read(svg_path) {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!(path = svg_path, error = %e, "no window icon");
            return None;
        }
    };

    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(&data, &opt).ok()?;
    let size = tree.size().to_int_size();
    if size.width() == 0 || size.height() == 0 {
        return None;
    }
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())?;
    let mut canvas = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::default(), &mut canvas);
    Some(egui::IconData {
        rgba: pixmap.take(),
        width: size.width(),
        height: size.height(),
    })
}
