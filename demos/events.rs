//! Run the map with an event subscriber and a scripted camera.
//!
//! Prints every click, mode change and query outcome to stderr, and flies to
//! Avalon two seconds after start.

use std::time::Duration;

use mapclick::config::Controllers;
use mapclick::data::sources::demo_layers;
use mapclick::events::EventFilter;
use mapclick::{logging, run_mapclick, AppError, EventController, EventKind, GeoPoint, MapClickConfig, ViewController};

fn main() -> Result<(), AppError> {
    logging::init(Some("debug"))?;

    let events = EventController::new();
    let view = ViewController::new();
    let rx = events.subscribe(EventFilter::only(
        EventKind::CLICK
            | EventKind::MODE_CHANGED
            | EventKind::QUERY_COMPLETED
            | EventKind::QUERY_FAILED
            | EventKind::VIEW_READY,
    ));

    std::thread::spawn(move || {
        while let Ok(evt) = rx.recv() {
            if let Some(map) = &evt.view_ready {
                tracing::info!(?map, "view ready");
            }
            if let Some(click) = &evt.click {
                tracing::info!(mode = %click.mode, lat = click.location.latitude, lon = click.location.longitude, "click");
            }
            if let Some(q) = &evt.query {
                tracing::info!(kinds = %evt.kinds, layer = %q.layer, features = ?q.feature_count, error = ?q.error, "query");
            }
        }
    });

    let camera = view.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(2));
        camera.go_to(GeoPoint::new(33.3428, -118.3267), 0.4);
    });

    let cfg = MapClickConfig {
        title: "Map Click Demo (events)".into(),
        query_latency: Duration::from_millis(400),
        controllers: Controllers {
            view: Some(view),
            event: Some(events),
        },
        ..MapClickConfig::default()
    };
    run_mapclick(cfg, demo_layers()?)?;
    Ok(())
}
