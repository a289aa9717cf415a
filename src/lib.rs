//! mapclick crate root: re-exports and module wiring.
//!
//! An interactive map demo built on egui/eframe. The user picks a click mode
//! from the toolbar, then clicks the map:
//! - **Get Coordinates** opens a popup showing the clicked latitude/longitude
//! - **Buffer & Query Features** draws a 50 km circle around the click and
//!   highlights every feature of the first feature layer that intersects it
//!
//! Modules:
//! - `interaction`: the click workflow ([`InteractionController`])
//! - `data`: geometry, symbols, graphics, layers, popup and the query engine
//! - `panels`: map canvas, toolbar and side panels
//! - `app`: eframe wiring and [`run_mapclick`]
//! - `config`, `logging`, `error`: the ambient plumbing
//! - `events`, `controllers`: programmatic observation and control

pub mod app;
pub mod color_scheme;
pub mod config;
pub mod controllers;
pub mod data;
pub mod error;
pub mod events;
pub mod interaction;
pub mod logging;
pub mod panels;

pub use app::{run_mapclick, MapClickApp, MapClickPanel};
pub use color_scheme::ColorScheme;
pub use config::{ConfigFile, MapClickConfig};
pub use controllers::{MapHandle, ViewController, ViewInfo};
pub use data::geometry::{Circle, GeoPoint, Geometry, RadiusUnit};
pub use data::mode::ClickMode;
pub use data::query::{LocalQueryEngine, PendingQuery, QueryEngine};
pub use error::{AppError, ConfigError, DataError, QueryError};
pub use events::{EventController, EventFilter, EventKind, MapEvent};
pub use interaction::{ClickEvent, InteractionController, InteractionSettings, StaleResultPolicy};
