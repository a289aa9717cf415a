//! Configuration: the runtime [`MapClickConfig`] and the optional YAML file
//! that overrides its defaults.
//!
//! The file is looked up at `$MAPCLICK_CONFIG`, falling back to
//! `$HOME/.mapclick/config.yaml`. Every key is optional; unknown keys are
//! rejected so typos do not go unnoticed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color_scheme::ColorScheme;
use crate::controllers::ViewController;
use crate::data::geometry::{GeoPoint, RadiusUnit};
use crate::data::hotkeys::Hotkeys;
use crate::data::layers::LayerKind;
use crate::data::symbols::Symbol;
use crate::error::ConfigError;
use crate::events::EventController;
use crate::interaction::{InteractionSettings, StaleResultPolicy};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MAPCLICK_CONFIG";

/// Largest accepted number of coordinate decimals.
pub const MAX_DECIMALS: usize = 12;

// ─────────────────────────────────────────────────────────────────────────────
// File format
// ─────────────────────────────────────────────────────────────────────────────

/// YAML configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub theme: Option<ColorScheme>,
    /// Default tracing level (`RUST_LOG` still wins).
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub initial_view: Option<InitialViewSection>,
    #[serde(default)]
    pub buffer: Option<BufferSection>,
    #[serde(default)]
    pub popup: Option<PopupSection>,
    #[serde(default)]
    pub query: Option<QuerySection>,
    /// Drop a marker at each clicked point.
    #[serde(default)]
    pub click_marker: Option<bool>,
    /// Replaces the embedded demo layers when present.
    #[serde(default)]
    pub layers: Option<Vec<LayerSource>>,
    #[serde(default)]
    pub hotkeys: Option<Hotkeys>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialViewSection {
    #[serde(default)]
    pub center: Option<GeoPoint>,
    /// Visible longitude span in degrees.
    #[serde(default)]
    pub span_degrees: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BufferSection {
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub unit: Option<RadiusUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopupSection {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub decimals: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySection {
    /// Simulated engine latency in milliseconds.
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub stale_results: Option<StaleResultPolicy>,
    /// Show query failures in a dismissible banner.
    #[serde(default)]
    pub surface_errors: Option<bool>,
    #[serde(default)]
    pub remove_buffer_on_failure: Option<bool>,
}

/// A GeoJSON file to load as a map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSource {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub path: PathBuf,
    #[serde(default = "default_layer_kind")]
    pub kind: LayerKind,
    #[serde(default)]
    pub symbol: Option<Symbol>,
    #[serde(default)]
    pub visible: Option<bool>,
}

fn default_layer_kind() -> LayerKind {
    LayerKind::Feature
}

/// Config file location: `$MAPCLICK_CONFIG` if set, else the default path.
/// The boolean tells whether the location was given explicitly.
pub fn config_path_from_env() -> Option<(PathBuf, bool)> {
    if let Some(p) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some((PathBuf::from(p), true));
    }
    default_config_path().map(|p| (p, false))
}

/// `$HOME/.mapclick/config.yaml` (or `%USERPROFILE%` on Windows).
pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    Some(PathBuf::from(home).join(".mapclick").join("config.yaml"))
}

/// Parse config YAML. `path` is only used for error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    if text.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a config file. Returns `Ok(None)` if the file does not exist.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_config(&text, &path).map(Some)
}

/// Load the config from the environment-selected location.
///
/// A missing file at the default location is not an error; a missing file
/// named by `$MAPCLICK_CONFIG` is.
pub fn load_from_env() -> Result<Option<(PathBuf, ConfigFile)>, ConfigError> {
    let Some((path, explicit)) = config_path_from_env() else {
        return Ok(None);
    };
    match load_config_file(&path)? {
        Some(file) => Ok(Some((path, file))),
        None if explicit => Err(ConfigError::Read {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            path,
        }),
        None => Ok(None),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Toggle individual UI features on or off.
#[derive(Clone, Debug)]
pub struct FeatureFlags {
    /// Show the mode toolbar.
    pub toolbar: bool,
    pub layers_panel: bool,
    pub results_panel: bool,
    /// Draw latitude/longitude grid lines.
    pub graticule: bool,
    /// Show the latitude/longitude axis labels.
    pub axis_labels: bool,
    /// Show the pointer position in the status bar.
    pub pointer_readout: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            toolbar: true,
            layers_panel: true,
            results_panel: true,
            graticule: true,
            axis_labels: true,
            pointer_readout: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialView {
    pub center: GeoPoint,
    /// Visible longitude span in degrees.
    pub span_degrees: f64,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(33.34, -118.38),
            span_degrees: 3.0,
        }
    }
}

/// Optional programmatic controllers attached to the map.
#[derive(Clone, Default)]
pub struct Controllers {
    pub view: Option<ViewController>,
    pub event: Option<EventController>,
}

/// Top-level configuration of the map application.
///
/// | Field            | Purpose |
/// |------------------|---------|
/// | `features`       | Toggle individual UI features on/off |
/// | `interaction`    | Click workflow settings (buffer, popup, query policy) |
/// | `color_scheme`   | Visual theme |
/// | `controllers`    | Programmatic interaction handles |
#[derive(Clone)]
pub struct MapClickConfig {
    /// Native window title.
    pub title: String,
    pub native_options: Option<eframe::NativeOptions>,
    pub features: FeatureFlags,
    pub color_scheme: ColorScheme,
    pub initial_view: InitialView,
    pub interaction: InteractionSettings,
    /// Simulated latency of the built-in query engine.
    pub query_latency: Duration,
    pub hotkeys: Hotkeys,
    pub log_level: Option<String>,
    /// GeoJSON layers to load. Empty means the embedded demo layers.
    pub layer_sources: Vec<LayerSource>,
    pub controllers: Controllers,
}

impl Default for MapClickConfig {
    fn default() -> Self {
        Self {
            title: "Map Click Demo".to_string(),
            native_options: None,
            features: FeatureFlags::default(),
            color_scheme: ColorScheme::default(),
            initial_view: InitialView::default(),
            interaction: InteractionSettings::default(),
            query_latency: Duration::ZERO,
            hotkeys: Hotkeys::default(),
            log_level: None,
            layer_sources: Vec::new(),
            controllers: Controllers::default(),
        }
    }
}

impl MapClickConfig {
    /// Defaults overlaid with `file`.
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_file(file)?;
        Ok(cfg)
    }

    /// Overlay every key present in `file`. Values are validated first, so a
    /// failed call leaves `self` untouched.
    pub fn apply_file(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        validate(&file)?;

        if let Some(title) = file.title {
            self.title = title;
        }
        if let Some(theme) = file.theme {
            self.color_scheme = theme;
        }
        if file.log_level.is_some() {
            self.log_level = file.log_level;
        }
        if let Some(view) = file.initial_view {
            if let Some(center) = view.center {
                self.initial_view.center = center;
            }
            if let Some(span) = view.span_degrees {
                self.initial_view.span_degrees = span;
            }
        }
        if let Some(buffer) = file.buffer {
            if let Some(radius) = buffer.radius {
                self.interaction.buffer_radius = radius;
            }
            if let Some(unit) = buffer.unit {
                self.interaction.buffer_unit = unit;
            }
        }
        if let Some(popup) = file.popup {
            if let Some(title) = popup.title {
                self.interaction.popup_title = title;
            }
            if let Some(decimals) = popup.decimals {
                self.interaction.coordinate_decimals = decimals;
            }
        }
        if let Some(query) = file.query {
            if let Some(ms) = query.latency_ms {
                self.query_latency = Duration::from_millis(ms);
            }
            if let Some(policy) = query.stale_results {
                self.interaction.stale_results = policy;
            }
            if let Some(surface) = query.surface_errors {
                self.interaction.surface_query_errors = surface;
            }
            if let Some(remove) = query.remove_buffer_on_failure {
                self.interaction.remove_buffer_on_failure = remove;
            }
        }
        if let Some(marker) = file.click_marker {
            self.interaction.click_marker = marker;
        }
        if let Some(layers) = file.layers {
            self.layer_sources = layers;
        }
        if let Some(hotkeys) = file.hotkeys {
            self.hotkeys = hotkeys;
        }
        Ok(())
    }
}

fn validate(file: &ConfigFile) -> Result<(), ConfigError> {
    if let Some(radius) = file.buffer.as_ref().and_then(|b| b.radius) {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "buffer.radius",
                reason: format!("must be a positive number, got {radius}"),
            });
        }
    }
    if let Some(decimals) = file.popup.as_ref().and_then(|p| p.decimals) {
        if decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidValue {
                key: "popup.decimals",
                reason: format!("at most {MAX_DECIMALS}, got {decimals}"),
            });
        }
    }
    if let Some(view) = &file.initial_view {
        if let Some(span) = view.span_degrees {
            if !(span.is_finite() && span > 0.0 && span <= 360.0) {
                return Err(ConfigError::InvalidValue {
                    key: "initial_view.span_degrees",
                    reason: format!("must be in (0, 360], got {span}"),
                });
            }
        }
        if let Some(c) = view.center {
            if !(-90.0..=90.0).contains(&c.latitude) || !(-180.0..=180.0).contains(&c.longitude) {
                return Err(ConfigError::InvalidValue {
                    key: "initial_view.center",
                    reason: format!("out of range: {}, {}", c.latitude, c.longitude),
                });
            }
        }
    }
    if let Some(layers) = &file.layers {
        let mut ids: Vec<&str> = layers.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigError::InvalidValue {
                key: "layers",
                reason: format!("duplicate layer id '{}'", dup[0]),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigError> {
        parse_config(text, Path::new("test.yaml"))
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
        let cfg = MapClickConfig::from_file(ConfigFile::default()).unwrap();
        assert_eq!(cfg.interaction, InteractionSettings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(parse("bufer: {}"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn sections_override_defaults() {
        let file = parse(
            "theme: light\n\
             buffer: { radius: 10, unit: kilometers }\n\
             popup: { decimals: 3 }\n\
             query: { latency_ms: 250, stale_results: discard, surface_errors: true }\n\
             click_marker: true\n",
        )
        .unwrap();
        let cfg = MapClickConfig::from_file(file).unwrap();
        assert_eq!(cfg.color_scheme, ColorScheme::Light);
        assert_eq!(cfg.interaction.buffer_radius, 10.0);
        assert_eq!(cfg.interaction.buffer_unit, RadiusUnit::Kilometers);
        assert_eq!(cfg.interaction.coordinate_decimals, 3);
        assert_eq!(cfg.interaction.popup_title, "Coordinates");
        assert_eq!(cfg.interaction.stale_results, StaleResultPolicy::Discard);
        assert!(cfg.interaction.surface_query_errors);
        assert!(!cfg.interaction.remove_buffer_on_failure);
        assert!(cfg.interaction.click_marker);
        assert_eq!(cfg.query_latency, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_leave_config_untouched() {
        let mut cfg = MapClickConfig::default();
        let file = parse("title: Changed\nbuffer: { radius: -1 }").unwrap();
        let err = cfg.apply_file(file).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "buffer.radius", .. }));
        assert_eq!(cfg.title, "Map Click Demo");
    }

    #[test]
    fn layer_sources_default_to_feature_kind() {
        let file = parse("layers:\n  - { id: parks, path: parks.geojson }\n").unwrap();
        let layers = file.layers.unwrap();
        assert_eq!(layers[0].kind, LayerKind::Feature);
        assert_eq!(layers[0].path, PathBuf::from("parks.geojson"));
    }

    #[test]
    fn duplicate_layer_ids_are_rejected() {
        let file = parse(
            "layers:\n  - { id: a, path: a.geojson }\n  - { id: a, path: b.geojson, kind: reference }\n",
        )
        .unwrap();
        assert!(MapClickConfig::from_file(file).is_err());
    }
}
