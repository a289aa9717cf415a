//! Color scheme definitions for the map window.
//!
//! A scheme sets the egui visuals and the handful of colors the map canvas
//! draws itself (background, graticule, labels).

use eframe::egui::{Color32, Context, Visuals};
use serde::{Deserialize, Serialize};

/// Visual theme of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
    #[default]
    Dark,
    Light,
    SolarizedDark,
    SolarizedLight,
    /// Nord: blue-grey dark theme.
    Nord,
    /// Pure-black background with maximally-saturated colours.
    HighContrast,
}

/// Colors the map canvas paints directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapColors {
    /// Canvas background (the "sea").
    pub background: Color32,
    pub graticule: Color32,
    /// Feature labels and attribution text.
    pub label: Color32,
}

impl ColorScheme {
    /// All built-in schemes (useful for combo-box UIs).
    pub fn all() -> &'static [ColorScheme] {
        &[
            ColorScheme::Dark,
            ColorScheme::Light,
            ColorScheme::SolarizedDark,
            ColorScheme::SolarizedLight,
            ColorScheme::Nord,
            ColorScheme::HighContrast,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColorScheme::Dark => "Dark",
            ColorScheme::Light => "Light",
            ColorScheme::SolarizedDark => "Solarized Dark",
            ColorScheme::SolarizedLight => "Solarized Light",
            ColorScheme::Nord => "Nord",
            ColorScheme::HighContrast => "High Contrast",
        }
    }

    pub fn is_dark(&self) -> bool {
        !matches!(self, ColorScheme::Light | ColorScheme::SolarizedLight)
    }

    /// Apply this scheme's visuals to an egui context.
    pub fn apply(&self, ctx: &Context) {
        ctx.set_visuals(self.visuals());
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            ColorScheme::Dark => Visuals::dark(),
            ColorScheme::Light => Visuals::light(),
            ColorScheme::SolarizedDark => {
                let mut v = Visuals::dark();
                let base03 = Color32::from_rgb(0, 43, 54);
                let base02 = Color32::from_rgb(7, 54, 66);
                let base01 = Color32::from_rgb(88, 110, 117);
                let base0 = Color32::from_rgb(131, 148, 150);
                v.panel_fill = base03;
                v.window_fill = base02;
                v.extreme_bg_color = base03;
                v.faint_bg_color = base02;
                v.override_text_color = Some(base0);
                v.widgets.noninteractive.bg_fill = base02;
                v.widgets.inactive.bg_fill = base02;
                v.widgets.inactive.fg_stroke.color = base01;
                v.widgets.hovered.bg_fill = base01;
                v
            }
            ColorScheme::SolarizedLight => {
                let mut v = Visuals::light();
                let base3 = Color32::from_rgb(253, 246, 227);
                let base2 = Color32::from_rgb(238, 232, 213);
                let base00 = Color32::from_rgb(101, 123, 131);
                v.panel_fill = base3;
                v.window_fill = base2;
                v.extreme_bg_color = base3;
                v.faint_bg_color = base2;
                v.override_text_color = Some(base00);
                v.widgets.noninteractive.bg_fill = base2;
                v.widgets.inactive.bg_fill = base2;
                v
            }
            ColorScheme::Nord => {
                let mut v = Visuals::dark();
                let polar0 = Color32::from_rgb(46, 52, 64);
                let polar1 = Color32::from_rgb(59, 66, 82);
                let snow0 = Color32::from_rgb(216, 222, 233);
                v.panel_fill = polar0;
                v.window_fill = polar1;
                v.extreme_bg_color = polar0;
                v.faint_bg_color = polar1;
                v.override_text_color = Some(snow0);
                v.widgets.noninteractive.bg_fill = polar1;
                v.widgets.hovered.bg_fill = Color32::from_rgb(76, 86, 106);
                v
            }
            ColorScheme::HighContrast => {
                let mut v = Visuals::dark();
                v.panel_fill = Color32::BLACK;
                v.window_fill = Color32::from_rgb(10, 10, 10);
                v.extreme_bg_color = Color32::BLACK;
                v.faint_bg_color = Color32::from_rgb(20, 20, 20);
                v.override_text_color = Some(Color32::WHITE);
                v
            }
        }
    }

    pub fn map_colors(&self) -> MapColors {
        match self {
            ColorScheme::Dark => MapColors {
                background: Color32::from_rgb(24, 33, 45),
                graticule: Color32::from_rgba_unmultiplied(255, 255, 255, 18),
                label: Color32::from_rgb(210, 215, 222),
            },
            ColorScheme::Light => MapColors {
                background: Color32::from_rgb(201, 222, 240),
                graticule: Color32::from_rgba_unmultiplied(0, 0, 0, 22),
                label: Color32::from_rgb(40, 44, 52),
            },
            ColorScheme::SolarizedDark => MapColors {
                background: Color32::from_rgb(0, 43, 54),
                graticule: Color32::from_rgb(7, 54, 66),
                label: Color32::from_rgb(147, 161, 161),
            },
            ColorScheme::SolarizedLight => MapColors {
                background: Color32::from_rgb(238, 232, 213),
                graticule: Color32::from_rgb(220, 214, 196),
                label: Color32::from_rgb(88, 110, 117),
            },
            ColorScheme::Nord => MapColors {
                background: Color32::from_rgb(46, 52, 64),
                graticule: Color32::from_rgb(59, 66, 82),
                label: Color32::from_rgb(229, 233, 240),
            },
            ColorScheme::HighContrast => MapColors {
                background: Color32::BLACK,
                graticule: Color32::from_rgb(60, 60, 60),
                label: Color32::WHITE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_config_names() {
        let s: ColorScheme = serde_yaml::from_str("solarized-light").unwrap();
        assert_eq!(s, ColorScheme::SolarizedLight);
        assert!(!s.is_dark());
    }

    #[test]
    fn every_scheme_has_a_label() {
        for s in ColorScheme::all() {
            assert!(!s.label().is_empty());
        }
    }
}
