//! Visual symbols for graphics and feature layers.
//!
//! Symbols are plain serializable values so they can be set from the YAML
//! config; conversion to egui types happens at draw time.

use egui::Color32;
use egui_plot::MarkerShape;
use serde::{Deserialize, Serialize};

use super::geometry::Geometry;

/// RGB color with a fractional alpha, matching how map symbols are usually
/// written (`[0, 0, 255, 0.2]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub f32);

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b, 1.0)
    }

    pub fn to_color32(self) -> Color32 {
        let a = (self.3.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(self.0, self.1, self.2, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleLineSymbol {
    pub color: Rgba,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleFillSymbol {
    pub color: Rgba,
    pub outline: SimpleLineSymbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerStyle {
    #[default]
    Circle,
    Square,
    Diamond,
    Cross,
    X,
    Triangle,
}

impl MarkerStyle {
    pub fn shape(self) -> MarkerShape {
        match self {
            MarkerStyle::Circle => MarkerShape::Circle,
            MarkerStyle::Square => MarkerShape::Square,
            MarkerStyle::Diamond => MarkerShape::Diamond,
            MarkerStyle::Cross => MarkerShape::Plus,
            MarkerStyle::X => MarkerShape::Cross,
            MarkerStyle::Triangle => MarkerShape::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleMarkerSymbol {
    pub style: MarkerStyle,
    /// Marker size in points.
    pub size: f32,
    pub color: Rgba,
    pub outline: SimpleLineSymbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Symbol {
    SimpleFill(SimpleFillSymbol),
    SimpleLine(SimpleLineSymbol),
    SimpleMarker(SimpleMarkerSymbol),
}

impl Symbol {
    /// Semi-transparent blue fill used for the buffer circle.
    pub fn buffer_fill() -> Self {
        Symbol::SimpleFill(SimpleFillSymbol {
            color: Rgba(0, 0, 255, 0.2),
            outline: SimpleLineSymbol {
                color: Rgba::opaque(0, 0, 255),
                width: 2.0,
            },
        })
    }

    /// Red triangle with a white outline, dropped at the clicked point.
    pub fn click_marker() -> Self {
        Symbol::SimpleMarker(SimpleMarkerSymbol {
            style: MarkerStyle::Triangle,
            size: 15.0,
            color: Rgba::opaque(255, 0, 0),
            outline: SimpleLineSymbol {
                color: Rgba::opaque(255, 255, 255),
                width: 2.0,
            },
        })
    }

    /// Highlight symbol for query results, chosen by geometry type.
    pub fn highlight_for(geometry: &Geometry) -> Self {
        let orange = Rgba::opaque(255, 140, 0);
        match geometry {
            Geometry::Point(_) | Geometry::Multipoint(_) => {
                Symbol::SimpleMarker(SimpleMarkerSymbol {
                    style: MarkerStyle::Circle,
                    size: 9.0,
                    color: orange,
                    outline: SimpleLineSymbol {
                        color: Rgba::opaque(255, 255, 255),
                        width: 1.0,
                    },
                })
            }
            Geometry::Polyline(_) => Symbol::SimpleLine(SimpleLineSymbol {
                color: orange,
                width: 3.0,
            }),
            Geometry::Polygon(_) | Geometry::Circle(_) => Symbol::SimpleFill(SimpleFillSymbol {
                color: Rgba(255, 140, 0, 0.35),
                outline: SimpleLineSymbol {
                    color: orange,
                    width: 2.0,
                },
            }),
        }
    }

    /// Muted symbol used to draw the features of a layer itself.
    pub fn layer_default_for(geometry: &Geometry) -> Self {
        let grey = Rgba::opaque(110, 120, 135);
        match geometry {
            Geometry::Point(_) | Geometry::Multipoint(_) => {
                Symbol::SimpleMarker(SimpleMarkerSymbol {
                    style: MarkerStyle::Circle,
                    size: 5.0,
                    color: grey,
                    outline: SimpleLineSymbol {
                        color: grey,
                        width: 0.0,
                    },
                })
            }
            Geometry::Polyline(_) => Symbol::SimpleLine(SimpleLineSymbol {
                color: grey,
                width: 1.5,
            }),
            Geometry::Polygon(_) | Geometry::Circle(_) => Symbol::SimpleFill(SimpleFillSymbol {
                color: Rgba(110, 120, 135, 0.15),
                outline: SimpleLineSymbol {
                    color: grey,
                    width: 1.0,
                },
            }),
        }
    }
}
