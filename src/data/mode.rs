//! Click mode: what a map click does.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClickMode {
    /// No mode chosen yet; clicks are ignored.
    #[default]
    Unset,
    /// Show the clicked coordinates in the popup.
    Coordinates,
    /// Buffer the clicked point and query intersecting features.
    Buffer,
}

impl ClickMode {
    fn to_u8(self) -> u8 {
        match self {
            ClickMode::Unset => 0,
            ClickMode::Coordinates => 1,
            ClickMode::Buffer => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => ClickMode::Coordinates,
            2 => ClickMode::Buffer,
            _ => ClickMode::Unset,
        }
    }

    /// Label of the toolbar button selecting this mode.
    pub fn button_label(self) -> &'static str {
        match self {
            ClickMode::Unset => "",
            ClickMode::Coordinates => "Get Coordinates",
            ClickMode::Buffer => "Buffer & Query Features",
        }
    }
}

impl fmt::Display for ClickMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClickMode::Unset => "unset",
            ClickMode::Coordinates => "coordinates",
            ClickMode::Buffer => "buffer",
        };
        write!(f, "{s}")
    }
}

/// Shared cell holding the current mode.
///
/// Long-lived click handlers hold a clone and read it on every event, so they
/// always see the latest mode rather than the one current at registration.
#[derive(Clone, Default)]
pub struct ModeCell(Arc<AtomicU8>);

impl ModeCell {
    pub fn new(mode: ClickMode) -> Self {
        Self(Arc::new(AtomicU8::new(mode.to_u8())))
    }

    pub fn get(&self) -> ClickMode {
        ClickMode::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store `mode` and return the previous one.
    pub fn replace(&self, mode: ClickMode) -> ClickMode {
        ClickMode::from_u8(self.0.swap(mode.to_u8(), Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_observes_later_writes() {
        let cell = ModeCell::default();
        let seen_by_handler = cell.clone();
        assert_eq!(seen_by_handler.get(), ClickMode::Unset);
        cell.replace(ClickMode::Buffer);
        assert_eq!(seen_by_handler.get(), ClickMode::Buffer);
    }

    #[test]
    fn replace_returns_previous() {
        let cell = ModeCell::new(ClickMode::Coordinates);
        assert_eq!(cell.replace(ClickMode::Buffer), ClickMode::Coordinates);
    }

    #[test]
    fn parses_from_yaml() {
        let m: ClickMode = serde_yaml::from_str("buffer").unwrap();
        assert_eq!(m, ClickMode::Buffer);
        assert_eq!(m.to_string(), "buffer");
    }
}
