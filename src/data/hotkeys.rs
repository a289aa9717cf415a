#![allow(clippy::match_same_arms)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use eframe::egui;

// Types
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    None,
    Ctrl,
    Alt,
    Shift,
    CtrlAlt,
    CtrlShift,
    AltShift,
    CtrlAltShift,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modifier::None => "",
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::CtrlAlt => "Ctrl+Alt",
            Modifier::CtrlShift => "Ctrl+Shift",
            Modifier::AltShift => "Alt+Shift",
            Modifier::CtrlAltShift => "Ctrl+Alt+Shift",
        };
        write!(f, "{}", s)
    }
}

/// A key plus modifiers. Serialized as text such as `"Ctrl+B"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Hotkey {
    pub modifier: Modifier,
    pub key: char,
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            ' ' => "Space".to_string(),
            other => other.to_string(),
        };

        if self.modifier == Modifier::None {
            write!(f, "{}", key)
        } else {
            write!(f, "{}+{}", self.modifier, key)
        }
    }
}

impl FromStr for Hotkey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty hotkey".to_string());
        }
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
        let (last, mods) = match parts.split_last() {
            Some(split) => split,
            None => return Err("invalid hotkey".to_string()),
        };
        let ch = match last.to_lowercase().as_str() {
            "space" => ' ',
            _ => {
                let mut chars = last.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c.to_ascii_uppercase(),
                    (None, _) => return Err("no key char".to_string()),
                    (Some(_), Some(_)) => return Err(format!("unknown key '{}'", last)),
                }
            }
        };
        let mut lowers: Vec<String> = mods.iter().map(|m| m.to_lowercase()).collect();
        lowers.sort();
        lowers.dedup();
        let names: Vec<&str> = lowers
            .iter()
            .map(|m| match m.as_str() {
                "control" => "ctrl",
                other => other,
            })
            .collect();
        let modifier = match names.as_slice() {
            [] => Modifier::None,
            ["ctrl"] => Modifier::Ctrl,
            ["alt"] => Modifier::Alt,
            ["shift"] => Modifier::Shift,
            ["alt", "ctrl"] => Modifier::CtrlAlt,
            ["ctrl", "shift"] => Modifier::CtrlShift,
            ["alt", "shift"] => Modifier::AltShift,
            ["alt", "ctrl", "shift"] => Modifier::CtrlAltShift,
            other => return Err(format!("unknown modifier combo '{:?}'", other)),
        };
        Ok(Hotkey { modifier, key: ch })
    }
}

impl Serialize for Hotkey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hotkey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Hotkey {
    pub fn new(modifier: Modifier, key: char) -> Self {
        Self { modifier, key }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hotkeys {
    pub coordinates_mode: Option<Hotkey>,
    pub buffer_mode: Option<Hotkey>,
    pub close_popup: Option<Hotkey>,
    pub clear_graphics: Option<Hotkey>,
    pub home_view: Option<Hotkey>,
    pub layers_panel: Option<Hotkey>,
    pub results_panel: Option<Hotkey>,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            coordinates_mode: Some(Hotkey::new(Modifier::None, 'C')),
            buffer_mode: Some(Hotkey::new(Modifier::None, 'B')),
            close_popup: Some(Hotkey::new(Modifier::None, 'X')),
            clear_graphics: Some(Hotkey::new(Modifier::Ctrl, 'X')),
            home_view: Some(Hotkey::new(Modifier::None, 'H')),
            layers_panel: Some(Hotkey::new(Modifier::None, 'L')),
            results_panel: Some(Hotkey::new(Modifier::None, 'R')),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HotkeyName {
    CoordinatesMode,
    BufferMode,
    ClosePopup,
    ClearGraphics,
    HomeView,
    LayersPanel,
    ResultsPanel,
}

impl HotkeyName {
    pub const ALL: [HotkeyName; 7] = [
        HotkeyName::CoordinatesMode,
        HotkeyName::BufferMode,
        HotkeyName::ClosePopup,
        HotkeyName::ClearGraphics,
        HotkeyName::HomeView,
        HotkeyName::LayersPanel,
        HotkeyName::ResultsPanel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HotkeyName::CoordinatesMode => "Coordinates mode",
            HotkeyName::BufferMode => "Buffer mode",
            HotkeyName::ClosePopup => "Close popup",
            HotkeyName::ClearGraphics => "Clear graphics",
            HotkeyName::HomeView => "Home view",
            HotkeyName::LayersPanel => "Toggle layers panel",
            HotkeyName::ResultsPanel => "Toggle results panel",
        }
    }
}

pub fn get_hotkey_for_name(hk: &Hotkeys, name: HotkeyName) -> Option<Hotkey> {
    match name {
        HotkeyName::CoordinatesMode => hk.coordinates_mode,
        HotkeyName::BufferMode => hk.buffer_mode,
        HotkeyName::ClosePopup => hk.close_popup,
        HotkeyName::ClearGraphics => hk.clear_graphics,
        HotkeyName::HomeView => hk.home_view,
        HotkeyName::LayersPanel => hk.layers_panel,
        HotkeyName::ResultsPanel => hk.results_panel,
    }
}

/// Tooltip text for a button, with its hotkey in brackets when it has one.
pub fn format_button_tooltip(description: &str, hotkey: Option<&Hotkey>) -> String {
    match hotkey {
        Some(hk) => format!("{} [{}]", description, hk),
        None => description.to_string(),
    }
}

fn key_to_char(key: egui::Key) -> Option<char> {
    use egui::Key;
    let c = match key {
        Key::A => 'A',
        Key::B => 'B',
        Key::C => 'C',
        Key::D => 'D',
        Key::E => 'E',
        Key::F => 'F',
        Key::G => 'G',
        Key::H => 'H',
        Key::I => 'I',
        Key::J => 'J',
        Key::K => 'K',
        Key::L => 'L',
        Key::M => 'M',
        Key::N => 'N',
        Key::O => 'O',
        Key::P => 'P',
        Key::Q => 'Q',
        Key::R => 'R',
        Key::S => 'S',
        Key::T => 'T',
        Key::U => 'U',
        Key::V => 'V',
        Key::W => 'W',
        Key::X => 'X',
        Key::Y => 'Y',
        Key::Z => 'Z',
        Key::Num0 => '0',
        Key::Num1 => '1',
        Key::Num2 => '2',
        Key::Num3 => '3',
        Key::Num4 => '4',
        Key::Num5 => '5',
        Key::Num6 => '6',
        Key::Num7 => '7',
        Key::Num8 => '8',
        Key::Num9 => '9',
        Key::Space => ' ',
        _ => return None,
    };
    Some(c)
}

fn mods_to_modifier(m: egui::Modifiers) -> Modifier {
    match (m.ctrl || m.command, m.alt, m.shift) {
        (false, false, false) => Modifier::None,
        (true, false, false) => Modifier::Ctrl,
        (false, true, false) => Modifier::Alt,
        (false, false, true) => Modifier::Shift,
        (true, true, false) => Modifier::CtrlAlt,
        (true, false, true) => Modifier::CtrlShift,
        (false, true, true) => Modifier::AltShift,
        (true, true, true) => Modifier::CtrlAltShift,
    }
}

/// Hotkey pressed by a key event, if any.
pub fn event_to_hotkey(ev: &egui::Event) -> Option<Hotkey> {
    match ev {
        egui::Event::Key {
            key,
            pressed: true,
            repeat: false,
            modifiers,
            ..
        } => key_to_char(*key).map(|ch| Hotkey::new(mods_to_modifier(*modifiers), ch)),
        _ => None,
    }
}

/// Map hotkeys pressed this frame to actions, each at most once.
pub fn match_hotkeys(cfg: &Hotkeys, pressed: &[Hotkey]) -> Vec<HotkeyName> {
    let mut actions = Vec::new();
    for hk in pressed {
        for name in HotkeyName::ALL {
            if get_hotkey_for_name(cfg, name).as_ref() == Some(hk) && !actions.contains(&name) {
                actions.push(name);
            }
        }
    }
    actions
}

pub fn detect_hotkey_actions(cfg: &Hotkeys, ctx: &egui::Context) -> Vec<HotkeyName> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }
    let pressed: Vec<Hotkey> = ctx.input(|i| i.events.iter().filter_map(event_to_hotkey).collect());
    match_hotkeys(cfg, &pressed)
}
