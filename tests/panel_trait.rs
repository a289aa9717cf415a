use mapclick::data::hotkeys::HotkeyName;
use mapclick::panels::*;

#[test]
fn side_panels_start_docked_and_visible() {
    let panels: Vec<Box<dyn Panel>> = vec![Box::new(LayersPanel::default()), Box::new(ResultsPanel::default())];
    for p in &panels {
        assert!(p.state().visible, "{} hidden", p.name());
        assert!(!p.state().detached, "{} detached", p.name());
        assert!(!p.icon().is_empty());
    }
}

#[test]
fn panel_hotkeys_match_their_toggle_actions() {
    assert_eq!(LayersPanel::default().hotkey(), Some(HotkeyName::LayersPanel));
    assert_eq!(ResultsPanel::default().hotkey(), Some(HotkeyName::ResultsPanel));
}

#[test]
fn toggle_twice_restores_visibility() {
    let mut p = ResultsPanel::default();
    p.toggle();
    assert!(!p.state().visible);
    p.toggle();
    assert!(p.state().visible);
}
