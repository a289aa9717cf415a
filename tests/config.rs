use std::path::PathBuf;

use mapclick::config::{load_config_file, load_from_env, CONFIG_ENV_VAR};
use mapclick::{ConfigError, MapClickConfig};
use serial_test::serial;

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mapclick-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn missing_file_loads_as_none() {
    let path = std::env::temp_dir().join("mapclick-definitely-missing.yaml");
    assert!(load_config_file(&path).unwrap().is_none());
}

#[test]
fn file_on_disk_overlays_defaults() {
    let path = temp_file(
        "overlay.yaml",
        "title: Harbor map\ninitial_view:\n  center: { latitude: 33.77, longitude: -118.19 }\n  span_degrees: 0.5\n",
    );
    let file = load_config_file(&path).unwrap().unwrap();
    let cfg = MapClickConfig::from_file(file).unwrap();
    assert_eq!(cfg.title, "Harbor map");
    assert_eq!(cfg.initial_view.center.latitude, 33.77);
    assert_eq!(cfg.initial_view.span_degrees, 0.5);
    assert_eq!(cfg.interaction.buffer_radius, 50_000.0);
}

#[test]
fn parse_error_names_the_file() {
    let path = temp_file("broken.yaml", "buffer: [1, 2");
    let err = load_config_file(&path).unwrap_err();
    match &err {
        ConfigError::Parse { path: p, .. } => assert_eq!(p, &path),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("broken.yaml"));
}

#[test]
#[serial(config_env)]
fn explicit_env_path_is_loaded() {
    let path = temp_file("env.yaml", "click_marker: true\n");
    std::env::set_var(CONFIG_ENV_VAR, &path);
    let loaded = load_from_env();
    std::env::remove_var(CONFIG_ENV_VAR);

    let (found, file) = loaded.unwrap().unwrap();
    assert_eq!(found, path);
    assert_eq!(file.click_marker, Some(true));
}

#[test]
#[serial(config_env)]
fn explicit_env_path_must_exist() {
    std::env::set_var(CONFIG_ENV_VAR, "/nonexistent/mapclick.yaml");
    let loaded = load_from_env();
    std::env::remove_var(CONFIG_ENV_VAR);

    assert!(matches!(loaded, Err(ConfigError::Read { .. })));
}
