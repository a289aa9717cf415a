use mapclick::config::load_from_env;
use mapclick::data::sources::layers_for;
use mapclick::{logging, run_mapclick, AppError, MapClickConfig};

fn main() -> Result<(), AppError> {
    let (cfg, config_path) = match load_from_env()? {
        Some((path, file)) => (MapClickConfig::from_file(file)?, Some(path)),
        None => (MapClickConfig::default(), None),
    };

    logging::init(cfg.log_level.as_deref())?;
    match &config_path {
        Some(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        None => tracing::info!("no configuration file, using defaults"),
    }

    // Layer paths in the config file are relative to the file itself.
    let base_dir = config_path.as_deref().and_then(|p| p.parent());
    let layers = layers_for(&cfg.layer_sources, base_dir)?;
    run_mapclick(cfg, layers)?;
    Ok(())
}
