use std::env;
use std::path::PathBuf;
use std::time::Duration;

use radar::{
    DiagonalRule, GridDistance, JsonSettingsStore, ObserverSensorRange, Radar, RadarOptions,
    SettingsError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::scene::DemoScene;

pub(crate) const SETTINGS_PATH_ENV_VAR: &str = "RADAR_SETTINGS_PATH";
const DEFAULT_SETTINGS_FILE: &str = "radar_settings.json";

#[derive(Debug, Clone)]
pub(crate) struct DemoConfig {
    pub(crate) window_title: String,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) grid_cell_px: f32,
    pub(crate) units_per_cell: f32,
    pub(crate) move_interval: Duration,
    pub(crate) turn_interval: Duration,
    pub(crate) double_click_window: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window_title: "Token Radar".to_string(),
            window_width: 1280,
            window_height: 720,
            grid_cell_px: 100.0,
            units_per_cell: 5.0,
            move_interval: Duration::from_millis(700),
            turn_interval: Duration::from_secs(6),
            double_click_window: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub(crate) struct AppWiring {
    pub(crate) config: DemoConfig,
    pub(crate) settings_path: PathBuf,
    pub(crate) radar: Radar,
    pub(crate) scene: DemoScene,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Token Radar Startup ===");

    let config = DemoConfig::default();
    let settings_path = settings_path_from(env::var(SETTINGS_PATH_ENV_VAR))?;
    let settings = JsonSettingsStore::open(&settings_path)?;
    let oracle = GridDistance {
        cell_size_px: config.grid_cell_px,
        units_per_cell: config.units_per_cell,
        diagonals: DiagonalRule::Equidistant,
    };
    let radar = Radar::new(Box::new(settings), Box::new(oracle), RadarOptions::default())
        .with_range_strategy(Box::new(ObserverSensorRange));
    let scene = DemoScene::new(config.grid_cell_px, config.move_interval);

    info!(
        settings_path = %settings_path.display(),
        grid_cell_px = config.grid_cell_px,
        units_per_cell = config.units_per_cell,
        tokens = scene.token_count(),
        "demo_config"
    );

    Ok(AppWiring {
        config,
        settings_path,
        radar,
        scene,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn settings_path_from(value: Result<String, env::VarError>) -> Result<PathBuf, StartupError> {
    match value {
        Ok(raw) if !raw.trim().is_empty() => Ok(PathBuf::from(raw.trim())),
        Ok(_) | Err(env::VarError::NotPresent) => Ok(PathBuf::from(DEFAULT_SETTINGS_FILE)),
        Err(source) => Err(StartupError::EnvVar {
            var: SETTINGS_PATH_ENV_VAR,
            source,
        }),
    }
}
