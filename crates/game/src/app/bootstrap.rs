use std::env;
use std::path::PathBuf;

use skyline_engine::{resolve_app_paths, LoopConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::autopilot::Autopilot;

const MAX_FRAMES_ENV_VAR: &str = "SKYLINE_MAX_FRAMES";
const REALTIME_ENV_VAR: &str = "SKYLINE_REALTIME";
const AUTOPILOT_ENV_VAR: &str = "SKYLINE_AUTOPILOT";
const DEFAULT_AUTOPILOT_FILE: &str = "autopilot.json";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) autopilot: Autopilot,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Skyline Startup ===");

    let config = LoopConfig {
        max_frames: parse_max_frames(env::var(MAX_FRAMES_ENV_VAR).ok().as_deref()),
        realtime: parse_realtime(env::var(REALTIME_ENV_VAR).ok().as_deref()),
        ..LoopConfig::default()
    };

    let autopilot_path = match env::var(AUTOPILOT_ENV_VAR) {
        Ok(value) => Some(PathBuf::from(value)),
        Err(_) => resolve_app_paths()
            .ok()
            .map(|paths| paths.assets_dir.join(DEFAULT_AUTOPILOT_FILE))
            .filter(|path| path.is_file()),
    };
    let autopilot = match autopilot_path {
        Some(path) => {
            let autopilot = Autopilot::load(&path)?;
            info!(
                path = %path.display(),
                steps = autopilot.len(),
                "autopilot_loaded"
            );
            autopilot
        }
        None => {
            info!("autopilot_disabled");
            Autopilot::default()
        }
    };

    Ok(AppWiring { config, autopilot })
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

fn parse_max_frames(raw: Option<&str>) -> Option<u64> {
    let value = raw?.trim();
    match value.parse::<u64>() {
        Ok(0) => None,
        Ok(frames) => Some(frames),
        Err(_) => {
            warn!(
                env_var = MAX_FRAMES_ENV_VAR,
                value, "invalid frame limit; running until quit"
            );
            None
        }
    }
}

fn parse_realtime(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None => true,
        Some("1" | "true" | "on") => true,
        Some("0" | "false" | "off") => false,
        Some(value) => {
            warn!(
                env_var = REALTIME_ENV_VAR,
                value, "invalid realtime flag; falling back to realtime"
            );
            true
        }
    }
}
