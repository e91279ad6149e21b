use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::metrics::DistanceModel;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Where session history is written. Unset keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub tick_interval: Duration,
    pub location_auto_grant: bool,
    pub require_initial_fix: bool,
    pub distance_model: DistanceModel,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let data_dir = std::env::var("DATA_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let tick_interval_ms = std::env::var("TICK_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(1000);

        let location_auto_grant = env_flag("LOCATION_AUTO_GRANT").unwrap_or(true);
        let require_initial_fix = env_flag("REQUIRE_INITIAL_FIX").unwrap_or(false);

        let distance_model = match std::env::var("DISTANCE_MODEL") {
            Ok(raw) => DistanceModel::from_str(&raw).unwrap_or_else(|| {
                tracing::warn!("Unknown DISTANCE_MODEL '{}', using geodesic", raw);
                DistanceModel::Geodesic
            }),
            Err(_) => DistanceModel::Geodesic,
        };

        Self {
            port,
            data_dir,
            tick_interval: Duration::from_millis(tick_interval_ms),
            location_auto_grant,
            require_initial_fix,
            distance_model,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
