use serde::{Deserialize, Serialize};

use crate::pipeline::geo::distance_km;
use crate::types::workout::{LocationFix, Metrics};

const PER_POINT_METERS: f64 = 100.0;

/// How route distance is measured.
///
/// `Geodesic` sums haversine distances between consecutive fixes. `PerPoint` reproduces the
/// legacy estimate of a flat 100 m per recorded fix, kept selectable until the product
/// decides whether anything depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceModel {
    #[default]
    Geodesic,
    PerPoint,
}

impl DistanceModel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "geodesic" | "haversine" => Some(DistanceModel::Geodesic),
            "per_point" | "per-point" | "placeholder" => Some(DistanceModel::PerPoint),
            _ => None,
        }
    }

    fn route_distance_m(&self, route: &[LocationFix]) -> f64 {
        if route.len() < 2 {
            return 0.0;
        }
        match self {
            DistanceModel::Geodesic => route
                .windows(2)
                .map(|pair| distance_km(pair[0].coordinates(), pair[1].coordinates()) * 1000.0)
                .sum(),
            DistanceModel::PerPoint => PER_POINT_METERS * route.len() as f64,
        }
    }
}

pub fn calculate_metrics(route: &[LocationFix]) -> Metrics {
    calculate_metrics_with(route, DistanceModel::Geodesic)
}

pub fn calculate_metrics_with(route: &[LocationFix], model: DistanceModel) -> Metrics {
    let distance = model.route_distance_m(route);

    let duration_seconds = match (route.first(), route.last()) {
        (Some(first), Some(last)) if route.len() > 1 => {
            (last.timestamp as f64 - first.timestamp as f64) / 1000.0
        }
        _ => 0.0,
    };

    let avg_speed = if duration_seconds > 0.0 {
        distance / duration_seconds
    } else {
        0.0
    };

    let avg_pace = if distance > 0.0 {
        duration_seconds / (distance / 1000.0)
    } else {
        0.0
    };

    let max_speed = route
        .iter()
        .map(|p| p.speed.unwrap_or(0.0))
        .fold(0.0, f64::max);

    tracing::debug!(
        "Computed metrics for {} points: {:.1} m, {:.2} m/s avg",
        route.len(),
        distance,
        avg_speed
    );

    Metrics {
        distance,
        avg_pace,
        avg_speed,
        max_speed,
    }
}

/// Running totals shown while a workout is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveSummary {
    pub duration_seconds: u64,
    pub distance_km: f64,
    pub current_speed_kmh: f64,
    /// Minutes per kilometer; `None` until there is distance to divide by.
    pub current_pace_min_per_km: Option<f64>,
}

pub fn live_summary(
    duration_seconds: u64,
    history: &[LocationFix],
    current: Option<&LocationFix>,
) -> LiveSummary {
    let total_km: f64 = history
        .windows(2)
        .map(|pair| distance_km(pair[0].coordinates(), pair[1].coordinates()))
        .sum();

    let speed_mps = current.and_then(|fix| fix.speed).unwrap_or(0.0);
    let current_speed_kmh = if speed_mps > 0.0 { speed_mps * 3.6 } else { 0.0 };

    let pace = duration_seconds as f64 / 60.0 / total_km;
    let current_pace_min_per_km = (pace.is_finite() && pace > 0.0).then_some(pace);

    LiveSummary {
        duration_seconds,
        distance_km: total_km,
        current_speed_kmh,
        current_pace_min_per_km,
    }
}
