use serde::{Deserialize, Serialize};

/// One GPS sample as delivered by the location feed. Timestamps are unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    pub timestamp: i64,
    /// Meters per second; absent when the sensor could not estimate it.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Horizontal accuracy in meters.
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub altitude_accuracy: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            timestamp,
            speed: None,
            accuracy: None,
            altitude_accuracy: None,
            heading: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Ongoing,
    Paused,
    Completed,
    Discarded,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Discarded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Ongoing => "ongoing",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Discarded => "discarded",
        }
    }
}

/// Summary derived from a route. Never stored on its own; always recomputable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Meters.
    pub distance: f64,
    /// Seconds per kilometer.
    pub avg_pace: f64,
    /// Meters per second.
    pub avg_speed: f64,
    /// Meters per second.
    pub max_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    /// Whole seconds.
    pub duration: u64,
    pub distance: f64,
    pub avg_pace: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub route: Vec<LocationFix>,
    pub status: SessionStatus,
}

impl WorkoutSession {
    pub fn begin(id: String, start_time: i64) -> Self {
        Self {
            id,
            start_time,
            end_time: None,
            duration: 0,
            distance: 0.0,
            avg_pace: 0.0,
            avg_speed: 0.0,
            max_speed: 0.0,
            route: Vec::new(),
            status: SessionStatus::Ongoing,
        }
    }

    /// Consumes an ongoing session and produces its terminal record.
    pub fn finalize(
        self,
        end_time: i64,
        duration: u64,
        metrics: Metrics,
        status: SessionStatus,
    ) -> Self {
        debug_assert!(status.is_terminal());
        Self {
            end_time: Some(end_time),
            duration,
            distance: metrics.distance,
            avg_pace: metrics.avg_pace,
            avg_speed: metrics.avg_speed,
            max_speed: metrics.max_speed,
            status,
            ..self
        }
    }
}

/// Whole seconds between two millisecond timestamps, floored; never negative.
pub fn elapsed_seconds(start_ms: i64, now_ms: i64) -> u64 {
    now_ms.saturating_sub(start_ms).max(0) as u64 / 1000
}
